//! Signal delivery through the OS.

use crate::core::system_monitor::{SignalKind, SignalSender, TerminateFailure};

/// Sends real signals with `kill(2)`
pub struct OsSignals;

#[cfg(unix)]
impl SignalSender for OsSignals {
    fn send(&self, pid: i32, kind: SignalKind) -> Result<(), TerminateFailure> {
        let signal = match kind {
            SignalKind::Graceful => libc::SIGTERM,
            SignalKind::Forceful => libc::SIGKILL,
        };

        // SAFETY: kill has no memory-safety preconditions; pid was validated positive
        let rc = unsafe { libc::kill(pid, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Err(TerminateFailure::NoSuchProcess(pid)),
            Some(libc::EPERM) => Err(TerminateFailure::NotPermitted(pid)),
            _ => Err(TerminateFailure::Other(err.to_string())),
        }
    }
}

#[cfg(not(unix))]
impl SignalSender for OsSignals {
    fn send(&self, _pid: i32, _kind: SignalKind) -> Result<(), TerminateFailure> {
        Err(TerminateFailure::Other(
            "signals are not supported on this platform".to_string(),
        ))
    }
}
