//! Process termination with up-front validation.

use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::platform::signals::OsSignals;

/// The only two signals a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGTERM: ask the process to exit
    Graceful,
    /// SIGKILL: cannot be caught or ignored
    Forceful,
}

impl SignalKind {
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::Graceful => "TERM",
            SignalKind::Forceful => "KILL",
        }
    }
}

impl FromStr for SignalKind {
    type Err = TerminateFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TERM" | "graceful" => Ok(SignalKind::Graceful),
            "KILL" | "forceful" => Ok(SignalKind::Forceful),
            other => Err(TerminateFailure::InvalidInput(format!(
                "invalid signal '{}', must be TERM or KILL",
                other
            ))),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminateFailure {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No such process: {0}")]
    NoSuchProcess(i32),

    #[error("Not permitted to signal process {0}")]
    NotPermitted(i32),

    #[error("Failed to signal process: {0}")]
    Other(String),
}

/// Delivers a signal to a process. Implemented by the OS layer.
pub trait SignalSender: Send + Sync {
    fn send(&self, pid: i32, kind: SignalKind) -> Result<(), TerminateFailure>;
}

#[derive(Clone)]
pub struct ProcessTerminator {
    sender: Arc<dyn SignalSender>,
}

impl Default for ProcessTerminator {
    fn default() -> Self {
        Self::new(Arc::new(OsSignals))
    }
}

impl ProcessTerminator {
    pub fn new(sender: Arc<dyn SignalSender>) -> Self {
        Self { sender }
    }

    /// Parse a textual pid; zero and negative values would address process groups
    pub fn parse_pid(raw: &str) -> Result<i32, TerminateFailure> {
        match raw.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => Ok(pid),
            _ => Err(TerminateFailure::InvalidInput(format!(
                "invalid pid '{}'",
                raw
            ))),
        }
    }

    pub fn terminate(&self, pid: i32, kind: SignalKind) -> Result<(), TerminateFailure> {
        if pid <= 0 {
            return Err(TerminateFailure::InvalidInput(format!("invalid pid '{}'", pid)));
        }
        log::info!("Sending SIG{} to process {}", kind.name(), pid);
        self.sender.send(pid, kind)
    }

    /// Validate both raw request values before any signal is sent
    pub fn terminate_request(&self, pid: &str, signal: &str) -> Result<(), TerminateFailure> {
        let kind: SignalKind = signal.parse()?;
        let pid = Self::parse_pid(pid)?;
        self.terminate(pid, kind)
    }
}
