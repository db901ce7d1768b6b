//! Bounded execution of external utilities.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{PulseError, Result};

/// Run `program` and return its stdout.
///
/// The child is killed when `timeout` elapses; a non-zero exit status and
/// non-UTF-8 output are both errors.
pub async fn run_command(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PulseError::command(format!("failed to spawn {}: {}", program, e)))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| PulseError::timeout(program, timeout))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PulseError::command(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| PulseError::parse(format!("{} produced non-UTF-8 output", program)))
}
