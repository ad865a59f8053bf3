//! External tool invocation shared by the ffmpeg, ffprobe and pdftoppm
//! collaborators.

use std::process::{Output, Stdio};

use anyhow::{anyhow, Context, Result};
use tokio::process::Command;

const DANGEROUS_CHARS: [char; 11] = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Reject binary paths carrying shell metacharacters.
pub fn validate_binary(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(anyhow!("Binary path is empty"));
    }
    if path.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
        return Err(anyhow!("Invalid binary path: contains dangerous characters"));
    }
    Ok(())
}

/// Run `binary` to completion and return its output. The child is killed if
/// the returned future is dropped.
pub async fn run_tool<I, S>(binary: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to execute {}", binary))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} failed: {}", binary, stderr.trim()));
    }

    Ok(output)
}
