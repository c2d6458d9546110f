//! Subprocess invoker.
//!
//! Runs an external command to completion and maps a non-zero exit
//! status into a typed error carrying the command line and the tail of
//! captured stderr. Stdout is inherited so build-tool output streams
//! straight to the operator.

use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr tail carried inside an error message
const STDERR_TAIL_BYTES: usize = 4096;

/// Subprocess failures
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: i32,
        stderr: String,
    },
}

/// Run a command with arguments, awaiting completion.
///
/// Succeeds only on a zero exit status; any other outcome is an
/// [`InvokeError`] for the caller to classify.
pub async fn run(program: &str, args: &[String]) -> Result<(), InvokeError> {
    let command_line = render_command(program, args);
    debug!(command = %command_line, "Spawning subprocess");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| InvokeError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|source| InvokeError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InvokeError::NonZeroExit {
            command: command_line,
            status: output.status.code().unwrap_or(-1),
            stderr: stderr_tail(&stderr),
        });
    }

    Ok(())
}

fn render_command(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Keep only the last few KB of stderr so error messages stay readable
fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let start = trimmed.len() - STDERR_TAIL_BYTES;
    // Avoid splitting a UTF-8 sequence
    let start = (start..trimmed.len())
        .find(|&i| trimmed.is_char_boundary(i))
        .unwrap_or(start);
    trimmed[start..].to_string()
}
