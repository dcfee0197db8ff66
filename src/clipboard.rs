use std::process::Stdio;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;

use crate::error::AppError;

/// Clipboard tools in order of preference, with their arguments
#[cfg(target_os = "macos")]
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[("pbcopy", &[])];
#[cfg(windows)]
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[("clip", &[])];
#[cfg(not(any(target_os = "macos", windows)))]
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Write access to the system clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), AppError>;
}

/// Clipboard driven by the platform's command-line tools
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), AppError> {
        let mut failures: Vec<String> = Vec::new();

        for (program, args) in CLIPBOARD_TOOLS {
            match pipe_into(program, args, text).await {
                Ok(()) => {
                    debug!(%program, "copied to clipboard");
                    return Ok(());
                }
                Err(err) => failures.push(format!("{program}: {err}")),
            }
        }

        Err(AppError::Clipboard(format!(
            "no clipboard tool succeeded ({})",
            failures.join("; ")
        )))
    }
}

async fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<(), AppError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
        stdin.shutdown().await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(AppError::Clipboard(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}
