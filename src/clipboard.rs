use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Result};

/// Clipboard programs tried in order: macOS, Wayland, X11.
const CLIPBOARD_COMMANDS: [(&str, &[&str]); 4] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    for (program, args) in CLIPBOARD_COMMANDS {
        let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if status.success() {
            tracing::debug!(program, bytes = text.len(), "copied to clipboard");
            return Ok(());
        }
        tracing::warn!(program, %status, "clipboard command failed");
    }
    Err(anyhow!("no clipboard command available"))
}
