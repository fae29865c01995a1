//! Scratch buffer for composing multi-line input.
//!
//! The operator edits a temporary file in their editor. Saving a non-empty
//! buffer and quitting commits it as one payload; an empty buffer or an editor
//! that exits unsuccessfully cancels.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Open `initial` in `editor` and return the committed text, or `None` when
/// the operator cancelled.
pub fn compose_in_editor(editor: &str, initial: &str) -> Result<Option<String>> {
    let mut file = tempfile::Builder::new()
        .prefix("sessionctl-send-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create scratch file")?;
    file.write_all(initial.as_bytes())
        .context("Failed to write scratch file")?;
    file.flush().context("Failed to write scratch file")?;

    if !run_editor(editor, file.path())? {
        tracing::debug!("editor exited unsuccessfully, send cancelled");
        return Ok(None);
    }

    let text = fs::read_to_string(file.path()).context("Failed to read scratch file")?;
    Ok(payload(&text))
}

/// Run `editor` on `path`. Returns whether it exited successfully.
fn run_editor(editor: &str, path: &Path) -> Result<bool> {
    let words = shell_words::split(editor)
        .with_context(|| format!("Invalid editor command: {}", editor))?;
    let Some((program, args)) = words.split_first() else {
        bail!("Editor command is empty");
    };

    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to start editor: {}", program))?;

    Ok(status.success())
}

/// Turn an edited buffer into the text to send. Editors usually end the file
/// with a newline; one is dropped so the daemon's own Enter isn't doubled.
pub fn payload(buffer: &str) -> Option<String> {
    if buffer.trim().is_empty() {
        return None;
    }
    let text = buffer
        .strip_suffix("\r\n")
        .or_else(|| buffer.strip_suffix('\n'))
        .unwrap_or(buffer);
    Some(text.to_string())
}
