//! Built-in attach backends.

use std::ffi::CString;
use std::io;
use std::process::Command;
use std::sync::Arc;

use super::{AttachBackend, AttachRequest};
use crate::daemon::{ProcessTransport, Transport};
use crate::error::{Result, SessionError};

const SHELL: &str = "sh";

/// Best-effort: name the current terminal after the surface.
fn set_terminal_title(label: &str) {
    let _ = crossterm::execute!(io::stdout(), crossterm::terminal::SetTitle(label));
}

/// Runs the attach line in the current terminal and waits for it to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineBackend;

impl AttachBackend for InlineBackend {
    fn attach(&self, request: &AttachRequest) -> Result<()> {
        set_terminal_title(&request.surface_label);

        let status = Command::new(SHELL)
            .arg("-c")
            .arg(&request.command_line)
            .status()
            .map_err(|e| SessionError::execution(SHELL, e))?;

        if !status.success() {
            tracing::warn!(session_id = %request.session_id, %status, "attach command exited unsuccessfully");
        }
        Ok(())
    }
}

/// Replaces this process with the attach line. Only returns on failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecBackend;

impl AttachBackend for ExecBackend {
    fn attach(&self, request: &AttachRequest) -> Result<()> {
        let to_cstring = |s: &str| {
            CString::new(s).map_err(|e| {
                SessionError::execution(SHELL, io::Error::new(io::ErrorKind::InvalidInput, e))
            })
        };
        let shell = to_cstring(SHELL)?;
        let args = [
            shell.clone(),
            to_cstring("-c")?,
            to_cstring(&request.command_line)?,
        ];

        set_terminal_title(&request.surface_label);

        // execvp never returns on success
        match nix::unistd::execvp(&shell, &args) {
            Ok(infallible) => match infallible {},
            Err(errno) => Err(SessionError::execution(SHELL, io::Error::from(errno))),
        }
    }
}

/// Uses a tmux window named after the surface label.
///
/// A missing window is created and handed the attach line; an existing one is
/// already attached and just gets selected. Windows are targeted by their
/// `@N` id since labels may contain tmux target separators.
pub struct TmuxWindowBackend {
    tmux: Arc<dyn Transport>,
}

impl TmuxWindowBackend {
    pub fn new(tmux: Arc<dyn Transport>) -> Self {
        Self { tmux }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.tmux.invoke(&args)
    }

    fn find_window(&self, label: &str) -> Result<Option<String>> {
        let windows = self.run(&["list-windows", "-F", "#{window_id}\t#{window_name}"])?;
        Ok(windows
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .find(|(_, name)| *name == label)
            .map(|(id, _)| id.to_string()))
    }
}

impl Default for TmuxWindowBackend {
    fn default() -> Self {
        Self::new(Arc::new(ProcessTransport::new("tmux")))
    }
}

impl AttachBackend for TmuxWindowBackend {
    fn attach(&self, request: &AttachRequest) -> Result<()> {
        let label = request.surface_label.as_str();

        if let Some(window) = self.find_window(label)? {
            self.run(&["select-window", "-t", &window])?;
            return Ok(());
        }

        let window = self.run(&["new-window", "-P", "-F", "#{window_id}", "-n", label])?;
        let window = window.trim();
        if window.is_empty() {
            return Err(SessionError::execution(
                "tmux",
                io::Error::other("new-window reported no window id"),
            ));
        }

        // The new window lives inside this tmux server, which refuses a
        // nested attach while $TMUX is set.
        let line = format!("unset TMUX; {}", request.command_line);
        self.run(&["send-keys", "-t", window, "-l", &line])?;
        self.run(&["send-keys", "-t", window, "Enter"])?;
        Ok(())
    }
}
