//! In-memory stand-in for the daemon executable, used by tests.

use std::sync::Mutex;

use super::transport::Transport;
use crate::error::{Result, SessionError};

#[derive(Debug, Clone)]
struct FakeSession {
    id: String,
    command: String,
    cwd: String,
    output: String,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u32,
    sessions: Vec<FakeSession>,
    failing: bool,
    list_override: Option<String>,
    calls: Vec<Vec<String>>,
}

/// Models the daemon's command table over an in-memory session list and
/// records every invocation.
#[derive(Debug, Default)]
pub struct FakeDaemon {
    state: Mutex<FakeState>,
}

impl FakeDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the daemon with existing sessions.
    pub fn with_sessions(sessions: &[(&str, &str, &str)]) -> Self {
        let daemon = Self::new();
        {
            let mut state = daemon.state.lock().unwrap();
            for (id, command, cwd) in sessions {
                state.sessions.push(FakeSession {
                    id: id.to_string(),
                    command: command.to_string(),
                    cwd: cwd.to_string(),
                    output: String::new(),
                });
            }
            state.next_id = sessions.len() as u32;
        }
        daemon
    }

    /// Every argument vector received so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Make every following call fail as if the executable were missing.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Replace the raw `list` output.
    pub fn set_list_output(&self, output: Option<&str>) {
        self.state.lock().unwrap().list_override = output.map(str::to_string);
    }

    /// Close a session behind the client's back.
    pub fn close_externally(&self, id: &str) {
        self.state.lock().unwrap().sessions.retain(|s| s.id != id);
    }

    /// Append terminal output to a session.
    pub fn push_output(&self, id: &str, text: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == id) {
            session.output.push_str(text);
        }
    }
}

/// Split leading `--flag` arguments from the positional ones.
fn split_flags(args: &[String]) -> (Vec<&str>, Vec<&str>) {
    let mut flags = Vec::new();
    let mut rest = args.iter().map(String::as_str).peekable();
    while let Some(arg) = rest.peek() {
        if !arg.starts_with("--") {
            break;
        }
        flags.push(*arg);
        rest.next();
    }
    (flags, rest.collect())
}

impl Transport for FakeDaemon {
    fn invoke(&self, args: &[String]) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());

        if state.failing {
            return Err(SessionError::execution(
                "fake-daemon",
                std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            ));
        }

        let Some((command, rest)) = args.split_first() else {
            return Ok(String::new());
        };

        let out = match command.as_str() {
            "create" => {
                let (cwd, positional) = match rest {
                    [flag, dir, rest @ ..] if flag == "--cwd" => (dir.clone(), rest),
                    _ => (String::new(), rest),
                };
                state.next_id += 1;
                let id = format!("s{}", state.next_id);
                state.sessions.push(FakeSession {
                    id: id.clone(),
                    command: positional.join(" "),
                    cwd,
                    output: String::new(),
                });
                format!("{id}\n")
            }
            "send" => {
                let (flags, positional) = split_flags(rest);
                let no_newline = flags.contains(&"--no-newline");
                if let [id, keys] = positional.as_slice() {
                    if let Some(session) = state.sessions.iter_mut().find(|s| s.id == *id) {
                        session.output.push_str(keys);
                        if !no_newline {
                            session.output.push('\n');
                            session.output.push_str(&format!("output of {keys}\n"));
                        }
                    }
                }
                String::new()
            }
            "list" => match &state.list_override {
                Some(raw) => raw.clone(),
                None => state
                    .sessions
                    .iter()
                    .map(|s| format!("{}\t{}\t{}\n", s.id, s.command, s.cwd))
                    .collect(),
            },
            "view" => {
                let (flags, positional) = split_flags(rest);
                let no_color = flags.contains(&"--no-color");
                match positional
                    .first()
                    .and_then(|id| state.sessions.iter().find(|s| s.id == *id))
                {
                    Some(session) if no_color => session.output.clone(),
                    Some(session) => format!("\x1b[32m{}\x1b[0m", session.output),
                    None => String::new(),
                }
            }
            "status" => match rest
                .first()
                .and_then(|id| state.sessions.iter().find(|s| s.id == *id))
            {
                Some(_) => "running\n".to_string(),
                None => String::new(),
            },
            "close" => {
                if let Some(id) = rest.first() {
                    state.sessions.retain(|s| s.id != *id);
                }
                String::new()
            }
            _ => String::new(),
        };

        Ok(out)
    }
}
