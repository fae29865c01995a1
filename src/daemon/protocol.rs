//! Command-line protocol spoken to the session daemon.
//!
//! Requests are encoded as argument vectors for one daemon invocation.
//! Only `list` has a structured response: one `id\tcommand\tcwd` line per
//! session.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Identifier assigned to a session by the daemon.
pub type SessionId = String;

/// One row of the daemon's session table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Daemon-assigned session id.
    pub id: SessionId,
    /// Shell command the session was created with.
    pub command: String,
    /// Working directory at creation; empty means the daemon default.
    pub cwd: String,
}

impl SessionEntry {
    pub fn new(id: impl Into<String>, command: impl Into<String>, cwd: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            cwd: cwd.into(),
        }
    }
}

/// Requests understood by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Start a new session running `command`.
    Create {
        command: String,
        cwd: Option<String>,
    },

    /// Type `keys` into a session, optionally without a trailing Enter.
    Send {
        session_id: SessionId,
        keys: String,
        no_newline: bool,
    },

    /// Dump the session table.
    List,

    /// Snapshot a session's terminal contents.
    View { session_id: SessionId, no_color: bool },

    /// One-line status of a session.
    Status { session_id: SessionId },

    /// Terminate and clean up a session.
    Close { session_id: SessionId },
}

impl Request {
    /// Subcommand name on the daemon's command line.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Create { .. } => "create",
            Request::Send { .. } => "send",
            Request::List => "list",
            Request::View { .. } => "view",
            Request::Status { .. } => "status",
            Request::Close { .. } => "close",
        }
    }

    /// Encode as the argument vector for one daemon invocation.
    ///
    /// Flags always sit directly after the subcommand name, before any
    /// positional argument.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string()];
        match self {
            Request::Create { command, cwd } => {
                if let Some(cwd) = cwd {
                    args.push("--cwd".to_string());
                    args.push(cwd.clone());
                }
                args.push(command.clone());
            }
            Request::Send {
                session_id,
                keys,
                no_newline,
            } => {
                if *no_newline {
                    args.push("--no-newline".to_string());
                }
                args.push(session_id.clone());
                args.push(keys.clone());
            }
            Request::List => {}
            Request::View {
                session_id,
                no_color,
            } => {
                if *no_color {
                    args.push("--no-color".to_string());
                }
                args.push(session_id.clone());
            }
            Request::Status { session_id } | Request::Close { session_id } => {
                args.push(session_id.clone());
            }
        }
        args
    }
}

/// Parse the output of `list`.
///
/// Blank output is the normal "no sessions" answer and yields an empty table.
pub fn parse_listing(output: &str) -> Result<Vec<SessionEntry>> {
    output
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(parse_listing_line)
        .collect()
}

fn parse_listing_line(line: &str) -> Result<SessionEntry> {
    let fields: Vec<&str> = line.split('\t').collect();
    match fields.as_slice() {
        [id, command, cwd] if !id.is_empty() => Ok(SessionEntry::new(*id, *command, *cwd)),
        _ => Err(SessionError::MalformedListing {
            line: line.to_string(),
        }),
    }
}
