//! Row-addressable session list with per-row actions.
//!
//! Rows are rebuilt 1:1 from a directory snapshot in the order the daemon
//! listed them. Each action checks that its row still names a session in the
//! directory before touching the daemon.

use std::sync::Arc;

use crate::attach::AttachDispatcher;
use crate::daemon::{SessionEntry, SessionId};
use crate::directory::SessionDirectory;
use crate::error::{Result, SessionError};

/// Something the operator can do to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    /// View the session's current output.
    Show,
    /// Type text into the session.
    Send { keys: String, no_newline: bool },
    /// Close the session and refresh the list.
    Close,
    /// Join the session's live terminal.
    Attach,
}

/// Result of a row action, for the host to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Shown { session_id: SessionId, output: String },
    Sent { session_id: SessionId },
    Closed { session_id: SessionId },
    Attached { session_id: SessionId },
}

/// Controller behind the interactive session table.
pub struct SessionList {
    directory: Arc<SessionDirectory>,
    dispatcher: AttachDispatcher,
    rows: Vec<SessionEntry>,
    no_color: bool,
}

impl SessionList {
    /// Build a list over `directory`, starting from its current snapshot.
    pub fn new(directory: Arc<SessionDirectory>, dispatcher: AttachDispatcher) -> Self {
        let rows = directory.entries().as_ref().clone();
        Self {
            directory,
            dispatcher,
            rows,
            no_color: false,
        }
    }

    /// Request ANSI-stripped output for `Show`.
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    pub fn dispatcher(&self) -> &AttachDispatcher {
        &self.dispatcher
    }

    pub fn rows(&self) -> &[SessionEntry] {
        &self.rows
    }

    pub fn row(&self, row_id: &str) -> Option<&SessionEntry> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    /// Pull a fresh snapshot and rebuild the rows from it.
    pub fn refresh(&mut self) -> Result<()> {
        let entries = self.directory.refresh()?;
        self.rows = entries.as_ref().clone();
        Ok(())
    }

    /// Rebuild rows after the daemon told us a row is gone. A failure here is
    /// logged; the caller is already reporting the stale row.
    fn refresh_after_stale(&mut self, row_id: &str) {
        tracing::warn!(session_id = row_id, "row no longer names a live session");
        if let Err(e) = self.refresh() {
            tracing::warn!(error = %e, "refresh after stale row failed");
        }
    }

    fn ensure_live(&self, row_id: &str) -> Result<()> {
        if self.row(row_id).is_some() && self.directory.contains(row_id) {
            Ok(())
        } else {
            tracing::warn!(session_id = row_id, "action on stale row");
            Err(SessionError::StaleRow(row_id.to_string()))
        }
    }

    /// Run `action` against the session in row `row_id`.
    pub fn row_action(&mut self, row_id: &str, action: RowAction) -> Result<RowOutcome> {
        self.ensure_live(row_id)?;
        let session_id = row_id.to_string();
        let client = self.directory.client().clone();

        match action {
            RowAction::Show => {
                let output = client.view(row_id, self.no_color)?;
                if output.trim().is_empty() {
                    // An empty view is either a quiet session or a dead one;
                    // only status can tell them apart.
                    match client.status(row_id) {
                        Err(SessionError::UnknownSession(_)) => {
                            self.refresh_after_stale(row_id);
                            return Err(SessionError::StaleRow(session_id));
                        }
                        Err(e) => return Err(e),
                        Ok(_) => {}
                    }
                }
                Ok(RowOutcome::Shown { session_id, output })
            }
            RowAction::Send { keys, no_newline } => {
                client.send(row_id, &keys, no_newline)?;
                Ok(RowOutcome::Sent { session_id })
            }
            RowAction::Close => {
                client.close(row_id)?;
                self.refresh()?;
                Ok(RowOutcome::Closed { session_id })
            }
            RowAction::Attach => {
                self.dispatcher.attach(row_id)?;
                Ok(RowOutcome::Attached { session_id })
            }
        }
    }
}
