//! Typed client for the session daemon.
//!
//! Provides one method per daemon command, backed by a [`Transport`].
//!
//! Each call is a fresh daemon invocation. Nothing here retries or checks ids
//! against a cached session table; that is left to the directory and the
//! resolver.

use std::sync::Arc;

use super::protocol::{parse_listing, Request, SessionEntry, SessionId};
use super::transport::{ProcessTransport, Transport};
use crate::config::Config;
use crate::error::{Result, SessionError};

/// Client for issuing requests to the daemon.
#[derive(Clone)]
pub struct SessionClient {
    transport: Arc<dyn Transport>,
}

impl SessionClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a client that runs the executable named in `config`.
    pub fn from_config(config: &Config) -> Self {
        let transport = ProcessTransport::new(config.executable.clone())
            .with_timeout(config.timeout())
            .with_exit_status(config.exit_status);
        Self::new(Arc::new(transport))
    }

    /// Send a request and return the raw response.
    fn request(&self, req: &Request) -> Result<String> {
        self.transport.invoke(&req.to_args())
    }

    /// Create a new session running `command`, optionally in `cwd`.
    pub fn create(&self, command: &str, cwd: Option<&str>) -> Result<SessionId> {
        let req = Request::Create {
            command: command.to_string(),
            cwd: cwd.map(str::to_string),
        };

        let id = self.request(&req)?.trim().to_string();
        if id.is_empty() {
            return Err(SessionError::NoResponse(req.name()));
        }

        tracing::info!(session_id = %id, command, "created session");
        Ok(id)
    }

    /// Type `keys` into a session. Unless `no_newline` is set the daemon
    /// follows the text with Enter.
    pub fn send(&self, session_id: &str, keys: &str, no_newline: bool) -> Result<()> {
        let req = Request::Send {
            session_id: session_id.to_string(),
            keys: keys.to_string(),
            no_newline,
        };
        self.request(&req)?;
        Ok(())
    }

    /// List all sessions, in daemon order.
    pub fn list(&self) -> Result<Vec<SessionEntry>> {
        let out = self.request(&Request::List)?;
        parse_listing(&out)
    }

    /// Snapshot a session's terminal contents.
    pub fn view(&self, session_id: &str, no_color: bool) -> Result<String> {
        let req = Request::View {
            session_id: session_id.to_string(),
            no_color,
        };
        self.request(&req)
    }

    /// One-line status of a session.
    ///
    /// A live session always has a status, so an empty answer means the
    /// daemon does not know the id.
    pub fn status(&self, session_id: &str) -> Result<String> {
        let req = Request::Status {
            session_id: session_id.to_string(),
        };

        let status = self.request(&req)?.trim().to_string();
        if status.is_empty() {
            return Err(SessionError::UnknownSession(session_id.to_string()));
        }
        Ok(status)
    }

    /// Ask the daemon to terminate a session. Closing an unknown or already
    /// closed session is harmless.
    pub fn close(&self, session_id: &str) -> Result<()> {
        let req = Request::Close {
            session_id: session_id.to_string(),
        };
        self.request(&req)?;
        tracing::info!(session_id, "closed session");
        Ok(())
    }
}
