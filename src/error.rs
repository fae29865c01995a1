//! Error taxonomy for talking to the session daemon.
//!
//! Every variant is local to the call that produced it and recoverable by the
//! operator. An empty `list` response is not an error.

use thiserror::Error;

/// Errors raised by the transport, protocol client, directory, resolver,
/// list controller and attach dispatcher.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The daemon executable could not be started, timed out, or (in strict
    /// mode) exited unsuccessfully.
    #[error("failed to run {program}: {source}")]
    Execution {
        /// Program that was invoked.
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The daemon does not know this session.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// The typed reference does not match any session in the directory.
    #[error("no such session: {0}")]
    NoSuchSession(String),

    /// A list row points at a session the directory no longer has.
    #[error("session {0} is gone; refresh the list")]
    StaleRow(String),

    /// No attach routine is registered under this backend name.
    #[error("unsupported attach backend: {0}")]
    UnsupportedBackend(String),

    /// The daemon answered a request that must produce output with nothing.
    #[error("daemon gave no answer to {0}")]
    NoResponse(&'static str),

    /// A `list` line was not `id<TAB>command<TAB>cwd`.
    #[error("malformed session listing line: {line:?}")]
    MalformedListing {
        /// The offending line.
        line: String,
    },
}

impl SessionError {
    /// Wrap an I/O failure from running `program`.
    pub fn execution(program: impl Into<String>, source: std::io::Error) -> Self {
        SessionError::Execution {
            program: program.into(),
            source,
        }
    }

    /// Whether the caller should refresh its directory after seeing this error.
    pub fn suggests_refresh(&self) -> bool {
        matches!(
            self,
            SessionError::UnknownSession(_) | SessionError::StaleRow(_)
        )
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
