//! Talking to the session daemon.
//!
//! The daemon owns the ptys and every session's output. This side only runs
//! its executable with a command and reads back what it prints.

pub mod client;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use client::SessionClient;
pub use protocol::{Request, SessionEntry, SessionId};
pub use transport::{ExitStatusPolicy, ProcessTransport, Transport};
