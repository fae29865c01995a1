//! Joining a session's live terminal through a pluggable backend.
//!
//! The dispatcher knows two things: how to name the surface an attach runs in
//! and which single command line joins the session. Everything else belongs to
//! the backend registered under the configured name.

mod backends;

use std::collections::BTreeMap;

use crate::config::AttachConfig;
use crate::error::{Result, SessionError};

pub use backends::{ExecBackend, InlineBackend, TmuxWindowBackend};

/// One attach instruction for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRequest {
    /// Session being joined.
    pub session_id: String,
    /// Stable label for the surface dedicated to this session.
    pub surface_label: String,
    /// The line to submit on that surface.
    pub command_line: String,
}

/// A terminal surface that can run one attach command line.
pub trait AttachBackend: Send + Sync {
    fn attach(&self, request: &AttachRequest) -> Result<()>;
}

/// Maps backend names to attach routines and runs the configured one.
pub struct AttachDispatcher {
    selected: String,
    program: String,
    namespace: String,
    routines: BTreeMap<String, Box<dyn AttachBackend>>,
}

impl AttachDispatcher {
    /// A dispatcher with no routines registered.
    pub fn new(config: &AttachConfig) -> Self {
        Self {
            selected: config.backend.clone(),
            program: config.program.clone(),
            namespace: config.namespace.clone(),
            routines: BTreeMap::new(),
        }
    }

    /// A dispatcher with the `inline`, `exec` and `tmux-window` backends.
    pub fn with_builtin_backends(config: &AttachConfig) -> Self {
        let mut dispatcher = Self::new(config);
        dispatcher.register("inline", InlineBackend);
        dispatcher.register("exec", ExecBackend);
        dispatcher.register("tmux-window", TmuxWindowBackend::default());
        dispatcher
    }

    /// Register (or replace) the routine for `name`.
    pub fn register(&mut self, name: impl Into<String>, backend: impl AttachBackend + 'static) {
        self.routines.insert(name.into(), Box::new(backend));
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        self.routines.keys().map(String::as_str).collect()
    }

    /// Name of the configured backend.
    pub fn selected(&self) -> &str {
        &self.selected
    }

    /// Switch to another backend by name. Not validated until `attach`.
    pub fn select(&mut self, name: impl Into<String>) {
        self.selected = name.into();
    }

    /// Label of the surface used for `session_id`.
    pub fn surface_label(session_id: &str) -> String {
        format!("attach-{session_id}")
    }

    /// Command line that joins `session_id` on the multiplexer side.
    pub fn command_line(&self, session_id: &str) -> String {
        let target = format!("{}-{}", self.namespace, session_id);
        format!("exec {} -t {}", self.program, shell_words::quote(&target))
    }

    /// Build the request handed to a backend.
    pub fn request(&self, session_id: &str) -> AttachRequest {
        AttachRequest {
            session_id: session_id.to_string(),
            surface_label: Self::surface_label(session_id),
            command_line: self.command_line(session_id),
        }
    }

    /// Attach to `session_id` with the configured backend.
    pub fn attach(&self, session_id: &str) -> Result<()> {
        let routine = self
            .routines
            .get(&self.selected)
            .ok_or_else(|| SessionError::UnsupportedBackend(self.selected.clone()))?;

        let request = self.request(session_id);
        tracing::info!(backend = %self.selected, session_id, line = %request.command_line, "attaching");
        routine.attach(&request)
    }
}
