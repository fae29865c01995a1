//! Cached table of the daemon's sessions.
//!
//! The directory is a snapshot, not a live mirror: it reflects the daemon as of
//! the last successful [`SessionDirectory::refresh`] and nothing pushes updates
//! into it. Readers get an `Arc` of a whole table; a refresh swaps in a new
//! table in one step, so nobody ever sees a half-built one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Local};

use crate::daemon::{SessionClient, SessionEntry, SessionId};
use crate::error::Result;

/// Snapshot of known sessions, refreshed on demand from the daemon.
pub struct SessionDirectory {
    client: SessionClient,
    snapshot: ArcSwap<Vec<SessionEntry>>,
    refreshed_at: ArcSwap<Option<DateTime<Local>>>,
}

impl SessionDirectory {
    /// Create an empty directory. Nothing is fetched until `refresh`.
    pub fn new(client: SessionClient) -> Self {
        Self {
            client,
            snapshot: ArcSwap::from_pointee(Vec::new()),
            refreshed_at: ArcSwap::from_pointee(None),
        }
    }

    /// The client this directory pulls from.
    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Re-read the session table from the daemon.
    ///
    /// On failure the previous snapshot is kept and the error is returned.
    pub fn refresh(&self) -> Result<Arc<Vec<SessionEntry>>> {
        let entries = Arc::new(self.client.list()?);
        self.snapshot.store(Arc::clone(&entries));
        self.refreshed_at.store(Arc::new(Some(Local::now())));
        tracing::debug!(count = entries.len(), "session directory refreshed");
        Ok(entries)
    }

    /// Current snapshot, without contacting the daemon.
    pub fn entries(&self) -> Arc<Vec<SessionEntry>> {
        self.snapshot.load_full()
    }

    /// Ids in the current snapshot, in daemon order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.entries().iter().map(|e| e.id.clone()).collect()
    }

    /// Look up one entry in the current snapshot.
    pub fn get(&self, id: &str) -> Option<SessionEntry> {
        self.entries().iter().find(|e| e.id == id).cloned()
    }

    /// Whether the current snapshot has `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.entries().iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// When the snapshot was last replaced, if ever.
    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        **self.refreshed_at.load()
    }
}
