//! Turning a typed session reference into a validated id.
//!
//! Everything here is a pure function over a directory snapshot, so prompts
//! and completion can be tested without a terminal.

use crate::daemon::{SessionEntry, SessionId};
use crate::error::{Result, SessionError};

/// A completion candidate: an id plus the text shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: SessionId,
    pub annotation: String,
}

/// Annotation shown next to an id: `"  <command> [<cwd>]"`.
pub fn annotation(entry: &SessionEntry) -> String {
    format!("  {} [{}]", entry.command, entry.cwd)
}

/// The completion universe for a snapshot, in daemon order.
pub fn candidates(snapshot: &[SessionEntry]) -> Vec<Candidate> {
    snapshot
        .iter()
        .map(|entry| Candidate {
            id: entry.id.clone(),
            annotation: annotation(entry),
        })
        .collect()
}

/// Candidates whose id or annotation contains `query`, ignoring case.
/// An empty query keeps everything.
pub fn filter_candidates<'a>(query: &str, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
    let needle = query.trim().to_lowercase();
    candidates
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.id.to_lowercase().contains(&needle)
                || c.annotation.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Expand `query` to a full id when it names exactly one candidate.
///
/// An exact id wins outright; otherwise a unique id prefix, then a unique
/// filter match. This is a typing convenience only; the result still has to
/// go through [`resolve`].
pub fn complete<'a>(query: &str, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|c| c.id == query) {
        return Some(exact);
    }

    let mut prefixed = candidates.iter().filter(|c| c.id.starts_with(query));
    if let (Some(only), None) = (prefixed.next(), prefixed.next()) {
        return Some(only);
    }

    match filter_candidates(query, candidates).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Resolve a reference against `snapshot`. Only an exact id is accepted;
/// surrounding whitespace is ignored.
pub fn resolve(query: &str, snapshot: &[SessionEntry]) -> Result<SessionId> {
    let query = query.trim();
    snapshot
        .iter()
        .find(|entry| entry.id == query)
        .map(|entry| entry.id.clone())
        .ok_or_else(|| SessionError::NoSuchSession(query.to_string()))
}
