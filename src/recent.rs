//! Recently-visited-projects queue.
//!
//! The list lives entirely in a per-user cookie (`recent-<username>`): a
//! comma-joined sequence of project ids, most recent first, at most five
//! entries. Handlers read the cookie, run these functions, and write the
//! result back; nothing is stored server-side.

use crate::models::Project;

/// Maximum number of tracked projects.
pub const RECENT_PROJECTS_CAP: usize = 5;

/// Name of the per-user cookie holding the recency blob.
pub fn cookie_name(username: &str) -> String {
    format!("recent-{username}")
}

/// Parse a recency blob into at most [`RECENT_PROJECTS_CAP`] ids.
///
/// Lenient on principle: an absent or empty blob is an empty list, an
/// oversized one is clamped to its first five entries. Ids are not
/// validated here; unknown ones fall out later in [`resolve_visible`].
pub fn parse(blob: Option<&str>) -> Vec<String> {
    match blob {
        Some(blob) if !blob.is_empty() => blob
            .split(',')
            .take(RECENT_PROJECTS_CAP)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Serialize ids back into the cookie value. An empty list becomes "".
pub fn serialize(ids: &[String]) -> String {
    ids.join(",")
}

/// Record a visit to `visited`, returning the updated list.
///
/// A revisit moves the id to the front without changing the length; a new id
/// at capacity evicts the least-recent entry first. The result never exceeds
/// [`RECENT_PROJECTS_CAP`] entries.
pub fn touch(mut current: Vec<String>, visited: &str) -> Vec<String> {
    match current.iter().position(|id| id == visited) {
        Some(pos) => {
            current.remove(pos);
        }
        None => {
            if current.len() >= RECENT_PROJECTS_CAP {
                current.pop();
            }
        }
    }

    current.insert(0, visited.to_string());
    current
}

/// Resolve ids against the projects the user can access, preserving input
/// order. Ids with no accessible match are dropped silently, so a stale or
/// tampered cookie never exposes anything the user could not open directly.
pub fn resolve_visible(ids: &[String], accessible: &[Project]) -> Vec<Project> {
    ids.iter()
        .filter_map(|id| accessible.iter().find(|p| &p.id == id).cloned())
        .collect()
}
