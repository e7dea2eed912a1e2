//! Path-prefix route table
//!
//! Maps an inbound request path to the upstream that serves it. Prefixes are
//! matched on segment boundaries and the longest matching prefix wins.

use serde::{Deserialize, Serialize};
use strangler_core::Upstream;

/// A single prefix rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Path prefix without a trailing slash (e.g. `/api/users`)
    pub path_prefix: String,
    /// Upstream serving this prefix. For the migration-controlled entry this
    /// is the upstream used when migration is off.
    pub upstream: Upstream,
    /// Whether the distributor decides the upstream per request
    pub migration_controlled: bool,
}

impl RouteEntry {
    /// A prefix that always forwards to the same upstream
    pub fn fixed(path_prefix: impl Into<String>, upstream: Upstream) -> Self {
        Self {
            path_prefix: normalize_prefix(path_prefix.into()),
            upstream,
            migration_controlled: false,
        }
    }

    /// A prefix whose upstream is chosen by the distributor
    pub fn migration_controlled(path_prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: normalize_prefix(path_prefix.into()),
            upstream: Upstream::Legacy,
            migration_controlled: true,
        }
    }

    /// Check whether `path` falls under this prefix
    ///
    /// `/api/users` matches `/api/users` and `/api/users/42`, not `/api/usersx`.
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.path_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Ordered, immutable list of route entries
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Create a route table from explicit entries
    pub fn with_entries(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// The gateway's route set
    ///
    /// | Prefix | Upstream |
    /// |---|---|
    /// | `/api/events` | events service |
    /// | `/api/users` | monolith |
    /// | `/api/payments` | monolith |
    /// | `/api/subscriptions` | monolith |
    /// | `/api/movies` | distributor decides |
    pub fn gateway_default() -> Self {
        Self::with_entries(vec![
            RouteEntry::fixed("/api/events", Upstream::Events),
            RouteEntry::fixed("/api/users", Upstream::Legacy),
            RouteEntry::fixed("/api/payments", Upstream::Legacy),
            RouteEntry::fixed("/api/subscriptions", Upstream::Legacy),
            RouteEntry::migration_controlled("/api/movies"),
        ])
    }

    /// Find the entry serving `path`, preferring the longest prefix.
    /// Ties keep table order.
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        let mut best: Option<&RouteEntry> = None;
        for entry in self.entries.iter().filter(|e| e.matches(path)) {
            match best {
                Some(b) if b.path_prefix.len() >= entry.path_prefix.len() => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    /// All entries, in table order
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::gateway_default()
    }
}
