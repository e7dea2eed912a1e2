//! Upstream identifiers shared by routing, egress and ingress

use serde::{Deserialize, Serialize};
use std::fmt;

/// A backend service the gateway forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Upstream {
    /// The legacy monolith
    Legacy,
    /// The extracted movies service
    MoviesNew,
    /// The events service
    Events,
}

impl Upstream {
    /// Every known upstream, in table order
    pub const ALL: [Upstream; 3] = [Upstream::Legacy, Upstream::MoviesNew, Upstream::Events];

    /// Stable name used in logs, metrics and error bodies
    pub fn name(&self) -> &'static str {
        match self {
            Upstream::Legacy => "Monolith",
            Upstream::MoviesNew => "Movies",
            Upstream::Events => "Events",
        }
    }

    /// Lowercase label for metric dimensions
    pub fn label(&self) -> &'static str {
        match self {
            Upstream::Legacy => "monolith",
            Upstream::MoviesNew => "movies",
            Upstream::Events => "events",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a migration decision for the migration-controlled route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetService {
    Legacy,
    MoviesNew,
}

impl TargetService {
    pub fn label(&self) -> &'static str {
        Upstream::from(*self).label()
    }
}

impl From<TargetService> for Upstream {
    fn from(target: TargetService) -> Self {
        match target {
            TargetService::Legacy => Upstream::Legacy,
            TargetService::MoviesNew => Upstream::MoviesNew,
        }
    }
}
