//! Request dispatch: route lookup plus the per-request migration decision

use std::sync::Arc;
use strangler_core::Upstream;
use strangler_observability::Metrics;
use tracing::debug;

use crate::distributor::{Distributor, MigrationConfig};
use crate::route_table::{RouteEntry, RouteTable};

/// Result of dispatching a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Prefix of the matched route
    pub route: String,
    /// Upstream that should serve the request
    pub upstream: Upstream,
    /// Whether the distributor made the choice
    pub migration_controlled: bool,
}

/// Resolves inbound paths to upstreams
pub struct Dispatcher {
    table: Arc<RouteTable>,
    distributor: Arc<Distributor>,
    migration: MigrationConfig,
    metrics: Option<Arc<Metrics>>,
}

impl Dispatcher {
    pub fn new(
        table: Arc<RouteTable>,
        distributor: Arc<Distributor>,
        migration: MigrationConfig,
    ) -> Self {
        Self {
            table,
            distributor,
            migration,
            metrics: None,
        }
    }

    /// Record migration decisions into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve `path` to an upstream, or `None` if no prefix matches
    ///
    /// Only requests on a migration-controlled route touch the distributor.
    pub fn dispatch(&self, path: &str) -> Option<Dispatch> {
        let entry = self.table.resolve(path)?;
        Some(self.dispatch_entry(entry))
    }

    /// Resolve the upstream for an already matched route entry
    pub fn dispatch_entry(&self, entry: &RouteEntry) -> Dispatch {
        let upstream = if entry.migration_controlled {
            let target = self.distributor.decide(&self.migration);
            if let Some(metrics) = &self.metrics {
                metrics.record_migration_decision(target.label());
            }
            debug!(route = %entry.path_prefix, target = ?target, "migration decision");
            Upstream::from(target)
        } else {
            entry.upstream
        };

        Dispatch {
            route: entry.path_prefix.clone(),
            upstream,
            migration_controlled: entry.migration_controlled,
        }
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    pub fn distributor(&self) -> &Arc<Distributor> {
        &self.distributor
    }

    pub fn migration(&self) -> MigrationConfig {
        self.migration
    }
}
