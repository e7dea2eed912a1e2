//! Counter-based traffic distribution for the migration-controlled route
//!
//! The distributor is a deterministic feedback controller: each decision
//! compares the running share of traffic already sent to the new service
//! against the configured target and sends the request to whichever side is
//! behind. Over time the observed split converges on the target.
//!
//! ```rust
//! use strangler_core::TargetService;
//! use strangler_routing::Distributor;
//!
//! let distributor = Distributor::new();
//!
//! // The first request always goes to the new service when the target is non-zero
//! assert_eq!(distributor.determine_target_service(true, 50), TargetService::MoviesNew);
//! assert_eq!(distributor.determine_target_service(true, 50), TargetService::Legacy);
//!
//! let stats = distributor.stats();
//! assert_eq!(stats.total_requests, 2);
//! assert_eq!(stats.new_service_percentage, 50.0);
//! ```
//!
//! ## Thread Safety
//!
//! All three counters live behind one mutex and every operation takes it for
//! its whole read-modify-write, so a reader never sees `total` bumped without
//! the matching per-target increment.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use strangler_core::TargetService;

/// Static migration settings, loaded once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// When false every migration-controlled request goes to the legacy upstream
    pub enabled: bool,
    /// Share of traffic (0-100) that should reach the new service
    pub target_percent: u8,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_percent: 50,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct DistributionState {
    total_requests: u64,
    new_service_requests: u64,
    legacy_requests: u64,
}

/// Point-in-time view of the distributor counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStats {
    pub total_requests: u64,
    pub new_service_requests: u64,
    pub legacy_requests: u64,
    /// Share of requests sent to the new service, rounded to 2 decimals
    pub new_service_percentage: f64,
    /// Share of requests sent to the legacy upstream, rounded to 2 decimals
    pub legacy_percentage: f64,
}

/// Splits migration-controlled traffic between the legacy and new upstreams
#[derive(Debug, Default)]
pub struct Distributor {
    state: Mutex<DistributionState>,
}

impl Distributor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DistributionState> {
        // Counters are plain integers, a panic elsewhere cannot leave them torn
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decide which upstream serves the next migration-controlled request
    ///
    /// The new-service share is computed with this request already counted in
    /// the denominator but not yet in either numerator. A request goes to the
    /// new service only while that share is strictly below the target.
    pub fn determine_target_service(&self, enabled: bool, target_percent: u8) -> TargetService {
        let mut state = self.lock();
        state.total_requests += 1;

        if !enabled {
            state.legacy_requests += 1;
            return TargetService::Legacy;
        }

        let current_new_percent =
            state.new_service_requests as f64 / state.total_requests as f64 * 100.0;

        if current_new_percent < f64::from(target_percent) {
            state.new_service_requests += 1;
            TargetService::MoviesNew
        } else {
            state.legacy_requests += 1;
            TargetService::Legacy
        }
    }

    /// Decide using a static migration configuration
    pub fn decide(&self, config: &MigrationConfig) -> TargetService {
        self.determine_target_service(config.enabled, config.target_percent)
    }

    /// Snapshot the counters and derived percentages
    pub fn stats(&self) -> DistributionStats {
        let state = *self.lock();

        let (new_pct, legacy_pct) = if state.total_requests > 0 {
            let total = state.total_requests as f64;
            (
                round2(state.new_service_requests as f64 / total * 100.0),
                round2(state.legacy_requests as f64 / total * 100.0),
            )
        } else {
            (0.0, 0.0)
        };

        DistributionStats {
            total_requests: state.total_requests,
            new_service_requests: state.new_service_requests,
            legacy_requests: state.legacy_requests,
            new_service_percentage: new_pct,
            legacy_percentage: legacy_pct,
        }
    }

    /// Zero every counter
    pub fn reset_stats(&self) {
        *self.lock() = DistributionState::default();
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
