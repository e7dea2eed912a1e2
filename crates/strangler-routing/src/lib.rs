//! Strangler Gateway Routing
//!
//! This crate provides the routing logic for the gateway:
//! - Path-prefix route table
//! - Counter-based traffic distributor for the migration-controlled route
//! - Dispatcher tying the two together

pub mod dispatcher;
pub mod distributor;
pub mod route_table;

// Re-export commonly used types
pub use dispatcher::{Dispatch, Dispatcher};
pub use distributor::{DistributionStats, Distributor, MigrationConfig};
pub use route_table::{RouteEntry, RouteTable};
