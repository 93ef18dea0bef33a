//! Standalone emergency-preemption simulation module
//!
//! This module contains all the core engine logic: the intersection
//! registry, the route catalog, the episode state machine, the per-tick
//! traffic updater, and the bounded metrics history. It can be driven and
//! tested from a console without any frontend.

mod episode;
mod history;
mod intersection;
mod preemption;
mod route;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use episode::{
    Episode, EpisodeAdvance, StartError, EPISODE_TIMEOUT_SECS, HOP_SECS, ROUTE_TRAVERSAL_SECS,
};
#[allow(unused_imports)]
pub use history::{TrafficHistory, TrafficSnapshot, HISTORY_CAPACITY};
#[allow(unused_imports)]
pub use intersection::{
    SimIntersection, BUILD_PER_TICK, CLEAR_PER_TICK, MAX_VEHICLES, MIN_VEHICLES,
};
#[allow(unused_imports)]
pub use preemption::apply_preemption;
#[allow(unused_imports)]
pub use route::EmergencyRoute;
#[allow(unused_imports)]
pub use types::{IntersectionId, Position, Priority, RouteId, SignalState, SimId};
pub use world::{
    EpisodeSnapshot, IntersectionStatus, NetworkMetrics, SimWorld, RESEED_MAX_VEHICLES,
    RESEED_MIN_VEHICLES,
};
