//! Emergency episode state machine
//!
//! This module tracks the single active emergency run: when it started,
//! which corridor it reserved, where the ambulance currently is, and how
//! far along the run is. The world threads it through every tick.

use thiserror::Error;

use super::types::{IntersectionId, RouteId};

/// Seconds the progress bar takes to reach 100%
pub const ROUTE_TRAVERSAL_SECS: f32 = 30.0;

/// Seconds the ambulance spends per intersection hop
///
/// Deliberately independent of [`ROUTE_TRAVERSAL_SECS`]; the hop clock
/// wraps modulo the route length, so the highlighted intersection can jump
/// back to the route start while progress keeps climbing.
pub const HOP_SECS: f32 = 6.0;

/// Hard cutoff: an episode running longer than this force-terminates
pub const EPISODE_TIMEOUT_SECS: f32 = 45.0;

/// Rejection raised by a start command that leaves state untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("an emergency episode is already active")]
    AlreadyActive,
    #[error("unknown emergency route: {0:?}")]
    UnknownRoute(RouteId),
}

/// Outcome of advancing the episode clock, matched on by the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpisodeAdvance {
    /// No episode is running
    Idle,
    /// The episode advanced; carries elapsed seconds since activation
    Active { elapsed_secs: f32 },
    /// The episode exceeded its timeout and must be terminated
    Expired,
}

/// One emergency-response run, from activation to termination
#[derive(Debug, Clone)]
pub struct Episode {
    active: bool,
    start_time: Option<f32>,
    route_id: Option<RouteId>,
    stops: Vec<IntersectionId>,
    position_index: usize,
    progress: f32,
    completed: usize,
}

impl Default for Episode {
    fn default() -> Self {
        Self::new()
    }
}

impl Episode {
    /// Create an inactive episode slot
    pub fn new() -> Self {
        Self {
            active: false,
            start_time: None,
            route_id: None,
            stops: Vec::new(),
            position_index: 0,
            progress: 0.0,
            completed: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn route_id(&self) -> Option<RouteId> {
        self.route_id
    }

    /// Intersections reserved by the active run; empty when inactive
    pub fn stops(&self) -> &[IntersectionId] {
        &self.stops
    }

    pub fn position_index(&self) -> usize {
        self.position_index
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// How many episodes have run to completion; groups history snapshots
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Elapsed seconds since activation at the given simulation time
    pub fn elapsed_secs(&self, now: f32) -> f32 {
        match self.start_time {
            Some(start) => now - start,
            None => 0.0,
        }
    }

    /// The intersection the ambulance currently occupies
    pub fn current_stop(&self) -> Option<IntersectionId> {
        if self.active {
            self.stops.get(self.position_index).copied()
        } else {
            None
        }
    }

    /// Whether the stop at `route_index` has been reached or passed
    pub fn has_reached(&self, route_index: usize) -> bool {
        self.active && route_index <= self.position_index
    }

    /// Activate the episode on the given corridor
    ///
    /// Fails with [`StartError::AlreadyActive`] when a run is in progress;
    /// the caller validates the route id against its catalog first.
    pub fn activate(
        &mut self,
        route_id: RouteId,
        stops: Vec<IntersectionId>,
        now: f32,
    ) -> Result<(), StartError> {
        if self.active {
            return Err(StartError::AlreadyActive);
        }
        self.active = true;
        self.start_time = Some(now);
        self.route_id = Some(route_id);
        self.stops = stops;
        self.position_index = 0;
        self.progress = 0.0;
        Ok(())
    }

    /// Advance position and progress from the simulation clock
    ///
    /// Progress runs on the 30-second traversal clock; the ambulance
    /// position runs on the 6-second hop clock and wraps modulo the route
    /// length. Returns [`EpisodeAdvance::Expired`] once the run exceeds
    /// the 45-second window so the world can tear it down.
    pub fn advance(&mut self, now: f32) -> EpisodeAdvance {
        if !self.active {
            return EpisodeAdvance::Idle;
        }

        let elapsed_secs = self.elapsed_secs(now);
        if elapsed_secs > EPISODE_TIMEOUT_SECS {
            return EpisodeAdvance::Expired;
        }

        self.progress = (elapsed_secs / ROUTE_TRAVERSAL_SECS * 100.0).min(100.0);

        let len = self.stops.len();
        if len > 0 {
            let hops = (elapsed_secs / HOP_SECS) % len as f32;
            self.position_index = (hops as usize).min(len - 1);
        }

        EpisodeAdvance::Active { elapsed_secs }
    }

    /// Deactivate and bump the completed-episode counter
    ///
    /// The caller is responsible for restoring intersection state; this
    /// only clears the session fields back to their inactive defaults.
    pub fn finish(&mut self) {
        self.active = false;
        self.start_time = None;
        self.route_id = None;
        self.stops.clear();
        self.position_index = 0;
        self.progress = 0.0;
        self.completed += 1;
    }
}
