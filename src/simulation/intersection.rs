//! Intersection state for the preemption simulation
//!
//! Each intersection carries immutable identity data plus the two runtime
//! fields the updater mutates every tick: the displayed signal and the
//! vehicle count.

use super::types::{IntersectionId, Position, Priority, SignalState};

/// Lower bound for a vehicle count once the simulation is running
pub const MIN_VEHICLES: u32 = 3;
/// Upper bound for a vehicle count
pub const MAX_VEHICLES: u32 = 65;
/// Vehicles cleared per tick at intersections the ambulance has reached
pub const CLEAR_PER_TICK: u32 = 3;
/// Vehicles accumulating per tick at intersections off the corridor
pub const BUILD_PER_TICK: u32 = 1;

/// An intersection in the preemption simulation
#[derive(Debug, Clone)]
pub struct SimIntersection {
    pub id: IntersectionId,
    pub name: String,
    pub position: Position,
    pub zone: String,
    pub priority: Priority,
    /// The signal this intersection reverts to absent emergency influence
    pub baseline_signal: SignalState,
    /// Relative congestion weight in [0,1]; static, rendering only
    pub congestion_level: f32,
    /// Currently displayed signal
    pub signal: SignalState,
    /// Vehicles queued at the intersection, kept within [3,65] by the updater
    pub vehicle_count: u32,
    /// Elapsed episode seconds when the active route last touched this
    /// intersection; 0 when no route has
    pub last_ambulance_secs: f32,
}

impl SimIntersection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: IntersectionId,
        name: &str,
        position: Position,
        zone: &str,
        priority: Priority,
        baseline_signal: SignalState,
        initial_signal: SignalState,
        vehicle_count: u32,
        congestion_level: f32,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            zone: zone.to_string(),
            priority,
            baseline_signal,
            congestion_level,
            signal: initial_signal,
            vehicle_count,
            last_ambulance_secs: 0.0,
        }
    }

    /// Apply emergency preemption: force green and stamp the touch time.
    /// When `passed` is set the ambulance has reached or cleared this
    /// intersection, so queued vehicles drain.
    pub fn preempt(&mut self, elapsed_secs: f32, passed: bool) {
        self.signal = SignalState::Green;
        self.last_ambulance_secs = elapsed_secs;
        if passed {
            self.vehicle_count = self.vehicle_count.saturating_sub(CLEAR_PER_TICK).max(MIN_VEHICLES);
        }
    }

    /// Hold cross traffic while the corridor is reserved: force red and let
    /// the queue build.
    pub fn congest(&mut self) {
        self.signal = SignalState::Red;
        self.vehicle_count = (self.vehicle_count + BUILD_PER_TICK).min(MAX_VEHICLES);
    }

    /// Restore normal operation after an episode ends
    pub fn restore(&mut self, vehicle_count: u32) {
        self.signal = self.baseline_signal;
        self.vehicle_count = vehicle_count;
        self.last_ambulance_secs = 0.0;
    }
}
