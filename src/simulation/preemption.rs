//! Per-tick traffic-state updater
//!
//! While an episode is active, every intersection is driven into one of two
//! regimes: corridor members go green (draining their queue once the
//! ambulance has reached them), everything else holds red and builds
//! congestion. The updater never runs while idle, so intersections keep
//! their last mutated values until the end-of-episode reset.

use std::collections::HashMap;

use super::episode::Episode;
use super::intersection::SimIntersection;
use super::types::IntersectionId;

/// Apply one tick of emergency preemption to the intersection store
///
/// `elapsed_secs` is the episode clock, stamped on every corridor member as
/// its last-touched time. The passed/unreached split uses the stop's index
/// within the route, compared against the episode's current position.
pub fn apply_preemption(
    intersections: &mut HashMap<IntersectionId, SimIntersection>,
    episode: &Episode,
    elapsed_secs: f32,
) {
    if !episode.is_active() {
        return;
    }

    for intersection in intersections.values_mut() {
        match episode.stops().iter().position(|&stop| stop == intersection.id) {
            Some(route_index) => {
                intersection.preempt(elapsed_secs, episode.has_reached(route_index));
            }
            None => intersection.congest(),
        }
    }
}
