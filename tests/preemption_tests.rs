//! Traffic-state updater and history tests
//!
//! These tests validate the per-tick preemption rules (corridor greening,
//! queue clearing behind the ambulance, congestion build-up elsewhere),
//! the vehicle-count bounds, and the bounded metrics history.

use preempt_sim::simulation::{
    IntersectionId, Position, Priority, RouteId, SignalState, SimWorld, HISTORY_CAPACITY,
    MAX_VEHICLES, MIN_VEHICLES,
};

/// Three-stop corridor (Alpha -> Bravo -> Charlie) plus the off-route Delta
fn corridor_world() -> (SimWorld, RouteId, [IntersectionId; 4]) {
    let mut world = SimWorld::new_with_seed(11);
    let alpha = world.add_intersection(
        "Alpha",
        Position::new(28.60, 77.20),
        "Central",
        Priority::High,
        SignalState::Red,
        SignalState::Red,
        40,
        0.5,
    );
    let bravo = world.add_intersection(
        "Bravo",
        Position::new(28.61, 77.21),
        "Central",
        Priority::Medium,
        SignalState::Yellow,
        SignalState::Yellow,
        30,
        0.4,
    );
    let charlie = world.add_intersection(
        "Charlie",
        Position::new(28.62, 77.22),
        "North",
        Priority::Medium,
        SignalState::Green,
        SignalState::Green,
        20,
        0.3,
    );
    let delta = world.add_intersection(
        "Delta",
        Position::new(28.63, 77.23),
        "North",
        Priority::Low,
        SignalState::Red,
        SignalState::Red,
        10,
        0.2,
    );
    let route = world
        .add_route(
            "Corridor Run",
            "Base Hospital",
            "General Hospital",
            "6 min",
            "Critical",
            &[alpha, bravo, charlie],
        )
        .expect("corridor route should be valid");
    (world, route, [alpha, bravo, charlie, delta])
}

fn vehicle_count(world: &SimWorld, id: IntersectionId) -> u32 {
    world.get_intersection(id).expect("known id").vehicle_count
}

fn signal(world: &SimWorld, id: IntersectionId) -> SignalState {
    world.get_intersection(id).expect("known id").signal
}

#[test]
fn idle_ticks_hold_intersection_state() {
    let (mut world, _, ids) = corridor_world();

    let before: Vec<(SignalState, u32)> = ids
        .iter()
        .map(|&id| (signal(&world, id), vehicle_count(&world, id)))
        .collect();

    for _ in 0..5 {
        world.tick(2.0);
    }

    let after: Vec<(SignalState, u32)> = ids
        .iter()
        .map(|&id| (signal(&world, id), vehicle_count(&world, id)))
        .collect();
    assert_eq!(before, after);

    // History still records every idle tick
    assert_eq!(world.history.len(), 5);
}

#[test]
fn corridor_goes_green_and_clears_behind_the_ambulance() {
    let (mut world, route, [alpha, bravo, charlie, delta]) = corridor_world();
    world.start_episode(route).expect("start should succeed");

    // One 6-second tick: the ambulance is at the second stop
    let snapshot = world.tick(6.0);
    assert_eq!(snapshot.current_intersection, Some(bravo));

    // Reached or passed stops drain by 3; the unreached stop holds its
    // queue but is already green for the corridor
    assert_eq!(vehicle_count(&world, alpha), 37);
    assert_eq!(vehicle_count(&world, bravo), 27);
    assert_eq!(vehicle_count(&world, charlie), 20);
    assert_eq!(signal(&world, alpha), SignalState::Green);
    assert_eq!(signal(&world, bravo), SignalState::Green);
    assert_eq!(signal(&world, charlie), SignalState::Green);

    // Cross traffic holds red and builds
    assert_eq!(vehicle_count(&world, delta), 11);
    assert_eq!(signal(&world, delta), SignalState::Red);
}

#[test]
fn clearing_follows_the_route_index_not_the_registry_order() {
    // Route runs Charlie -> Alpha, so registry order must not leak into
    // the passed/unreached split
    let (mut world, _, [alpha, _bravo, charlie, _delta]) = corridor_world();
    let reversed = world
        .add_route(
            "Reverse Run",
            "General Hospital",
            "Base Hospital",
            "4 min",
            "High",
            &[charlie, alpha],
        )
        .expect("route should be valid");
    world.start_episode(reversed).expect("start should succeed");

    // At 1s the ambulance still sits at its first stop, Charlie
    world.tick(1.0);
    assert_eq!(vehicle_count(&world, charlie), 17);
    assert_eq!(vehicle_count(&world, alpha), 40);
    assert_eq!(signal(&world, alpha), SignalState::Green);
}

#[test]
fn repeated_ticks_drain_to_the_floor() {
    let (mut world, route, [alpha, _bravo, _charlie, _delta]) = corridor_world();
    world.start_episode(route).expect("start should succeed");

    // Alpha is cleared every tick once reached; 40 vehicles floor at 3
    for _ in 0..20 {
        world.tick(1.0);
    }
    assert_eq!(vehicle_count(&world, alpha), MIN_VEHICLES);
}

#[test]
fn congestion_build_up_caps_at_the_limit() {
    let (mut world, route, [_alpha, _bravo, _charlie, delta]) = corridor_world();
    // Push the bystander close to the cap before the emergency starts
    if let Some(intersection) = world.intersections.get_mut(&delta) {
        intersection.vehicle_count = MAX_VEHICLES - 2;
    }
    world.start_episode(route).expect("start should succeed");

    for _ in 0..5 {
        world.tick(1.0);
    }
    assert_eq!(vehicle_count(&world, delta), MAX_VEHICLES);
}

#[test]
fn vehicle_counts_stay_bounded_for_the_whole_run() {
    let (mut world, route, ids) = corridor_world();
    world.start_episode(route).expect("start should succeed");

    for _ in 0..50 {
        world.tick(1.0);
        for &id in &ids {
            let count = vehicle_count(&world, id);
            assert!(count >= MIN_VEHICLES);
            assert!(count <= MAX_VEHICLES);
        }
    }
}

#[test]
fn corridor_touch_times_are_stamped() {
    let (mut world, route, [alpha, _bravo, charlie, delta]) = corridor_world();
    world.start_episode(route).expect("start should succeed");

    world.tick(6.0);
    let alpha_touch = world.get_intersection(alpha).expect("known id").last_ambulance_secs;
    let charlie_touch = world.get_intersection(charlie).expect("known id").last_ambulance_secs;
    let delta_touch = world.get_intersection(delta).expect("known id").last_ambulance_secs;

    // Every corridor member is stamped each tick, reached or not
    assert_eq!(alpha_touch, 6.0);
    assert_eq!(charlie_touch, 6.0);
    assert_eq!(delta_touch, 0.0);
}

#[test]
fn route_aggregates_track_the_corridor() {
    let (mut world, route, [alpha, bravo, charlie, _delta]) = corridor_world();
    world.start_episode(route).expect("start should succeed");
    world.tick(6.0);

    let expected: u32 = [alpha, bravo, charlie]
        .iter()
        .map(|&id| vehicle_count(&world, id))
        .sum();
    assert_eq!(world.route_vehicles(), expected);
    assert_eq!(world.cleared_signals(), 3);
}

#[test]
fn network_metrics_aggregate_the_registry() {
    let (world, _, _) = corridor_world();
    let metrics = world.network_metrics();

    assert_eq!(metrics.total_vehicles, 40 + 30 + 20 + 10);
    // Charlie starts green; the rest start red or yellow
    assert_eq!(metrics.green_signals, 1);
    assert!((metrics.mean_congestion - 0.35).abs() < 1e-3);
}

#[test]
fn history_records_every_tick_with_episode_grouping() {
    let (mut world, route, _) = corridor_world();

    world.tick(2.0);
    world.start_episode(route).expect("start should succeed");
    world.tick(1.0);
    world.stop_episode();
    world.tick(2.0);

    let snapshots = world.history.to_vec();
    assert_eq!(snapshots.len(), 3);

    assert!(!snapshots[0].episode_active);
    assert_eq!(snapshots[0].episode_id, 0);

    assert!(snapshots[1].episode_active);
    assert_eq!(snapshots[1].episode_id, 0);

    assert!(!snapshots[2].episode_active);
    assert_eq!(snapshots[2].episode_id, 1);
}

#[test]
fn history_evicts_oldest_beyond_capacity() {
    let (mut world, _, _) = corridor_world();

    for _ in 0..(HISTORY_CAPACITY + 1) {
        world.tick(1.0);
    }

    assert_eq!(world.history.len(), HISTORY_CAPACITY);
    // Tick 1 was evicted; ticks 2..=51 remain
    let oldest = world.history.oldest().expect("history is non-empty");
    assert_eq!(oldest.time, 2.0);
    let latest = world.history.latest().expect("history is non-empty");
    assert_eq!(latest.time, (HISTORY_CAPACITY + 1) as f32);
}

#[test]
fn snapshot_marks_corridor_and_ambulance() {
    let (mut world, route, [alpha, bravo, _charlie, delta]) = corridor_world();
    world.start_episode(route).expect("start should succeed");
    let snapshot = world.tick(6.0);

    let find = |id: IntersectionId| {
        snapshot
            .intersections
            .iter()
            .find(|status| status.id == id)
            .expect("snapshot covers the registry")
    };

    assert!(find(alpha).on_route);
    assert!(!find(alpha).ambulance_here);
    assert!(find(bravo).on_route);
    assert!(find(bravo).ambulance_here);
    assert!(!find(delta).on_route);
    assert!(!find(delta).ambulance_here);

    // The history copy rides along in the snapshot
    assert_eq!(snapshot.history.len(), 1);
}

#[test]
fn snapshot_after_termination_shows_restored_network() {
    let (mut world, route, ids) = corridor_world();
    world.start_episode(route).expect("start should succeed");
    world.tick(20.0);
    world.stop_episode();

    let snapshot = world.snapshot();
    assert!(!snapshot.active);
    for &id in &ids {
        let baseline = world.get_intersection(id).expect("known id").baseline_signal;
        assert_eq!(signal(&world, id), baseline);
    }
    assert!(snapshot.intersections.iter().all(|status| !status.on_route));
}
