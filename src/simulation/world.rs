//! Main simulation world that ties everything together
//!
//! Owns the intersection registry, the route catalog, the active episode,
//! and the metrics history, and orchestrates one synchronous tick at a
//! time. This is the entry point for running the preemption simulation
//! without any frontend.

use anyhow::{bail, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::HashMap;

use super::episode::{Episode, EpisodeAdvance, StartError, EPISODE_TIMEOUT_SECS};
use super::history::{TrafficHistory, TrafficSnapshot};
use super::intersection::SimIntersection;
use super::preemption::apply_preemption;
use super::route::EmergencyRoute;
use super::types::{IntersectionId, Position, Priority, RouteId, SignalState, SimId};

/// Lower bound of the vehicle-count reseed applied when an episode ends
pub const RESEED_MIN_VEHICLES: u32 = 20;
/// Upper bound of the vehicle-count reseed applied when an episode ends
pub const RESEED_MAX_VEHICLES: u32 = 55;

/// Aggregate metrics across the whole network
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkMetrics {
    /// Sum of vehicle counts at all intersections
    pub total_vehicles: u32,
    /// Intersections currently showing green
    pub green_signals: usize,
    /// Mean static congestion weight
    pub mean_congestion: f32,
}

/// Per-intersection view exposed in the tick snapshot
#[derive(Debug, Clone)]
pub struct IntersectionStatus {
    pub id: IntersectionId,
    pub name: String,
    pub signal: SignalState,
    pub vehicle_count: u32,
    /// Whether this intersection lies on the reserved corridor
    pub on_route: bool,
    /// Whether the ambulance currently occupies this intersection
    pub ambulance_here: bool,
}

/// Full engine state handed to the presentation layer each tick
#[derive(Debug, Clone)]
pub struct EpisodeSnapshot {
    pub active: bool,
    pub elapsed_secs: f32,
    /// Seconds left in the 45-second emergency window; 0 when idle
    pub remaining_secs: f32,
    pub progress: f32,
    pub current_intersection: Option<IntersectionId>,
    /// Registry state in registry order
    pub intersections: Vec<IntersectionStatus>,
    /// Copy of the retained history ring, oldest first
    pub history: Vec<TrafficSnapshot>,
}

/// The main simulation world
pub struct SimWorld {
    /// All intersections
    pub intersections: HashMap<IntersectionId, SimIntersection>,

    /// All emergency routes
    pub routes: HashMap<RouteId, EmergencyRoute>,

    /// The single episode slot
    pub episode: Episode,

    /// Bounded metrics history, one entry per tick
    pub history: TrafficHistory,

    /// Simulation time in seconds
    pub time: f32,

    /// Registry insertion order, for stable display and snapshots
    intersection_order: Vec<IntersectionId>,

    /// Catalog insertion order
    route_order: Vec<RouteId>,

    /// Next ID to assign
    next_id: usize,

    /// Optional seeded RNG for reproducible reseeding
    rng: Option<StdRng>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(rng: Option<StdRng>) -> Self {
        Self {
            intersections: HashMap::new(),
            routes: HashMap::new(),
            episode: Episode::new(),
            history: TrafficHistory::new(),
            time: 0.0,
            intersection_order: Vec::new(),
            route_order: Vec::new(),
            next_id: 0,
            rng,
        }
    }

    pub fn new() -> Self {
        Self::new_internal(None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible runs
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)))
    }

    /// Draw a fresh post-episode vehicle count, using seeded RNG if available
    fn random_vehicle_count(&mut self) -> u32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(RESEED_MIN_VEHICLES..=RESEED_MAX_VEHICLES),
            None => rand::rng().random_range(RESEED_MIN_VEHICLES..=RESEED_MAX_VEHICLES),
        }
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an intersection to the registry
    #[allow(clippy::too_many_arguments)]
    pub fn add_intersection(
        &mut self,
        name: &str,
        position: Position,
        zone: &str,
        priority: Priority,
        baseline_signal: SignalState,
        initial_signal: SignalState,
        vehicle_count: u32,
        congestion_level: f32,
    ) -> IntersectionId {
        let id = IntersectionId(self.next_sim_id());
        let intersection = SimIntersection::new(
            id,
            name,
            position,
            zone,
            priority,
            baseline_signal,
            initial_signal,
            vehicle_count,
            congestion_level,
        );
        self.intersections.insert(id, intersection);
        self.intersection_order.push(id);
        id
    }

    /// Add an emergency route to the catalog
    ///
    /// A route must visit at least two distinct, known intersections.
    pub fn add_route(
        &mut self,
        name: &str,
        hospital: &str,
        destination: &str,
        eta: &str,
        priority: &str,
        stops: &[IntersectionId],
    ) -> Result<RouteId> {
        if stops.len() < 2 {
            bail!("Route '{}' needs at least two stops", name);
        }
        for (index, stop) in stops.iter().enumerate() {
            if stops[..index].contains(stop) {
                bail!("Route '{}' visits an intersection twice", name);
            }
            if !self.intersections.contains_key(stop) {
                bail!("Route '{}' references an unknown intersection", name);
            }
        }

        let id = RouteId(self.next_sim_id());
        let route = EmergencyRoute::new(id, name, hospital, destination, eta, priority, stops.to_vec());
        self.routes.insert(id, route);
        self.route_order.push(id);
        Ok(id)
    }

    pub fn get_intersection(&self, id: IntersectionId) -> Option<&SimIntersection> {
        self.intersections.get(&id)
    }

    pub fn get_route(&self, id: RouteId) -> Option<&EmergencyRoute> {
        self.routes.get(&id)
    }

    /// Intersections in registry order
    pub fn intersections_in_order(&self) -> impl Iterator<Item = &SimIntersection> {
        self.intersection_order
            .iter()
            .filter_map(|id| self.intersections.get(id))
    }

    /// Routes in catalog order
    pub fn routes_in_order(&self) -> impl Iterator<Item = &EmergencyRoute> {
        self.route_order.iter().filter_map(|id| self.routes.get(id))
    }

    /// Route ids in catalog order
    pub fn route_ids(&self) -> &[RouteId] {
        &self.route_order
    }

    /// Look up a route by its exact catalog name
    pub fn find_route_by_name(&self, name: &str) -> Option<RouteId> {
        self.routes_in_order()
            .find(|route| route.name == name)
            .map(|route| route.id)
    }

    /// Look up an intersection by its exact name
    pub fn find_intersection_by_name(&self, name: &str) -> Option<IntersectionId> {
        self.intersections_in_order()
            .find(|intersection| intersection.name == name)
            .map(|intersection| intersection.id)
    }

    /// Activate an emergency episode on the given route
    ///
    /// Rejected without touching any state when an episode is already
    /// active or the route id is unknown.
    pub fn start_episode(&mut self, route_id: RouteId) -> Result<(), StartError> {
        if self.episode.is_active() {
            return Err(StartError::AlreadyActive);
        }
        let route = match self.routes.get(&route_id) {
            Some(route) => route,
            None => return Err(StartError::UnknownRoute(route_id)),
        };
        let stops = route.stops.clone();
        let name = route.name.clone();
        self.episode.activate(route_id, stops, self.time)?;
        info!(
            "Emergency episode started on route '{}' at t={:.1}s",
            name, self.time
        );
        Ok(())
    }

    /// Terminate the active episode; no-op when idle
    pub fn stop_episode(&mut self) {
        self.end_episode();
    }

    /// Tear down the episode and restore every intersection to baseline
    fn end_episode(&mut self) {
        if !self.episode.is_active() {
            return;
        }

        let elapsed_secs = self.episode.elapsed_secs(self.time);
        self.episode.finish();

        // Collect ids first; reseeding needs &mut self for the RNG
        let ids: Vec<IntersectionId> = self.intersection_order.clone();
        for id in ids {
            let vehicle_count = self.random_vehicle_count();
            if let Some(intersection) = self.intersections.get_mut(&id) {
                intersection.restore(vehicle_count);
            }
        }

        info!(
            "Emergency episode #{} ended after {:.1}s",
            self.episode.completed(),
            elapsed_secs
        );
    }

    /// Main simulation tick
    ///
    /// Advances the clock, drives the episode state machine, applies the
    /// traffic-state updater while a run is active, records one history
    /// snapshot, and returns the full engine state for rendering.
    pub fn tick(&mut self, delta_secs: f32) -> EpisodeSnapshot {
        self.time += delta_secs;

        match self.episode.advance(self.time) {
            EpisodeAdvance::Idle => {}
            EpisodeAdvance::Expired => {
                debug!(
                    "Episode exceeded the {}s emergency window; terminating",
                    EPISODE_TIMEOUT_SECS
                );
                self.end_episode();
            }
            EpisodeAdvance::Active { elapsed_secs } => {
                apply_preemption(&mut self.intersections, &self.episode, elapsed_secs);
            }
        }

        self.record_history();
        self.snapshot()
    }

    /// Calculate aggregate metrics over the whole network
    pub fn network_metrics(&self) -> NetworkMetrics {
        let total_vehicles = self
            .intersections
            .values()
            .map(|intersection| intersection.vehicle_count)
            .sum();
        let green_signals = self
            .intersections
            .values()
            .filter(|intersection| intersection.signal == SignalState::Green)
            .count();
        let mean_congestion = if self.intersections.is_empty() {
            0.0
        } else {
            self.intersections
                .values()
                .map(|intersection| intersection.congestion_level)
                .sum::<f32>()
                / self.intersections.len() as f32
        };

        NetworkMetrics {
            total_vehicles,
            green_signals,
            mean_congestion,
        }
    }

    /// Sum of vehicle counts along the reserved corridor; 0 when idle
    pub fn route_vehicles(&self) -> u32 {
        self.episode
            .stops()
            .iter()
            .filter_map(|id| self.intersections.get(id))
            .map(|intersection| intersection.vehicle_count)
            .sum()
    }

    /// Corridor intersections currently showing green; 0 when idle
    pub fn cleared_signals(&self) -> usize {
        self.episode
            .stops()
            .iter()
            .filter_map(|id| self.intersections.get(id))
            .filter(|intersection| intersection.signal == SignalState::Green)
            .count()
    }

    fn record_history(&mut self) {
        let metrics = self.network_metrics();
        self.history.record(TrafficSnapshot {
            time: self.time,
            total_vehicles: metrics.total_vehicles,
            green_signals: metrics.green_signals,
            mean_congestion: metrics.mean_congestion,
            episode_active: self.episode.is_active(),
            episode_id: self.episode.completed(),
        });
    }

    /// Build the presentation-facing view of the current state
    pub fn snapshot(&self) -> EpisodeSnapshot {
        let active = self.episode.is_active();
        let elapsed_secs = if active {
            self.episode.elapsed_secs(self.time)
        } else {
            0.0
        };
        let remaining_secs = if active {
            (EPISODE_TIMEOUT_SECS - elapsed_secs).max(0.0)
        } else {
            0.0
        };
        let current_intersection = self.episode.current_stop();

        let intersections = self
            .intersections_in_order()
            .map(|intersection| IntersectionStatus {
                id: intersection.id,
                name: intersection.name.clone(),
                signal: intersection.signal,
                vehicle_count: intersection.vehicle_count,
                on_route: self.episode.stops().contains(&intersection.id),
                ambulance_here: current_intersection == Some(intersection.id),
            })
            .collect();

        EpisodeSnapshot {
            active,
            elapsed_secs,
            remaining_secs,
            progress: self.episode.progress(),
            current_intersection,
            intersections,
            history: self.history.to_vec(),
        }
    }

    /// Create the fixed Delhi network with its four emergency routes
    pub fn create_delhi_world() -> Self {
        Self::build_delhi_world(SimWorld::new())
    }

    /// Create the Delhi network with a seeded RNG for reproducible runs
    pub fn create_delhi_world_with_seed(seed: u64) -> Self {
        Self::build_delhi_world(SimWorld::new_with_seed(seed))
    }

    /// Internal helper to build the Delhi network
    pub fn build_delhi_world(mut world: SimWorld) -> Self {
        let connaught_place = world.add_intersection(
            "Connaught Place",
            Position::new(28.6315, 77.2167),
            "Central",
            Priority::High,
            SignalState::Red,
            SignalState::Red,
            45,
            0.8,
        );
        let india_gate = world.add_intersection(
            "India Gate",
            Position::new(28.6129, 77.2295),
            "Central",
            Priority::Medium,
            SignalState::Yellow,
            SignalState::Green,
            32,
            0.6,
        );
        let red_fort = world.add_intersection(
            "Red Fort",
            Position::new(28.6562, 77.2410),
            "Old Delhi",
            Priority::Medium,
            SignalState::Green,
            SignalState::Yellow,
            28,
            0.5,
        );
        let karol_bagh = world.add_intersection(
            "Karol Bagh",
            Position::new(28.6519, 77.1906),
            "West",
            Priority::High,
            SignalState::Red,
            SignalState::Green,
            38,
            0.7,
        );
        let chandni_chowk = world.add_intersection(
            "Chandni Chowk",
            Position::new(28.6506, 77.2334),
            "Old Delhi",
            Priority::High,
            SignalState::Yellow,
            SignalState::Red,
            52,
            0.9,
        );
        let rajouri_garden = world.add_intersection(
            "Rajouri Garden",
            Position::new(28.6470, 77.1203),
            "West",
            Priority::Low,
            SignalState::Green,
            SignalState::Yellow,
            25,
            0.4,
        );
        let lajpat_nagar = world.add_intersection(
            "Lajpat Nagar",
            Position::new(28.5677, 77.2428),
            "South",
            Priority::Medium,
            SignalState::Red,
            SignalState::Green,
            33,
            0.6,
        );
        let nehru_place = world.add_intersection(
            "Nehru Place",
            Position::new(28.5494, 77.2524),
            "South",
            Priority::High,
            SignalState::Yellow,
            SignalState::Red,
            41,
            0.75,
        );

        let _ = world.add_route(
            "AIIMS to Red Fort",
            "AIIMS",
            "Red Fort Hospital",
            "8 min",
            "Critical",
            &[connaught_place, india_gate, red_fort],
        );
        let _ = world.add_route(
            "Safdarjung to Chandni Chowk",
            "Safdarjung",
            "LNJP Hospital",
            "12 min",
            "High",
            &[connaught_place, karol_bagh, chandni_chowk],
        );
        let _ = world.add_route(
            "Max Hospital to LNJP",
            "Max Hospital",
            "LNJP Hospital",
            "15 min",
            "Emergency",
            &[rajouri_garden, karol_bagh, connaught_place, chandni_chowk],
        );
        let _ = world.add_route(
            "Apollo to Fortis",
            "Apollo",
            "Fortis Hospital",
            "10 min",
            "Trauma",
            &[lajpat_nagar, nehru_place, india_gate, connaught_place],
        );

        world
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let metrics = self.network_metrics();

        println!("=== Preemption Simulation Summary ===");
        println!(
            "Time: {:.1}s | Episodes completed: {}",
            self.time,
            self.episode.completed()
        );

        if self.episode.is_active() {
            let elapsed_secs = self.episode.elapsed_secs(self.time);
            let remaining_secs = (EPISODE_TIMEOUT_SECS - elapsed_secs).max(0.0);
            let location = self
                .episode
                .current_stop()
                .and_then(|id| self.intersections.get(&id))
                .map(|intersection| intersection.name.as_str())
                .unwrap_or("?");
            println!(
                "EMERGENCY ACTIVE: progress {:.1}% | elapsed {:.1}s | remaining {:.1}s",
                self.episode.progress(),
                elapsed_secs,
                remaining_secs
            );
            println!(
                "Ambulance at: {} (stop {}/{})",
                location,
                self.episode.position_index() + 1,
                self.episode.stops().len()
            );
            println!(
                "Corridor vehicles: {} | Cleared signals: {}/{}",
                self.route_vehicles(),
                self.cleared_signals(),
                self.episode.stops().len()
            );
        } else {
            println!("No active emergency");
        }

        println!("--- Intersections ---");
        for intersection in self.intersections_in_order() {
            println!(
                "  {:<16} [{:<6}] vehicles={:<3} zone={:<9} priority={}",
                intersection.name,
                intersection.signal.as_str(),
                intersection.vehicle_count,
                intersection.zone,
                intersection.priority.as_str()
            );
        }
        println!(
            "Totals: vehicles={} | green={}/{} | mean congestion={:.0}%",
            metrics.total_vehicles,
            metrics.green_signals,
            self.intersections.len(),
            metrics.mean_congestion * 100.0
        );
    }

    /// Draw a visual map of the network in the terminal
    pub fn draw_map(&self) {
        const WIDTH: usize = 56;
        const HEIGHT: usize = 20;

        if self.intersections.is_empty() {
            return;
        }

        // Find bounds of the network
        let mut min_lat = f32::INFINITY;
        let mut max_lat = f32::NEG_INFINITY;
        let mut min_lon = f32::INFINITY;
        let mut max_lon = f32::NEG_INFINITY;

        for intersection in self.intersections.values() {
            min_lat = min_lat.min(intersection.position.lat);
            max_lat = max_lat.max(intersection.position.lat);
            min_lon = min_lon.min(intersection.position.lon);
            max_lon = max_lon.max(intersection.position.lon);
        }

        let lat_span = (max_lat - min_lat).max(f32::EPSILON);
        let lon_span = (max_lon - min_lon).max(f32::EPSILON);

        // Helper to convert coordinates to grid cells, north up
        let to_grid = |position: &Position| -> (usize, usize) {
            let col = ((position.lon - min_lon) / lon_span * (WIDTH - 1) as f32) as usize;
            let row = ((max_lat - position.lat) / lat_span * (HEIGHT - 1) as f32) as usize;
            (row.min(HEIGHT - 1), col.min(WIDTH - 1))
        };

        let mut grid = vec![vec![' '; WIDTH]; HEIGHT];

        // Draw the reserved corridor between consecutive stops
        if self.episode.is_active() {
            for pair in self.episode.stops().windows(2) {
                let start = match self.intersections.get(&pair[0]) {
                    Some(intersection) => intersection.position,
                    None => continue,
                };
                let end = match self.intersections.get(&pair[1]) {
                    Some(intersection) => intersection.position,
                    None => continue,
                };

                let (start_row, start_col) = to_grid(&start);
                let (end_row, end_col) = to_grid(&end);

                // Simple line drawing (Bresenham-like)
                let dx = (end_col as i32 - start_col as i32).abs();
                let dy = (end_row as i32 - start_row as i32).abs();
                let sx = if start_col < end_col { 1 } else { -1 };
                let sy = if start_row < end_row { 1 } else { -1 };

                let mut err = dx - dy;
                let mut x = start_col as i32;
                let mut y = start_row as i32;

                loop {
                    if x >= 0 && x < WIDTH as i32 && y >= 0 && y < HEIGHT as i32 {
                        let ux = x as usize;
                        let uy = y as usize;
                        if grid[uy][ux] == ' ' {
                            grid[uy][ux] = '.';
                        }
                    }

                    if x == end_col as i32 && y == end_row as i32 {
                        break;
                    }

                    let e2 = 2 * err;
                    if e2 > -dy {
                        err -= dy;
                        x += sx;
                    }
                    if e2 < dx {
                        err += dx;
                        y += sy;
                    }
                }
            }
        }

        // Draw intersections as their signal glyph
        for intersection in self.intersections_in_order() {
            let (row, col) = to_grid(&intersection.position);
            grid[row][col] = intersection.signal.glyph();
        }

        // Ambulance overlay
        if let Some(id) = self.episode.current_stop() {
            if let Some(intersection) = self.intersections.get(&id) {
                let (row, col) = to_grid(&intersection.position);
                grid[row][col] = '*';
            }
        }

        println!("\n=== Network Map ===");
        println!("Legend: R/Y/G=signal, *=ambulance, .=active corridor");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
