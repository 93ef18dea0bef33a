//! Emergency Signal-Preemption Simulation Library
//!
//! A deterministic, tick-driven simulation of an ambulance preempting
//! traffic signals along a fixed corridor of named intersections. The
//! engine runs headless; any frontend is an external consumer that reads
//! the per-tick snapshots and issues start/stop commands.

pub mod simulation;
