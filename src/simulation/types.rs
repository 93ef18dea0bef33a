//! Core types for the preemption simulation
//!
//! Standalone identifier, enum, and position types shared across the engine.

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimId(pub usize);

/// A wrapper type for intersection IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntersectionId(pub SimId);

/// A wrapper type for emergency route IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(pub SimId);

/// The displayed state of a traffic signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Red,
    Yellow,
    Green,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Red => "red",
            SignalState::Yellow => "yellow",
            SignalState::Green => "green",
        }
    }

    /// Single-character marker used by the terminal map
    pub fn glyph(&self) -> char {
        match self {
            SignalState::Red => 'R',
            SignalState::Yellow => 'Y',
            SignalState::Green => 'G',
        }
    }
}

/// Preemption priority assigned to an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Geographic position of an intersection
///
/// Only used as a rendering weight for the terminal map; the engine does no
/// distance or routing math on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f32,
    pub lon: f32,
}

impl Position {
    pub fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }
}
