//! Standalone lane simulation module
//!
//! This module contains all the core simulation logic: the occupancy grid,
//! the hazard layer and weather, vehicle perception and lane changes,
//! happiness scoring, and the step/rewind history. It runs without any
//! rendering dependency and is exercised directly by the integration tests.

mod config;
mod environment;
mod error;
mod fault;
mod grid;
mod happiness;
mod history;
mod types;
mod vehicle;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use config::SimConfig;
#[allow(unused_imports)]
pub use environment::{EnvironmentView, EventLog, SimEnvironment, MAX_LOG_ENTRIES};
#[allow(unused_imports)]
pub use error::{SimError, SimResult};
#[allow(unused_imports)]
pub use fault::{FaultField, FAULT_OFFSET_MAX, FAULT_OFFSET_MIN, MAX_POTHOLES};
#[allow(unused_imports)]
pub use grid::SimGrid;
#[allow(unused_imports)]
pub use happiness::{
    comfort_score, efficiency_score, happiness, safety_score, select_ego, CLEAR_PATH_MAX,
    SAFETY_SCAN_DISTANCE, SCORE_MAX,
};
#[allow(unused_imports)]
pub use history::{HistoryManager, SimState, MAX_HISTORY};
#[allow(unused_imports)]
pub use types::{
    FaultKind, LaneChangeReason, VehicleId, WeatherState, HAPPINESS_HISTORY_LEN,
    REACTION_DISPLAY_TICKS,
};
#[allow(unused_imports)]
pub use vehicle::{SimVehicle, VehicleUpdateResult, AHEAD_SCAN_DISTANCE, BEHIND_SCAN_DISTANCE};
