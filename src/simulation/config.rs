//! Simulation configuration
//!
//! A plain value struct; reading it from a file is the caller's concern.
//! Validation is fail-fast: a bad configuration never produces an environment.

use super::error::{SimError, SimResult};

/// All tunable parameters of the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Grid height; vehicles advance toward row 0
    pub rows: usize,
    /// Number of lanes
    pub cols: usize,
    /// Rows ahead within which any vehicle counts as blocking
    pub safe_distance: usize,
    /// Merge window: the target lane must be empty this many rows to each side
    pub merge_safe_distance: usize,
    /// How far ahead a vehicle scans for hazards
    pub fault_detection_distance: usize,
    /// Pothole chance in percent; the per-attempt draw uses a third of this
    pub pothole_chance: u32,
    /// Percent chance per dry tick that rain starts
    pub weather_change_chance: u32,
    /// How many ticks a rain spell lasts
    pub rain_duration: u32,
    pub safety_weight: f32,
    pub efficiency_weight: f32,
    pub comfort_weight: f32,
    /// Ticks a vehicle must cruise after completing a lane change
    pub lane_change_cooldown: u32,
    /// Vehicles this many rows behind the leader are removed
    pub max_vehicle_distance: usize,
    /// Vehicles placed across the rear rows at construction
    pub num_cars_spawn: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 60,
            cols: 4,
            safe_distance: 2,
            merge_safe_distance: 2,
            fault_detection_distance: 5,
            pothole_chance: 30,
            weather_change_chance: 5,
            rain_duration: 20,
            safety_weight: 0.4,
            efficiency_weight: 0.35,
            comfort_weight: 0.25,
            lane_change_cooldown: 10,
            max_vehicle_distance: 30,
            num_cars_spawn: 4,
        }
    }
}

impl SimConfig {
    /// Check every field that could make the simulation degenerate.
    pub fn validate(&self) -> SimResult<()> {
        if self.rows == 0 {
            return Err(SimError::Configuration("ROWS must be at least 1".into()));
        }
        if self.cols == 0 {
            return Err(SimError::Configuration("COLS must be at least 1".into()));
        }
        if self.fault_detection_distance == 0 {
            return Err(SimError::Configuration(
                "FAULT_DETECTION_DISTANCE must be at least 1".into(),
            ));
        }
        if self.pothole_chance > 100 || self.weather_change_chance > 100 {
            return Err(SimError::Configuration(
                "chance parameters are percentages and must be <= 100".into(),
            ));
        }
        for (name, weight) in [
            ("SAFETY_WEIGHT", self.safety_weight),
            ("EFFICIENCY_WEIGHT", self.efficiency_weight),
            ("COMFORT_WEIGHT", self.comfort_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimError::Configuration(format!(
                    "{name} must be a finite non-negative number, got {weight}"
                )));
            }
        }
        if self.num_cars_spawn > self.rows * self.cols {
            return Err(SimError::Configuration(format!(
                "NUM_CARS_SPAWN ({}) exceeds grid capacity ({})",
                self.num_cars_spawn,
                self.rows * self.cols
            )));
        }
        Ok(())
    }
}
