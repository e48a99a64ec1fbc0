//! Core types for the lane simulation
//!
//! These are standalone types shared by every subsystem.

/// A unique identifier for a vehicle
/// This is a simple wrapper around a usize for type safety; ids are assigned
/// at spawn and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub usize);

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vehicle {}", self.0)
    }
}

/// A hazard occupying one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Persistent road damage; also bleeds into adjacent lanes for detection
    Pothole,
    /// Standing water; only exists while the weather says so
    Rain,
    /// Kept for hand-authored layouts; the generator never places ice
    Ice,
}

impl FaultKind {
    pub fn label(&self) -> &'static str {
        match self {
            FaultKind::Pothole => "pothole",
            FaultKind::Rain => "rain",
            FaultKind::Ice => "ice",
        }
    }
}

/// Why a vehicle decided to change lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneChangeReason {
    /// A hazard was detected ahead
    Fault(FaultKind),
    /// A slower or stopped vehicle blocks the lane
    SlowLeader,
}

impl LaneChangeReason {
    pub fn label(&self) -> &'static str {
        match self {
            LaneChangeReason::Fault(kind) => kind.label(),
            LaneChangeReason::SlowLeader => "slow_car",
        }
    }
}

/// Current weather over the whole grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeatherState {
    pub is_raining: bool,
    /// Ticks of rain left; meaningful only while raining
    pub frames_remaining: u32,
}

/// How long the reaction marker stays visible after a plan is made, in ticks
pub const REACTION_DISPLAY_TICKS: u32 = 40;

/// Most-recent happiness scores kept per vehicle
pub const HAPPINESS_HISTORY_LEN: usize = 10;

/// Global speed multiplier while it rains
pub const RAIN_SPEED_FACTOR: f32 = 0.8;

/// One-tick speed penalty when driving toward a pothole with no escape plan
pub const POTHOLE_SPEED_FACTOR: f32 = 0.7;

/// Chance per rainy tick that a vehicle briefly loses yaw control
pub const SLIP_CHANCE: f64 = 0.05;

/// Forward gap that a slower leader must stay outside of, in multiples of speed
pub const SLOW_LEADER_GAP_FACTOR: f32 = 1.5;
