//! Happiness scoring and ego selection
//!
//! Each sub-score is clamped to [0, 10]; the composite is the weighted sum.
//! The ego is the first vehicle in collection order to attain the maximum.

use ordered_float::OrderedFloat;

use super::config::SimConfig;
use super::fault::FaultField;
use super::grid::SimGrid;
use super::types::VehicleId;
use super::vehicle::SimVehicle;

pub const SCORE_MAX: f32 = 10.0;

/// How far ahead the safety sub-score looks for trouble
pub const SAFETY_SCAN_DISTANCE: usize = 10;

/// Longest clear path the efficiency sub-score rewards
pub const CLEAR_PATH_MAX: usize = 20;

/// 10 when nothing threatens within the scan distance, otherwise half the
/// distance to the nearer of the first vehicle or fault ahead.
pub fn safety_score(vehicle: &SimVehicle, grid: &SimGrid, faults: &FaultField) -> f32 {
    for distance in 1..=SAFETY_SCAN_DISTANCE {
        let Some(row) = vehicle.row.checked_sub(distance) else {
            break;
        };
        if grid.get(row, vehicle.col).is_some() || faults.get(row, vehicle.col).is_some() {
            return (distance as f32 / 2.0).clamp(0.0, SCORE_MAX);
        }
    }
    SCORE_MAX
}

/// Rewards raw speed and an open lane in equal measure.
pub fn efficiency_score(vehicle: &SimVehicle, grid: &SimGrid, faults: &FaultField) -> f32 {
    let mut clear = 0;
    for distance in 1..=CLEAR_PATH_MAX {
        let Some(row) = vehicle.row.checked_sub(distance) else {
            break;
        };
        if grid.get(row, vehicle.col).is_some() || faults.get(row, vehicle.col).is_some() {
            break;
        }
        clear += 1;
    }
    ((vehicle.speed / 3.0) * 5.0 + (clear as f32 / CLEAR_PATH_MAX as f32) * 5.0).min(SCORE_MAX)
}

/// Penalizes hard acceleration and yaw away from straight-ahead.
pub fn comfort_score(vehicle: &SimVehicle) -> f32 {
    let acceleration_term = SCORE_MAX - vehicle.acceleration.abs() * 5.0;
    let yaw_term = SCORE_MAX - vehicle.yaw.abs();
    ((acceleration_term + yaw_term) / 2.0).clamp(0.0, SCORE_MAX)
}

/// Weighted composite of the three sub-scores.
pub fn happiness(
    vehicle: &SimVehicle,
    grid: &SimGrid,
    faults: &FaultField,
    config: &SimConfig,
) -> f32 {
    safety_score(vehicle, grid, faults) * config.safety_weight
        + efficiency_score(vehicle, grid, faults) * config.efficiency_weight
        + comfort_score(vehicle) * config.comfort_weight
}

/// First vehicle attaining the maximum score wins; `None` for no vehicles.
pub fn select_ego(scores: &[(VehicleId, f32)]) -> Option<VehicleId> {
    let mut best: Option<(VehicleId, OrderedFloat<f32>)> = None;
    for &(id, score) in scores {
        let score = OrderedFloat(score);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((id, score)),
        }
    }
    best.map(|(id, _)| id)
}
