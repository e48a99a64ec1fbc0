//! Vehicle behavior: perception, lane-change planning, and movement
//!
//! Vehicles advance toward row 0 one cell per tick. Each update runs hazard
//! detection, blocked-lane detection, planning, a safety re-check at
//! execution time, and finally forward motion, all against the live grid.

use std::collections::VecDeque;

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use super::config::SimConfig;
use super::environment::EventLog;
use super::error::SimResult;
use super::fault::FaultField;
use super::grid::SimGrid;
use super::types::{
    FaultKind, LaneChangeReason, VehicleId, WeatherState, HAPPINESS_HISTORY_LEN,
    POTHOLE_SPEED_FACTOR, RAIN_SPEED_FACTOR, REACTION_DISPLAY_TICKS, SLIP_CHANCE,
    SLOW_LEADER_GAP_FACTOR,
};

/// How far ahead a merge candidate lane is inspected for traffic
pub const AHEAD_SCAN_DISTANCE: usize = 10;

/// How far behind a merge candidate lane is inspected for faster traffic
pub const BEHIND_SCAN_DISTANCE: usize = 8;

/// Gap requirements shrink to this fraction for the lower-happiness vehicle
const PRIORITY_RELAXATION: f32 = 0.7;

/// A hazard-free lane still counts as unsafe within this many rows of a fault
const HAZARD_CLEARANCE: usize = 3;

/// Per-tick pull of the visual position toward the logical cell
const VISUAL_SMOOTHING: f32 = 0.5;

/// Below this offset the lane-change animation snaps and completes
const LANE_SNAP_EPSILON: f32 = 0.05;

/// Result of a vehicle update indicating what the scheduler should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    /// Vehicle stays in the world
    Continue,
    /// Vehicle drove off the front edge and must be removed
    Exited,
}

/// An agent on the grid
#[derive(Debug, Clone, PartialEq)]
pub struct SimVehicle {
    pub id: VehicleId,
    /// Authoritative position; always mirrored by the grid
    pub row: usize,
    pub col: usize,
    /// Interpolated position for rendering only
    pub visual_row: f32,
    pub visual_col: f32,
    pub speed: f32,
    pub mass: f32,
    pub yaw: f32,
    pub acceleration: f32,
    /// Target lane chosen this tick, consumed by execution
    pub planned_lane_change: Option<usize>,
    /// True while the visual position swings across the lane marking
    pub is_changing_lane: bool,
    /// What the vehicle is currently reacting to, for display
    pub reacting_to: Option<LaneChangeReason>,
    pub reaction_timer: u32,
    pub lane_change_cooldown: u32,
    /// Most recent happiness scores, oldest first
    pub happiness_history: VecDeque<f32>,
}

impl SimVehicle {
    pub fn new(id: VehicleId, row: usize, col: usize, rng: &mut StdRng) -> Self {
        Self {
            id,
            row,
            col,
            visual_row: row as f32,
            visual_col: col as f32,
            speed: rng.random_range(1.0..3.0),
            mass: rng.random_range(1000.0..3000.0),
            yaw: rng.random_range(-5.0..5.0),
            acceleration: rng.random_range(-1.0..1.0),
            planned_lane_change: None,
            is_changing_lane: false,
            reacting_to: None,
            reaction_timer: 0,
            lane_change_cooldown: 0,
            happiness_history: VecDeque::with_capacity(HAPPINESS_HISTORY_LEN),
        }
    }

    /// Record a happiness score, evicting the oldest beyond the window.
    pub fn push_happiness(&mut self, score: f32) {
        if self.happiness_history.len() == HAPPINESS_HISTORY_LEN {
            self.happiness_history.pop_front();
        }
        self.happiness_history.push_back(score);
    }

    /// The most recently recorded happiness score, if any tick has scored yet.
    pub fn current_happiness(&self) -> Option<f32> {
        self.happiness_history.back().copied()
    }

    /// One simulation tick for this vehicle.
    ///
    /// `vehicles` holds every other vehicle; the caller takes this one out of
    /// the collection for the duration of the call.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        grid: &mut SimGrid,
        faults: &FaultField,
        vehicles: &[SimVehicle],
        weather: &WeatherState,
        config: &SimConfig,
        rng: &mut StdRng,
        tick: u64,
        events: &mut EventLog,
    ) -> SimResult<VehicleUpdateResult> {
        if self.lane_change_cooldown > 0 {
            self.lane_change_cooldown -= 1;
        }
        if self.reaction_timer > 0 {
            self.reaction_timer -= 1;
            if self.reaction_timer == 0 {
                self.reacting_to = None;
            }
        }

        if self.is_changing_lane {
            // Hold the row until the swing across the lane marking completes.
            self.step_visuals(config);
            return Ok(VehicleUpdateResult::Continue);
        }

        let mut effective_speed = self.speed;
        let mut slip = 0.0;
        if weather.is_raining {
            effective_speed *= RAIN_SPEED_FACTOR;
            if rng.random_bool(SLIP_CHANCE) {
                slip = rng.random_range(-2.0_f32..2.0);
                self.yaw += slip;
                events.push(tick, format!("{} slips on the wet road", self.id));
            }
        }

        if let Some((kind, distance)) = self.detect_hazard(faults, config) {
            if self.planned_lane_change.is_none() {
                debug!("{} sees a {} {distance} rows out", self.id, kind.label());
                self.plan_lane_change(
                    LaneChangeReason::Fault(kind),
                    grid,
                    faults,
                    vehicles,
                    config,
                    tick,
                    events,
                );
            }
            if self.planned_lane_change.is_none() && kind == FaultKind::Pothole {
                // No way around it: brake over the pothole for this tick.
                effective_speed *= POTHOLE_SPEED_FACTOR;
            }
        }

        if self.planned_lane_change.is_none()
            && self.blocked_by_leader(grid, vehicles, effective_speed, config)
        {
            self.plan_lane_change(
                LaneChangeReason::SlowLeader,
                grid,
                faults,
                vehicles,
                config,
                tick,
                events,
            );
        }

        self.execute_planned_change(grid, faults, vehicles, config, tick, events)?;

        let result = if self.is_changing_lane {
            VehicleUpdateResult::Continue
        } else {
            self.advance(grid)?
        };

        self.step_visuals(config);

        // The slip is transient; the wheel catches again at tick end.
        if slip != 0.0 {
            self.yaw -= slip;
        }

        Ok(result)
    }

    /// Nearest hazard ahead, scanning the current lane first and then, only
    /// for potholes, one cell diagonally into each adjacent lane.
    pub fn detect_hazard(
        &self,
        faults: &FaultField,
        config: &SimConfig,
    ) -> Option<(FaultKind, usize)> {
        for distance in 1..=config.fault_detection_distance {
            let Some(row) = self.row.checked_sub(distance) else {
                break;
            };
            if let Some(kind) = faults.get(row, self.col) {
                return Some((kind, distance));
            }
        }

        // The straight lane is clean; potholes reach partway into
        // neighboring lanes, rain does not.
        let mut nearest: Option<(FaultKind, usize)> = None;
        for side in [-1isize, 1] {
            let Some(col) = self.col.checked_add_signed(side) else {
                continue;
            };
            if col >= faults.cols() {
                continue;
            }
            for distance in 1..=config.fault_detection_distance {
                let Some(row) = self.row.checked_sub(distance) else {
                    break;
                };
                if faults.get(row, col) == Some(FaultKind::Pothole) {
                    if nearest.is_none_or(|(_, best)| distance < best) {
                        nearest = Some((FaultKind::Pothole, distance));
                    }
                    break;
                }
            }
        }
        nearest
    }

    /// Whether the lane ahead forces a merge attempt: any vehicle inside the
    /// safe distance, or a slower one inside the speed-scaled gap.
    fn blocked_by_leader(
        &self,
        grid: &SimGrid,
        vehicles: &[SimVehicle],
        effective_speed: f32,
        config: &SimConfig,
    ) -> bool {
        let slow_gap = (effective_speed * SLOW_LEADER_GAP_FACTOR).ceil() as usize;
        let scan = slow_gap.max(config.safe_distance);
        match self.first_vehicle_ahead(grid, vehicles, self.col, scan) {
            Some((other, distance)) => {
                distance <= config.safe_distance
                    || (distance <= slow_gap && other.speed < effective_speed)
            }
            None => false,
        }
    }

    /// Pick a target lane and commit to it for this tick.
    ///
    /// No-op while cooling down or while a change is already planned or in
    /// progress. Left and right are evaluated independently; when both are
    /// safe the emptier lane wins and ties go left.
    #[allow(clippy::too_many_arguments)]
    fn plan_lane_change(
        &mut self,
        reason: LaneChangeReason,
        grid: &SimGrid,
        faults: &FaultField,
        vehicles: &[SimVehicle],
        config: &SimConfig,
        tick: u64,
        events: &mut EventLog,
    ) {
        if self.lane_change_cooldown > 0 || self.planned_lane_change.is_some() || self.is_changing_lane
        {
            return;
        }

        let left = self
            .col
            .checked_sub(1)
            .filter(|&lane| self.lane_is_safe(lane, grid, faults, vehicles, config));
        let right = Some(self.col + 1)
            .filter(|&lane| lane < grid.cols())
            .filter(|&lane| self.lane_is_safe(lane, grid, faults, vehicles, config));

        let target = match (left, right) {
            (Some(left), Some(right)) => {
                let left_traffic = self.count_vehicles_ahead(grid, left, AHEAD_SCAN_DISTANCE);
                let right_traffic = self.count_vehicles_ahead(grid, right, AHEAD_SCAN_DISTANCE);
                if right_traffic < left_traffic {
                    right
                } else {
                    left
                }
            }
            (Some(left), None) => left,
            (None, Some(right)) => right,
            (None, None) => return,
        };

        self.planned_lane_change = Some(target);
        self.reacting_to = Some(reason);
        self.reaction_timer = REACTION_DISPLAY_TICKS;
        events.push(
            tick,
            format!(
                "{} plans a merge into lane {target} ({})",
                self.id,
                reason.label()
            ),
        );
    }

    /// Re-validate and carry out the planned change. Conditions may have
    /// shifted since planning, so an unsafe plan is simply dropped.
    fn execute_planned_change(
        &mut self,
        grid: &mut SimGrid,
        faults: &FaultField,
        vehicles: &[SimVehicle],
        config: &SimConfig,
        tick: u64,
        events: &mut EventLog,
    ) -> SimResult<()> {
        let Some(target) = self.planned_lane_change.take() else {
            return Ok(());
        };
        if self.lane_is_safe(target, grid, faults, vehicles, config) {
            grid.move_to(self.id, (self.row, self.col), (self.row, target))?;
            self.col = target;
            self.is_changing_lane = true;
            events.push(tick, format!("{} merges into lane {target}", self.id));
        } else {
            debug!("{} abandons the merge into lane {target}", self.id);
            events.push(tick, format!("{} abandons the merge into lane {target}", self.id));
        }
        Ok(())
    }

    /// Four-part merge-safety check for a target lane.
    pub fn lane_is_safe(
        &self,
        target_col: usize,
        grid: &SimGrid,
        faults: &FaultField,
        vehicles: &[SimVehicle],
        config: &SimConfig,
    ) -> bool {
        if target_col >= grid.cols() {
            return false;
        }

        // 1. The merge window beside us must be completely clear.
        let window = config.merge_safe_distance as isize;
        for offset in -window..=window {
            let Some(row) = self.row.checked_add_signed(offset) else {
                continue;
            };
            if grid.get(row, target_col).is_some() {
                return false;
            }
        }

        // 2. Enough room to the next vehicle ahead in the target lane.
        if let Some((other, distance)) =
            self.first_vehicle_ahead(grid, vehicles, target_col, AHEAD_SCAN_DISTANCE)
        {
            let priority = self.has_priority_over(other);
            let required = if other.speed < self.speed {
                let scaled = (5.0 * (self.speed - other.speed)).max(3.0);
                if priority {
                    (scaled * PRIORITY_RELAXATION).max(2.0)
                } else {
                    scaled
                }
            } else if priority {
                2.0
            } else {
                3.0
            };
            if (distance as f32) < required {
                return false;
            }
        }

        // 3. Enough room to a faster vehicle closing in from behind.
        if let Some((other, distance)) =
            self.first_vehicle_behind(grid, vehicles, target_col, BEHIND_SCAN_DISTANCE)
        {
            if other.speed > self.speed {
                let scaled = (4.0 * (other.speed - self.speed)).max(2.0);
                let required = if self.has_priority_over(other) {
                    (scaled * PRIORITY_RELAXATION).max(1.0)
                } else {
                    scaled
                };
                if (distance as f32) < required {
                    return false;
                }
            }
        }

        // 4. Never merge toward a nearer hazard.
        let own_hazard = self.nearest_fault_ahead(faults, self.col, config);
        let target_hazard = self.nearest_fault_ahead(faults, target_col, config);
        match (own_hazard, target_hazard) {
            (Some(own), Some(theirs)) => theirs > own,
            (None, Some(theirs)) => theirs > HAZARD_CLEARANCE,
            _ => true,
        }
    }

    /// Planning priority goes to the less happy vehicle. Before both sides
    /// have a scored tick there is nothing to compare.
    fn has_priority_over(&self, other: &SimVehicle) -> bool {
        match (self.current_happiness(), other.current_happiness()) {
            (Some(own), Some(theirs)) => own < theirs,
            _ => false,
        }
    }

    /// Distance to the nearest fault straight ahead in the given lane.
    fn nearest_fault_ahead(
        &self,
        faults: &FaultField,
        col: usize,
        config: &SimConfig,
    ) -> Option<usize> {
        for distance in 1..=config.fault_detection_distance {
            let Some(row) = self.row.checked_sub(distance) else {
                break;
            };
            if faults.get(row, col).is_some() {
                return Some(distance);
            }
        }
        None
    }

    fn first_vehicle_ahead<'a>(
        &self,
        grid: &SimGrid,
        vehicles: &'a [SimVehicle],
        col: usize,
        max_distance: usize,
    ) -> Option<(&'a SimVehicle, usize)> {
        for distance in 1..=max_distance {
            let Some(row) = self.row.checked_sub(distance) else {
                break;
            };
            if let Some(id) = grid.get(row, col) {
                return vehicles.iter().find(|v| v.id == id).map(|v| (v, distance));
            }
        }
        None
    }

    fn first_vehicle_behind<'a>(
        &self,
        grid: &SimGrid,
        vehicles: &'a [SimVehicle],
        col: usize,
        max_distance: usize,
    ) -> Option<(&'a SimVehicle, usize)> {
        for distance in 1..=max_distance {
            let row = self.row + distance;
            if row >= grid.rows() {
                break;
            }
            if let Some(id) = grid.get(row, col) {
                return vehicles.iter().find(|v| v.id == id).map(|v| (v, distance));
            }
        }
        None
    }

    fn count_vehicles_ahead(&self, grid: &SimGrid, col: usize, max_distance: usize) -> usize {
        (1..=max_distance)
            .filter_map(|distance| self.row.checked_sub(distance))
            .filter(|&row| grid.get(row, col).is_some())
            .count()
    }

    /// Advance one row if the cell ahead is free; off the front edge the
    /// vehicle leaves the world.
    fn advance(&mut self, grid: &mut SimGrid) -> SimResult<VehicleUpdateResult> {
        let Some(next_row) = self.row.checked_sub(1) else {
            grid.clear(self.id, self.row, self.col)?;
            return Ok(VehicleUpdateResult::Exited);
        };
        if grid.is_free(next_row, self.col) {
            grid.move_to(self.id, (self.row, self.col), (next_row, self.col))?;
            self.row = next_row;
        }
        Ok(VehicleUpdateResult::Continue)
    }

    /// Pull the visual position toward the logical cell; completing the lane
    /// swing re-arms the cooldown.
    fn step_visuals(&mut self, config: &SimConfig) {
        self.visual_row += (self.row as f32 - self.visual_row) * VISUAL_SMOOTHING;
        self.visual_col += (self.col as f32 - self.visual_col) * VISUAL_SMOOTHING;
        if self.is_changing_lane && (self.visual_col - self.col as f32).abs() < LANE_SNAP_EPSILON {
            self.visual_col = self.col as f32;
            self.is_changing_lane = false;
            self.lane_change_cooldown = config.lane_change_cooldown;
        }
    }
}
