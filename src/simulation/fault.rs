//! Hazard layer and weather generation
//!
//! The fault field shares the grid's coordinate space but is fully
//! independent of occupancy. Generation places at most one new hazard per
//! tick, always ahead of the traffic.

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use super::config::SimConfig;
use super::environment::EventLog;
use super::types::{FaultKind, WeatherState};
use super::vehicle::SimVehicle;

/// Hard ceiling on simultaneous potholes
pub const MAX_POTHOLES: usize = 3;

/// Chance that a placement attempt during rain produces a rain hazard
pub const RAIN_FAULT_CHANCE: f64 = 0.3;

/// Chance that a placed rain hazard also wets each adjacent lane
pub const RAIN_SPREAD_CHANCE: f64 = 0.5;

/// New hazards land this many rows ahead of the foremost position
pub const FAULT_OFFSET_MIN: usize = 6;
pub const FAULT_OFFSET_MAX: usize = 12;

/// Sparse hazard layer over the grid's coordinate space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultField {
    rows: usize,
    cols: usize,
    cells: Vec<Option<FaultKind>>,
}

impl FaultField {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// The hazard in a cell, if any; out-of-bounds reads are `None`.
    pub fn get(&self, row: usize, col: usize) -> Option<FaultKind> {
        if !self.in_bounds(row, col) {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    /// Place a hazard directly, e.g. for a hand-authored layout.
    /// Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, kind: FaultKind) {
        if self.in_bounds(row, col) {
            self.cells[row * self.cols + col] = Some(kind);
        }
    }

    pub fn clear_cell(&mut self, row: usize, col: usize) {
        if self.in_bounds(row, col) {
            self.cells[row * self.cols + col] = None;
        }
    }

    pub fn count_of(&self, kind: FaultKind) -> usize {
        self.cells.iter().filter(|cell| **cell == Some(kind)).count()
    }

    /// Remove every rain cell; returns how many were cleared.
    pub fn clear_rain(&mut self) -> usize {
        let mut cleared = 0;
        for cell in &mut self.cells {
            if *cell == Some(FaultKind::Rain) {
                *cell = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// One tick of weather and hazard generation.
    ///
    /// Transitions the weather, then scans vehicles in collection order and
    /// places at most one new hazard ahead of the pack, then enforces the
    /// pothole cap.
    pub fn generate(
        &mut self,
        weather: &mut WeatherState,
        vehicles: &[SimVehicle],
        config: &SimConfig,
        rng: &mut StdRng,
        tick: u64,
        events: &mut EventLog,
    ) {
        if !weather.is_raining {
            if config.weather_change_chance > 0
                && rng.random_range(0..100) < config.weather_change_chance
            {
                weather.is_raining = true;
                weather.frames_remaining = config.rain_duration;
                events.push(tick, format!("rain starts for {} ticks", config.rain_duration));
            }
        } else {
            weather.frames_remaining = weather.frames_remaining.saturating_sub(1);
            if weather.frames_remaining == 0 {
                weather.is_raining = false;
                let dried = self.clear_rain();
                events.push(tick, format!("rain stops, {dried} wet cells dried"));
            }
        }

        if let Some(foremost) = vehicles.iter().map(|v| v.row).min() {
            for vehicle in vehicles {
                // Offsets are measured from the more advanced of the pack
                // leader and the scanned vehicle; rows shrink going forward.
                let base = foremost.min(vehicle.row);
                let offset = rng.random_range(FAULT_OFFSET_MIN..=FAULT_OFFSET_MAX);
                if offset > base {
                    continue;
                }
                let row = base - offset;
                let col = rng.random_range(0..self.cols);
                if self.get(row, col).is_some() {
                    continue;
                }
                if weather.is_raining {
                    if rng.random_bool(RAIN_FAULT_CHANCE) {
                        self.set(row, col, FaultKind::Rain);
                        events.push(tick, format!("rain pools at ({row}, {col})"));
                        self.spread_rain(row, col, rng, tick, events);
                        break;
                    }
                } else if rng.random_bool(f64::from(config.pothole_chance) / 300.0) {
                    self.set(row, col, FaultKind::Pothole);
                    events.push(tick, format!("pothole opens at ({row}, {col})"));
                    break;
                }
            }
        }

        self.enforce_pothole_cap(tick, events);
    }

    /// Wet each horizontally adjacent lane at the same row with independent
    /// 50% draws; occupied fault cells are left alone.
    fn spread_rain(
        &mut self,
        row: usize,
        col: usize,
        rng: &mut StdRng,
        tick: u64,
        events: &mut EventLog,
    ) {
        for side in [-1isize, 1] {
            let Some(neighbor) = col.checked_add_signed(side) else {
                continue;
            };
            if neighbor >= self.cols || self.get(row, neighbor).is_some() {
                continue;
            }
            if rng.random_bool(RAIN_SPREAD_CHANCE) {
                self.set(row, neighbor, FaultKind::Rain);
                events.push(tick, format!("rain spreads to ({row}, {neighbor})"));
            }
        }
    }

    /// Drop rearmost potholes until at most `MAX_POTHOLES` remain.
    fn enforce_pothole_cap(&mut self, tick: u64, events: &mut EventLog) {
        let mut excess = self.count_of(FaultKind::Pothole).saturating_sub(MAX_POTHOLES);
        if excess == 0 {
            return;
        }
        debug!("pothole cap exceeded by {excess}, repairing from the rear");
        'rows: for row in (0..self.rows).rev() {
            for col in 0..self.cols {
                if self.get(row, col) == Some(FaultKind::Pothole) {
                    self.clear_cell(row, col);
                    events.push(tick, format!("pothole at ({row}, {col}) repaired"));
                    excess -= 1;
                    if excess == 0 {
                        break 'rows;
                    }
                }
            }
        }
    }
}
