//! The simulation environment and its tick scheduler
//!
//! `SimEnvironment` exclusively owns the grid, the fault layer, the vehicle
//! collection, the event log, the history stack, and the RNG. All mutation
//! happens inside `step()` and `rewind()`; everything else is a read.

use std::collections::VecDeque;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::SimConfig;
use super::error::{SimError, SimResult};
use super::fault::FaultField;
use super::grid::SimGrid;
use super::happiness;
use super::history::{HistoryManager, SimState, MAX_HISTORY};
use super::types::{FaultKind, VehicleId, WeatherState};
use super::vehicle::{SimVehicle, VehicleUpdateResult};

/// Event log entries kept before the oldest are dropped
pub const MAX_LOG_ENTRIES: usize = 256;

/// Rows shown by `draw_map`
const VIEW_ROWS: usize = 12;

/// Append-only, bounded log of simulation events, stamped with tick numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, tick: u64, message: String) {
        let line = format!("[tick {tick}] {message}");
        debug!("{line}");
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only snapshot of everything a renderer or caller may inspect
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentView<'a> {
    pub grid: &'a SimGrid,
    pub faults: &'a FaultField,
    pub weather: WeatherState,
    pub vehicles: &'a [SimVehicle],
    pub events: &'a EventLog,
    pub tick: u64,
    pub ego: Option<VehicleId>,
}

/// The simulation world
pub struct SimEnvironment {
    config: SimConfig,
    grid: SimGrid,
    faults: FaultField,
    weather: WeatherState,
    vehicles: Vec<SimVehicle>,
    events: EventLog,
    history: HistoryManager,
    rng: StdRng,
    tick: u64,
    next_vehicle_id: usize,
    ego: Option<VehicleId>,
}

impl SimEnvironment {
    /// Build a validated environment with OS-seeded randomness.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        Self::new_internal(config, StdRng::from_os_rng())
    }

    /// Build a validated environment with a fixed seed for reproducible runs.
    pub fn new_with_seed(config: SimConfig, seed: u64) -> SimResult<Self> {
        Self::new_internal(config, StdRng::seed_from_u64(seed))
    }

    fn new_internal(config: SimConfig, rng: StdRng) -> SimResult<Self> {
        config.validate()?;
        let mut environment = Self {
            grid: SimGrid::new(config.rows, config.cols),
            faults: FaultField::new(config.rows, config.cols),
            weather: WeatherState::default(),
            vehicles: Vec::new(),
            events: EventLog::new(MAX_LOG_ENTRIES),
            history: HistoryManager::new(MAX_HISTORY),
            rng,
            tick: 0,
            next_vehicle_id: 0,
            ego: None,
            config,
        };
        environment.spawn_vehicles()?;
        Ok(environment)
    }

    /// Fill the rear rows lane by lane with the configured number of vehicles.
    fn spawn_vehicles(&mut self) -> SimResult<()> {
        for index in 0..self.config.num_cars_spawn {
            let col = index % self.config.cols;
            let row = self.config.rows - 1 - index / self.config.cols;
            self.add_vehicle(row, col)?;
        }
        Ok(())
    }

    /// Place a new vehicle with randomized attributes at an empty cell.
    pub fn add_vehicle(&mut self, row: usize, col: usize) -> SimResult<VehicleId> {
        let id = VehicleId(self.next_vehicle_id);
        self.grid.place(id, row, col)?;
        self.next_vehicle_id += 1;
        self.vehicles.push(SimVehicle::new(id, row, col, &mut self.rng));
        self.events.push(self.tick, format!("{id} enters at ({row}, {col})"));
        Ok(id)
    }

    /// Advance the simulation by one tick.
    ///
    /// The pre-tick state is snapshotted first, so a following `rewind()`
    /// undoes exactly this tick.
    pub fn step(&mut self) -> SimResult<EnvironmentView<'_>> {
        self.history.push(self.capture_state());
        self.tick += 1;

        self.faults.generate(
            &mut self.weather,
            &self.vehicles,
            &self.config,
            &mut self.rng,
            self.tick,
            &mut self.events,
        );
        self.update_vehicles()?;
        self.cull_stragglers()?;
        self.evaluate_ego();

        Ok(self.view())
    }

    /// Restore the most recent snapshot, undoing one tick.
    pub fn rewind(&mut self) -> SimResult<EnvironmentView<'_>> {
        let state = self.history.pop().ok_or(SimError::EmptyHistory)?;
        self.restore_state(state);
        info!("rewound to tick {}", self.tick);
        Ok(self.view())
    }

    /// Update every vehicle, rearmost first.
    ///
    /// Descending row order means a follower reads its leader's pre-move
    /// position and holds conservatively; every move re-checks the live grid,
    /// so two vehicles can never land in one cell.
    fn update_vehicles(&mut self) -> SimResult<()> {
        let mut order: Vec<(usize, VehicleId)> =
            self.vehicles.iter().map(|v| (v.row, v.id)).collect();
        order.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, id) in order {
            let Some(index) = self.vehicles.iter().position(|v| v.id == id) else {
                continue;
            };
            let mut vehicle = self.vehicles.remove(index);
            let result = vehicle.update(
                &mut self.grid,
                &self.faults,
                &self.vehicles,
                &self.weather,
                &self.config,
                &mut self.rng,
                self.tick,
                &mut self.events,
            );
            match result {
                Ok(VehicleUpdateResult::Continue) => {
                    self.vehicles.insert(index, vehicle);
                }
                Ok(VehicleUpdateResult::Exited) => {
                    self.events
                        .push(self.tick, format!("{} leaves the grid", vehicle.id));
                }
                Err(error) => {
                    // Put the vehicle back so the broken world stays
                    // inspectable, then propagate.
                    self.vehicles.insert(index, vehicle);
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Remove vehicles that have fallen too far behind the pack leader.
    fn cull_stragglers(&mut self) -> SimResult<()> {
        let Some(foremost) = self.vehicles.iter().map(|v| v.row).min() else {
            return Ok(());
        };
        let limit = foremost + self.config.max_vehicle_distance;
        let stragglers: Vec<(VehicleId, usize, usize)> = self
            .vehicles
            .iter()
            .filter(|v| v.row > limit)
            .map(|v| (v.id, v.row, v.col))
            .collect();
        for (id, row, col) in stragglers {
            self.grid.clear(id, row, col)?;
            self.vehicles.retain(|v| v.id != id);
            self.events
                .push(self.tick, format!("{id} falls too far behind and is removed"));
        }
        Ok(())
    }

    /// Score every vehicle, record the scores, and pick the ego.
    pub fn evaluate_ego(&mut self) -> Option<VehicleId> {
        let scores: Vec<(VehicleId, f32)> = self
            .vehicles
            .iter()
            .map(|v| (v.id, happiness::happiness(v, &self.grid, &self.faults, &self.config)))
            .collect();
        for (vehicle, &(_, score)) in self.vehicles.iter_mut().zip(&scores) {
            vehicle.push_happiness(score);
        }
        self.ego = happiness::select_ego(&scores);
        self.ego
    }

    fn capture_state(&self) -> SimState {
        SimState {
            grid: self.grid.clone(),
            faults: self.faults.clone(),
            weather: self.weather,
            vehicles: self.vehicles.clone(),
            events: self.events.clone(),
            tick: self.tick,
            next_vehicle_id: self.next_vehicle_id,
            ego: self.ego,
        }
    }

    fn restore_state(&mut self, state: SimState) {
        self.grid = state.grid;
        self.faults = state.faults;
        self.weather = state.weather;
        self.vehicles = state.vehicles;
        self.events = state.events;
        self.tick = state.tick;
        self.next_vehicle_id = state.next_vehicle_id;
        self.ego = state.ego;
    }

    pub fn view(&self) -> EnvironmentView<'_> {
        EnvironmentView {
            grid: &self.grid,
            faults: &self.faults,
            weather: self.weather,
            vehicles: &self.vehicles,
            events: &self.events,
            tick: self.tick,
            ego: self.ego,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &SimGrid {
        &self.grid
    }

    pub fn faults(&self) -> &FaultField {
        &self.faults
    }

    pub fn weather(&self) -> WeatherState {
        self.weather
    }

    pub fn vehicles(&self) -> &[SimVehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn ego(&self) -> Option<VehicleId> {
        self.ego
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// One-line console summary of the world.
    pub fn print_summary(&self) {
        let weather = if self.weather.is_raining {
            format!("raining ({} ticks left)", self.weather.frames_remaining)
        } else {
            "clear".to_string()
        };
        println!(
            "Tick {}: {} vehicles, weather {}, {} potholes, history depth {}",
            self.tick,
            self.vehicles.len(),
            weather,
            self.faults.count_of(FaultKind::Pothole),
            self.history.len(),
        );
        if let Some(ego) = self.ego.and_then(|id| self.vehicle(id)) {
            println!(
                "  ego: {} at ({}, {}), speed {:.2}, happiness {:.2}",
                ego.id,
                ego.row,
                ego.col,
                ego.speed,
                ego.current_happiness().unwrap_or(0.0),
            );
        }
    }

    /// ASCII window around the pack leader: `E` ego, `V` vehicle,
    /// `O` pothole, `~` rain, `*` ice, `.` empty road.
    pub fn draw_map(&self) {
        let Some(foremost) = self.vehicles.iter().map(|v| v.row).min() else {
            println!("  (no vehicles on the road)");
            return;
        };
        let first = foremost.saturating_sub(2);
        let last = (first + VIEW_ROWS).min(self.config.rows);
        for row in first..last {
            let mut line = String::with_capacity(self.config.cols);
            for col in 0..self.config.cols {
                let cell = if let Some(id) = self.grid.get(row, col) {
                    if Some(id) == self.ego {
                        'E'
                    } else {
                        'V'
                    }
                } else {
                    match self.faults.get(row, col) {
                        Some(FaultKind::Pothole) => 'O',
                        Some(FaultKind::Rain) => '~',
                        Some(FaultKind::Ice) => '*',
                        None => '.',
                    }
                };
                line.push(cell);
            }
            println!("{row:>4} {line}");
        }
    }
}
