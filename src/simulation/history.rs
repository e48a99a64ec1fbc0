//! Snapshot history for single-step rewind
//!
//! Snapshots are plain clones of flat, index-based state; there are no
//! pointers to fix up on restore. The stack is depth-capped, dropping the
//! oldest snapshot first.

use std::collections::VecDeque;

use super::environment::EventLog;
use super::fault::FaultField;
use super::grid::SimGrid;
use super::types::{VehicleId, WeatherState};
use super::vehicle::SimVehicle;

/// Deepest rewind supported before old snapshots fall off
pub const MAX_HISTORY: usize = 256;

/// Everything needed to restore the world to a previous tick
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub grid: SimGrid,
    pub faults: FaultField,
    pub weather: WeatherState,
    pub vehicles: Vec<SimVehicle>,
    pub events: EventLog,
    pub tick: u64,
    pub next_vehicle_id: usize,
    pub ego: Option<VehicleId>,
}

/// Linear stack of world snapshots
#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<SimState>,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            capacity,
        }
    }

    /// Store a snapshot, evicting the oldest when full.
    pub fn push(&mut self, state: SimState) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(state);
    }

    /// Take back the most recent snapshot.
    pub fn pop(&mut self) -> Option<SimState> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
