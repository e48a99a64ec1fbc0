//! Occupancy grid
//!
//! The grid holds non-owning vehicle handles; vehicle data lives in the
//! environment's collection. Every relocation goes through `move_to` so the
//! one-vehicle-per-cell invariant can only fail loudly, never silently.

use super::error::{SimError, SimResult};
use super::types::VehicleId;

/// Fixed-size occupancy table mapping (row, col) to an optional vehicle handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<VehicleId>>,
}

impl SimGrid {
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

    fn index(&self, row: usize, col: usize) -> SimResult<usize> {
        if !self.in_bounds(row, col) {
            return Err(SimError::InvariantViolation(format!(
                "cell ({row}, {col}) is outside the {}x{} grid",
                self.rows, self.cols
            )));
        }
        Ok(row * self.cols + col)
    }

    /// The occupant of a cell, if any. Out-of-bounds reads are `None` so that
    /// scan loops near the grid edges stay simple.
    pub fn get(&self, row: usize, col: usize) -> Option<VehicleId> {
        if !self.in_bounds(row, col) {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    pub fn is_free(&self, row: usize, col: usize) -> bool {
        self.in_bounds(row, col) && self.cells[row * self.cols + col].is_none()
    }

    /// Put a vehicle into an empty cell.
    pub fn place(&mut self, id: VehicleId, row: usize, col: usize) -> SimResult<()> {
        let index = self.index(row, col)?;
        if let Some(occupant) = self.cells[index] {
            return Err(SimError::InvariantViolation(format!(
                "cannot place {id} at ({row}, {col}): already held by {occupant}"
            )));
        }
        self.cells[index] = Some(id);
        Ok(())
    }

    /// Empty a cell, checking that it actually holds the given vehicle.
    pub fn clear(&mut self, id: VehicleId, row: usize, col: usize) -> SimResult<()> {
        let index = self.index(row, col)?;
        match self.cells[index] {
            Some(occupant) if occupant == id => {
                self.cells[index] = None;
                Ok(())
            }
            Some(occupant) => Err(SimError::InvariantViolation(format!(
                "cannot clear ({row}, {col}) for {id}: held by {occupant}"
            ))),
            None => Err(SimError::InvariantViolation(format!(
                "cannot clear ({row}, {col}) for {id}: cell is empty"
            ))),
        }
    }

    /// The only sanctioned way to relocate a vehicle: clear+place, atomically.
    /// The destination is checked before the source is touched, so a failed
    /// move leaves the grid unchanged.
    pub fn move_to(
        &mut self,
        id: VehicleId,
        from: (usize, usize),
        to: (usize, usize),
    ) -> SimResult<()> {
        let to_index = self.index(to.0, to.1)?;
        if let Some(occupant) = self.cells[to_index] {
            return Err(SimError::InvariantViolation(format!(
                "cannot move {id} to ({}, {}): already held by {occupant}",
                to.0, to.1
            )));
        }
        self.clear(id, from.0, from.1)?;
        self.cells[to_index] = Some(id);
        Ok(())
    }

    /// Count of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}
