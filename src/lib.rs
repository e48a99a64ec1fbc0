//! Lane Simulation Library
//!
//! A discrete-grid, multi-lane traffic simulation with hazard generation,
//! merge planning, happiness scoring, and single-step rewind.

pub mod simulation;
