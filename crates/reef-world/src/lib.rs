//! World simulation engine.
//!
//! This crate implements the 2D marine reef cellular automaton: the grid,
//! the environment and agent rule passes, and the [`Simulation`] engine that
//! orchestrates one synchronous, double-buffered transition per step.

pub mod grid;
pub mod simulation;

mod agents;
mod environment;

pub use grid::Grid;
pub use simulation::{PopulationSnapshot, Simulation};
