//! Core types for the reef cellular-automaton workspace.

pub mod config;
pub mod error;
pub mod species;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use species::*;
pub use types::*;
