//! Error types for the simulation.
//!
//! The fallible surface is narrow by design: only engine construction
//! validates its inputs. Everything else reports failure through boolean or
//! optional results, or silently filters out-of-bounds candidates.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid world dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
