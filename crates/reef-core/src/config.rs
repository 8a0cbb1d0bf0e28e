//! Configuration types for the simulation.

use serde::{Deserialize, Serialize};

/// World configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Random seed for reproducibility. `None` seeds from entropy, making
    /// runs non-reproducible.
    pub seed: Option<u64>,
    /// Environment physics tunables
    pub physics: PhysicsConfig,
}

impl WorldConfig {
    pub fn new(width: i32, height: i32, seed: Option<u64>) -> Self {
        Self {
            width,
            height,
            seed,
            physics: PhysicsConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            seed: None,
            physics: PhysicsConfig::default(),
        }
    }
}

/// Environment physics tunables (lava thermodynamics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Temperature assigned to fresh lava and assumed for lava with an
    /// unset temperature.
    pub lava_initial_temp: f32,
    /// Temperature lost by a lava cell per step.
    pub lava_cooling_rate: f32,
    /// Temperature drop between a lava cell and the lava it spreads.
    pub lava_spread_drop: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            lava_initial_temp: 100.0,
            lava_cooling_rate: 5.0,
            lava_spread_drop: 10.0,
        }
    }
}
