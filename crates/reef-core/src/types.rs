//! Core type definitions for the simulation.

use crate::species::Species;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an organism.
///
/// Ids are allocated monotonically by the engine. Every cell of an organism
/// shares the organism's id; growth extends an organism without allocating,
/// while planted seeds and spawned spores each receive a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(pub u64);

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator for [`OrganismId`]s, owned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismIdAllocator {
    next: u64,
}

impl OrganismIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> OrganismId {
        let id = OrganismId(self.next);
        self.next += 1;
        id
    }
}

impl Default for OrganismIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 2D position in the grid. The origin is the top-left corner and `y`
/// increases downward, so "below" a cell means `y + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The cell directly below, i.e. the substrate position.
    pub fn below(&self) -> Self {
        self.add(0, 1)
    }

    /// The cell directly above.
    pub fn above(&self) -> Self {
        self.add(0, -1)
    }
}

/// Environment substances a cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Substance {
    Water,
    Sand,
    Rock,
    CoralRock,
    Lava,
}

/// Developmental stage of an agent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subtype {
    Unspecialized,
    /// Holdfast attached to a substrate, absorbing substrate nutrient.
    Root,
    /// Photosynthetic part.
    Stem,
    /// Sporulating/spawning cell.
    Reproductive,
    /// Free-floating dispersal stage.
    Spore,
}

/// State of one living plant fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentCell {
    pub species: Species,
    pub subtype: Subtype,
    /// Internal nutrient store.
    pub nutrient: f32,
    /// Age in steps.
    pub age: u32,
    pub organism: OrganismId,
    /// Steps spent floating; meaningful only while `subtype` is `Spore`.
    pub spore_age: u32,
}

/// A single grid cell: either an environment substance or a living agent
/// fragment, never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Water,
    Sand,
    Rock,
    CoralRock,
    /// Molten rock. `temp` of `None` means the temperature has not been set
    /// yet and is treated as the configured initial temperature on the first
    /// cooling step.
    Lava { temp: Option<f32> },
    Agent(AgentCell),
}

impl Cell {
    /// Build an environment cell from a substance. Lava starts with an unset
    /// temperature.
    pub fn from_substance(substance: Substance) -> Self {
        match substance {
            Substance::Water => Cell::Water,
            Substance::Sand => Cell::Sand,
            Substance::Rock => Cell::Rock,
            Substance::CoralRock => Cell::CoralRock,
            Substance::Lava => Cell::Lava { temp: None },
        }
    }

    /// The substance of an environment cell, or `None` for agents.
    pub fn substance(&self) -> Option<Substance> {
        match self {
            Cell::Water => Some(Substance::Water),
            Cell::Sand => Some(Substance::Sand),
            Cell::Rock => Some(Substance::Rock),
            Cell::CoralRock => Some(Substance::CoralRock),
            Cell::Lava { .. } => Some(Substance::Lava),
            Cell::Agent(_) => None,
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Cell::Water)
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, Cell::Agent(_))
    }

    pub fn agent(&self) -> Option<&AgentCell> {
        match self {
            Cell::Agent(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn agent_mut(&mut self) -> Option<&mut AgentCell> {
        match self {
            Cell::Agent(agent) => Some(agent),
            _ => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Water
    }
}

/// Ambient drift applied probabilistically to unattached spores.
///
/// `dx` and `dy` are expected in `{-1, 0, 1}` and `strength` in `[0, 1]`;
/// values outside the documented ranges are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Current {
    pub dx: i32,
    pub dy: i32,
    pub strength: f32,
}

impl Current {
    pub fn new(dx: i32, dy: i32, strength: f32) -> Self {
        Self { dx, dy, strength }
    }

    /// A still ocean: no drift at all.
    pub fn still() -> Self {
        Self {
            dx: 0,
            dy: 0,
            strength: 0.0,
        }
    }
}

impl Default for Current {
    fn default() -> Self {
        Self::still()
    }
}
