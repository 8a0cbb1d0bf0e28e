//! Species catalog: per-species biological parameters.
//!
//! The species set is closed, so the catalog is a `'static` table indexed by
//! the [`Species`] enum rather than a runtime map keyed by integer tags. The
//! rule set is identical for every species; only the parameters differ.

use crate::types::Substance;
use serde::{Deserialize, Serialize};

/// The marine plant species known to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Seaweed,
    Kelp,
    Seagrass,
    Coral,
}

/// Biological parameters for one species. Constructed once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesParams {
    pub name: &'static str,
    /// Substrates a root/holdfast may attach to.
    pub allowed_substrates: &'static [Substance],
    /// Nutrient level at which a cell attempts to grow.
    pub growth_threshold: f32,
    /// Nutrient gained per step by a root on a compatible substrate.
    pub substrate_absorb_rate: f32,
    /// Multiplier on light gained per step by photosynthetic cells.
    pub light_absorb_rate: f32,
    /// Per-step reproduction probability once `repro_age` is reached.
    pub base_repro_prob: f32,
    /// Minimum age before a cell may reproduce.
    pub repro_age: u32,
    /// Cells older than this die.
    pub max_age: u32,
    /// Steps an unattached spore survives before dissolving.
    pub spore_life: u32,
    /// Nutrient endowment of a freshly planted seed.
    pub initial_nutrient: f32,
}

static SEAWEED: SpeciesParams = SpeciesParams {
    name: "Seaweed",
    allowed_substrates: &[Substance::Rock, Substance::CoralRock],
    growth_threshold: 10.0,
    substrate_absorb_rate: 1.0,
    light_absorb_rate: 1.0,
    base_repro_prob: 0.02,
    repro_age: 8,
    max_age: 50,
    spore_life: 15,
    initial_nutrient: 5.0,
};

static KELP: SpeciesParams = SpeciesParams {
    name: "Kelp",
    allowed_substrates: &[Substance::Rock],
    growth_threshold: 12.0,
    substrate_absorb_rate: 1.5,
    light_absorb_rate: 1.2,
    base_repro_prob: 0.015,
    repro_age: 10,
    max_age: 60,
    spore_life: 20,
    initial_nutrient: 6.0,
};

static SEAGRASS: SpeciesParams = SpeciesParams {
    name: "Seagrass",
    allowed_substrates: &[Substance::Sand],
    growth_threshold: 8.0,
    substrate_absorb_rate: 1.2,
    light_absorb_rate: 0.8,
    base_repro_prob: 0.025,
    repro_age: 7,
    max_age: 45,
    spore_life: 12,
    initial_nutrient: 4.0,
};

static CORAL: SpeciesParams = SpeciesParams {
    name: "Coral",
    allowed_substrates: &[Substance::Rock, Substance::CoralRock],
    growth_threshold: 15.0,
    substrate_absorb_rate: 1.0,
    // Relies heavily on light.
    light_absorb_rate: 1.5,
    base_repro_prob: 0.01,
    repro_age: 12,
    max_age: 80,
    spore_life: 25,
    initial_nutrient: 7.0,
};

impl Species {
    pub const ALL: [Species; 4] = [
        Species::Seaweed,
        Species::Kelp,
        Species::Seagrass,
        Species::Coral,
    ];

    /// Parameters for this species.
    pub fn params(self) -> &'static SpeciesParams {
        match self {
            Species::Seaweed => &SEAWEED,
            Species::Kelp => &KELP,
            Species::Seagrass => &SEAGRASS,
            Species::Coral => &CORAL,
        }
    }

    pub fn name(self) -> &'static str {
        self.params().name
    }

    /// Whether a root/holdfast of this species can attach to `substrate`.
    pub fn can_attach(self, substrate: Substance) -> bool {
        self.params().allowed_substrates.contains(&substrate)
    }

    /// Probability of reproducing this step at the given age.
    ///
    /// Age-parameterized for future extension; currently constant above the
    /// minimum reproduction age.
    pub fn reproduction_probability(self, age: u32) -> f32 {
        let params = self.params();
        if age < params.repro_age {
            0.0
        } else {
            params.base_repro_prob
        }
    }
}
