//! Simulation engine: owns the grid generations, the organism-id allocator,
//! and the ambient current, and advances the world one synchronous step at a
//! time.

use crate::agents;
use crate::environment;
use crate::grid::Grid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reef_core::{
    AgentCell, Cell, Current, Error, OrganismId, OrganismIdAllocator, Position, Result, Species,
    Substance, Subtype, WorldConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Per-step population tally: live cell count and distinct organism count,
/// per species. Every species is present, at zero when absent from the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub cells: HashMap<Species, u32>,
    pub organisms: HashMap<Species, u32>,
}

impl PopulationSnapshot {
    pub fn total_cells(&self) -> u32 {
        self.cells.values().sum()
    }

    pub fn total_organisms(&self) -> u32 {
        self.organisms.values().sum()
    }
}

pub struct Simulation {
    config: WorldConfig,
    grid: Grid,
    current: Current,
    ids: OrganismIdAllocator,
    rng: ChaCha8Rng,
    tick: u64,
    history: Vec<PopulationSnapshot>,
}

impl Simulation {
    /// Create an engine for the given configuration. With a seed, every
    /// randomized decision is reproducible bit-for-bit across runs with the
    /// same call sequence.
    pub fn new(config: WorldConfig) -> Result<Self> {
        if config.width < 1 || config.height < 1 {
            return Err(Error::InvalidDimensions {
                width: config.width,
                height: config.height,
            });
        }
        if config.physics.lava_cooling_rate <= 0.0 {
            return Err(Error::InvalidConfig(
                "lava cooling rate must be positive".to_string(),
            ));
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            grid: Grid::from_config(&config),
            config,
            current: Current::still(),
            ids: OrganismIdAllocator::new(),
            rng,
            tick: 0,
            history: Vec::new(),
        })
    }

    /// Place a two-cell seed of `species` at `(x, y)`: a root, plus a stem
    /// directly above when that cell is water. Fails without side effects if
    /// the position is out of bounds or the substrate below is incompatible.
    pub fn plant_seed(&mut self, x: i32, y: i32, species: Species) -> bool {
        let pos = Position::new(x, y);
        if !self.grid.contains(pos) {
            return false;
        }

        let below = pos.below();
        let substrate = if self.grid.contains(below) {
            self.grid.get(below).substance()
        } else {
            Some(Substance::Water)
        };
        if !substrate.is_some_and(|s| species.can_attach(s)) {
            return false;
        }

        let params = species.params();
        let organism = self.ids.allocate();
        self.grid.set(
            pos,
            Cell::Agent(AgentCell {
                species,
                subtype: Subtype::Root,
                nutrient: params.initial_nutrient,
                age: 0,
                organism,
                spore_age: 0,
            }),
        );

        let above = pos.above();
        if self.grid.contains(above) && self.grid.get(above).is_water() {
            self.grid.set(
                above,
                Cell::Agent(AgentCell {
                    species,
                    subtype: Subtype::Stem,
                    nutrient: params.initial_nutrient / 2.0,
                    age: 0,
                    organism,
                    spore_age: 0,
                }),
            );
        }

        info!(
            species = species.name(),
            x,
            y,
            organism = organism.0,
            "seed planted"
        );
        true
    }

    /// Overwrite the ambient current vector. Values outside the documented
    /// ranges are not validated.
    pub fn set_current(&mut self, dx: i32, dy: i32, strength: f32) {
        self.current = Current::new(dx, dy, strength);
    }

    /// Underwater eruption centered at `(x, y)`: `intensity` randomly chosen
    /// cells within the square of half-width `radius` become lava at the
    /// initial temperature, destroying whatever occupied them. Draws landing
    /// outside the grid are discarded.
    pub fn erupt_volcano(&mut self, x: i32, y: i32, intensity: u32, radius: i32) {
        for _ in 0..intensity {
            let target = Position::new(
                x + self.rng.gen_range(-radius..=radius),
                y + self.rng.gen_range(-radius..=radius),
            );
            if self.grid.contains(target) {
                self.grid.set(
                    target,
                    Cell::Lava {
                        temp: Some(self.config.physics.lava_initial_temp),
                    },
                );
            }
        }
        info!(x, y, intensity, radius, "volcanic eruption");
    }

    /// Overwrite every cell in the rectangle spanned by the two corners with
    /// the given substance. Corners are auto-ordered and clamped to the grid.
    pub fn paint_area(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, substance: Substance) {
        let x_lo = x1.min(x2).max(0);
        let x_hi = x1.max(x2).min(self.grid.width - 1);
        let y_lo = y1.min(y2).max(0);
        let y_hi = y1.max(y2).min(self.grid.height - 1);

        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                self.grid
                    .set(Position::new(x, y), Cell::from_substance(substance));
            }
        }
    }

    /// Advance the world one step: environment pass, agent pass, buffer
    /// swap, population tally. The swap happens only after both passes
    /// complete, so the prior state stays intact until the transition is
    /// whole.
    pub fn step(&mut self) {
        let mut next = self.grid.clone();
        environment::update_environment(&self.grid, &mut next, &self.config.physics);
        let survivors = agents::update_agents(
            &self.grid,
            &mut next,
            self.current,
            &mut self.ids,
            &mut self.rng,
        );

        self.grid = next;
        let snapshot = self.tally();
        debug!(
            tick = self.tick,
            cells = snapshot.total_cells(),
            organisms = snapshot.total_organisms(),
            surviving = survivors.values().map(HashSet::len).sum::<usize>(),
            "step complete"
        );
        self.history.push(snapshot);
        self.tick += 1;
    }

    /// Run the simulation for the given number of steps, logging population
    /// snapshots periodically.
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
            if self.tick % 100 == 0 {
                if let Some(snapshot) = self.latest_counts() {
                    info!(
                        tick = self.tick,
                        cells = snapshot.total_cells(),
                        organisms = snapshot.total_organisms(),
                        "population snapshot"
                    );
                }
            }
        }
    }

    /// The most recent population snapshot, or `None` before the first step.
    pub fn latest_counts(&self) -> Option<&PopulationSnapshot> {
        self.history.last()
    }

    /// Full per-step population history since construction.
    pub fn history(&self) -> &[PopulationSnapshot] {
        &self.history
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    /// Number of steps taken so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn current(&self) -> Current {
        self.current
    }

    /// Scan the grid and count live cells and distinct organisms per species.
    fn tally(&self) -> PopulationSnapshot {
        let mut cells: HashMap<Species, u32> =
            Species::ALL.iter().map(|&s| (s, 0)).collect();
        let mut organisms: HashMap<Species, HashSet<OrganismId>> =
            Species::ALL.iter().map(|&s| (s, HashSet::new())).collect();

        for (_, cell) in self.grid.iter() {
            if let Some(agent) = cell.agent() {
                *cells.entry(agent.species).or_default() += 1;
                organisms
                    .entry(agent.species)
                    .or_default()
                    .insert(agent.organism);
            }
        }

        PopulationSnapshot {
            cells,
            organisms: organisms
                .into_iter()
                .map(|(species, ids)| (species, ids.len() as u32))
                .collect(),
        }
    }
}
