//! Environment rule pass: sand gravity and lava cooling/spread.
//!
//! The pass reads the prior generation and writes into the new-generation
//! buffer, which starts as a copy of the prior generation.

use crate::grid::Grid;
use reef_core::{Cell, PhysicsConfig, Position};

/// Apply one environment transition from `old` into `new`.
pub(crate) fn update_environment(old: &Grid, new: &mut Grid, physics: &PhysicsConfig) {
    settle_sand(old, new);
    cool_and_spread_lava(old, new, physics);
}

/// Sand gravity, scanned from the second-to-last row upward so every row is
/// examined only after all rows below it have been resolved. A sand cell
/// moves at most one row per step: straight down, then down-left, then
/// down-right, first water destination wins.
fn settle_sand(old: &Grid, new: &mut Grid) {
    for y in (0..old.height - 1).rev() {
        for x in 0..old.width {
            let pos = Position::new(x, y);
            if *old.get(pos) != Cell::Sand {
                continue;
            }

            let candidates = [pos.below(), pos.add(-1, 1), pos.add(1, 1)];
            for target in candidates {
                if old.contains(target) && old.get(target).is_water() {
                    new.set(pos, Cell::Water);
                    new.set(target, Cell::Sand);
                    break;
                }
            }
        }
    }
}

/// Lava cooling and spread, scanned top to bottom. Only lava present in the
/// prior generation cools or spreads; lava written by this pass sits inert
/// until the next step, which keeps an eruption from flooding the grid in a
/// single step.
fn cool_and_spread_lava(old: &Grid, new: &mut Grid, physics: &PhysicsConfig) {
    for y in 0..old.height {
        for x in 0..old.width {
            let pos = Position::new(x, y);
            let temp = match old.get(pos) {
                Cell::Lava { temp } => temp.unwrap_or(physics.lava_initial_temp),
                _ => continue,
            };

            let cooled = temp - physics.lava_cooling_rate;
            if cooled <= 0.0 {
                new.set(pos, Cell::Rock);
                continue;
            }

            new.set(pos, Cell::Lava { temp: Some(cooled) });
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let neighbor = pos.add(dx, dy);
                if old.contains(neighbor) && old.get(neighbor).is_water() {
                    new.set(
                        neighbor,
                        Cell::Lava {
                            temp: Some(cooled - physics.lava_spread_drop),
                        },
                    );
                }
            }
        }
    }
}
