//! Center-bias masks used to pull generated landmass away from the map edges.
//!
//! The rolling particle mask simulates many short random walks: each walk
//! deposits one visit per step and prefers to roll onto neighbors that have
//! accumulated no more than the current cell, so material spreads outward
//! from the start points like sand poured onto a table. Start points are
//! drawn from an inset sub-rectangle, which concentrates deposits near the
//! middle of the map.
//!
//! The edge gradient is the cheap deterministic substitute with the same
//! contract: peaked in the middle, zero along the borders.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::grid::Grid;

/// Horizontal inset for walk start points, as a fraction of width.
const START_MARGIN_X: f64 = 0.1;
/// Vertical inset for walk start points, as a fraction of height.
const START_MARGIN_Y: f64 = 0.2;

/// Build a rolling particle mask from `iterations` walks of up to `life`
/// steps each. The result is normalized by its maximum, so the most visited
/// cell is exactly 1.0; an all-zero accumulator (zero iterations) stays zero.
pub fn rolling_mask(
    rng: &mut ChaCha8Rng,
    width: usize,
    height: usize,
    iterations: usize,
    life: usize,
) -> Grid<f32> {
    let mut acc = Grid::new_with(width, height, 0.0f32);

    let margin_x = (width as f64 * START_MARGIN_X) as usize;
    let margin_y = (height as f64 * START_MARGIN_Y) as usize;
    let x_range = margin_x..(width - margin_x).max(margin_x + 1);
    let y_range = margin_y..(height - margin_y).max(margin_y + 1);

    for _ in 0..iterations {
        let x = rng.gen_range(x_range.clone());
        let y = rng.gen_range(y_range.clone());
        let mut pos = acc.index(x, y);

        for _ in 0..life {
            match roll_step(rng, &mut acc, pos) {
                Some(next) => pos = next,
                None => break,
            }
        }
    }

    acc.normalized_by_max()
}

/// One step of a walk: deposit at the current cell, then roll onto a
/// uniformly chosen 4-neighbor whose accumulated value does not exceed the
/// current cell's. Returns `None` when every neighbor is higher (the walk
/// has nowhere downhill-or-level to go).
fn roll_step(rng: &mut ChaCha8Rng, acc: &mut Grid<f32>, pos: usize) -> Option<usize> {
    let level = acc.get(pos) + 1.0;
    acc.set(pos, level);

    let mut candidates = [0usize; 4];
    let mut count = 0;
    for n in acc.neighbors4(pos) {
        if *acc.get(n) <= level {
            candidates[count] = n;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(candidates[rng.gen_range(0..count)])
}

/// Deterministic center-bias mask: `x(1-x) * y(1-y)` in normalized
/// coordinates, rescaled so the center is 1.0. Border cells are exactly zero.
pub fn edge_gradient(width: usize, height: usize) -> Grid<f32> {
    let mut grid = Grid::new_with(width, height, 0.0f32);
    for i in 0..grid.len() {
        let (x, y) = grid.coords(i);
        let nx = if width > 1 {
            x as f32 / (width - 1) as f32
        } else {
            0.5
        };
        let ny = if height > 1 {
            y as f32 / (height - 1) as f32
        } else {
            0.5
        };
        grid.set(i, nx * (1.0 - nx) * ny * (1.0 - ny));
    }
    grid.normalized_by_max()
}
