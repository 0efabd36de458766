//! Landmass segmentation.
//!
//! Cells at or above the land threshold are grouped into 4-connected regions
//! by an iterative flood fill, undersized regions are merged into their
//! nearest large neighbor, and each surviving continent gets a distinct
//! colour from an evenly rotated hue wheel.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::elevation::ElevationTable;
use crate::grid::Grid;

/// Region id for sea cells.
pub const SEA: u32 = 0;
/// Region id for land cells not yet claimed by a flood fill.
pub const UNCLAIMED: u32 = 1;
/// First continent id handed out by segmentation.
pub const FIRST_CONTINENT_ID: u32 = 2;

/// Axis-aligned bounding rectangle in cell coordinates (inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Rect {
    fn empty() -> Self {
        Self {
            min_x: usize::MAX,
            min_y: usize::MAX,
            max_x: 0,
            max_y: 0,
        }
    }

    fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Midpoint of the rectangle (the continent's centroid for merge
    /// distance purposes).
    pub fn center(&self) -> (usize, usize) {
        (
            (self.max_x - self.min_x) / 2 + self.min_x,
            (self.max_y - self.min_y) / 2 + self.min_y,
        )
    }
}

/// A maximal 4-connected land region, after merging.
#[derive(Clone, Debug)]
pub struct Continent {
    pub id: u32,
    pub cells: Vec<usize>,
    pub bounds: Rect,
    pub center: (usize, usize),
    pub color: [u8; 3],
}

impl Continent {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Segmentation output: the per-cell region id field, the continent list,
/// the coast edge mask, and a colour-coded diagnostic field.
#[derive(Clone, Debug)]
pub struct ContinentMap {
    pub regions: Grid<u32>,
    pub continents: Vec<Continent>,
    pub coast: Grid<bool>,
    pub colored: Grid<[u8; 3]>,
    /// Height at or above which a cell counted as land. `None` when the band
    /// table had no land band (degraded result: everything is sea).
    pub land_threshold: Option<f32>,
}

/// Segment the height field into continents.
///
/// The land threshold is the resolved value of the band immediately above
/// the sea band (fixed policy: second band in the sorted table). With fewer
/// than two bands the result degrades to zero continents with every cell
/// sea-coloured.
pub fn segment(
    heights: &Grid<f32>,
    table: &ElevationTable,
    min_continent_size: usize,
    rng: &mut ChaCha8Rng,
) -> ContinentMap {
    let sea_color = table.bands.first().map(|b| b.color).unwrap_or([0, 0, 0]);

    let Some(threshold) = table.land_threshold() else {
        return ContinentMap {
            regions: Grid::new_with(heights.width, heights.height, SEA),
            continents: Vec::new(),
            coast: Grid::new_with(heights.width, heights.height, false),
            colored: Grid::new_with(heights.width, heights.height, sea_color),
            land_threshold: None,
        };
    };

    let land = land_mask(heights, threshold);
    let coast = coast_edges(&land);
    let (mut regions, mut continents) = flood_fill_regions(&land);

    merge_undersized(&mut regions, &mut continents, min_continent_size);
    renumber(&mut regions, &mut continents);
    colorize(&mut continents, rng);

    let mut colored = Grid::new_with(heights.width, heights.height, sea_color);
    for continent in &continents {
        for &i in &continent.cells {
            colored.set(i, continent.color);
        }
    }

    ContinentMap {
        regions,
        continents,
        coast,
        colored,
        land_threshold: Some(threshold),
    }
}

fn land_mask(heights: &Grid<f32>, threshold: f32) -> Grid<bool> {
    let data = heights.as_slice().iter().map(|&h| h >= threshold).collect();
    Grid::from_vec(heights.width, heights.height, data)
}

/// Mark coastline cells: wherever a cell and its right or bottom neighbor
/// disagree about land/sea, the land member of the pair is an edge.
fn coast_edges(land: &Grid<bool>) -> Grid<bool> {
    let mut coast = Grid::new_with(land.width, land.height, false);
    for i in 0..land.len() {
        let (x, y) = land.coords(i);
        let here = *land.get(i);

        if x + 1 < land.width {
            let right = i + 1;
            if here != *land.get(right) {
                coast.set(if here { i } else { right }, true);
            }
        }
        if y + 1 < land.height {
            let below = i + land.width;
            if here != *land.get(below) {
                coast.set(if here { i } else { below }, true);
            }
        }
    }
    coast
}

/// Flood fill every unclaimed land cell into a region, iteratively with an
/// explicit stack. Region ids start at [`FIRST_CONTINENT_ID`].
fn flood_fill_regions(land: &Grid<bool>) -> (Grid<u32>, Vec<Continent>) {
    let data = land
        .as_slice()
        .iter()
        .map(|&is_land| if is_land { UNCLAIMED } else { SEA })
        .collect();
    let mut regions = Grid::from_vec(land.width, land.height, data);

    let mut continents = Vec::new();
    let mut next_id = FIRST_CONTINENT_ID;
    let mut stack: Vec<usize> = Vec::new();

    for start in 0..regions.len() {
        if *regions.get(start) != UNCLAIMED {
            continue;
        }

        let id = next_id;
        next_id += 1;

        let mut cells = Vec::new();
        let mut bounds = Rect::empty();

        regions.set(start, id);
        stack.push(start);

        while let Some(i) = stack.pop() {
            cells.push(i);
            let (x, y) = regions.coords(i);
            bounds.include(x, y);

            for n in regions.neighbors4(i) {
                if *regions.get(n) == UNCLAIMED {
                    regions.set(n, id);
                    stack.push(n);
                }
            }
        }

        let center = bounds.center();
        continents.push(Continent {
            id,
            cells,
            bounds,
            center,
            color: [0, 0, 0],
        });
    }

    (regions, continents)
}

/// Centroid distance used to pick a merge target. Deliberately the product
/// of the absolute coordinate deltas, not a Euclidean or Manhattan distance;
/// a centroid aligned on either axis yields zero.
fn merge_metric(a: (usize, usize), b: (usize, usize)) -> u64 {
    let dx = (a.0 as i64 - b.0 as i64).unsigned_abs();
    let dy = (a.1 as i64 - b.1 as i64).unsigned_abs();
    dx * dy
}

/// Merge every continent smaller than `min_size` into the closest surviving
/// continent by the merge metric. Preferred targets are continents at or
/// above the threshold; when none exists, undersized regions collapse into
/// the largest remaining one, leaving at most a single undersized continent.
fn merge_undersized(regions: &mut Grid<u32>, continents: &mut Vec<Continent>, min_size: usize) {
    loop {
        if continents.len() < 2 {
            return;
        }
        let Some(small_idx) = continents.iter().position(|c| c.size() < min_size) else {
            return;
        };

        let small_center = continents[small_idx].center;
        let has_large = continents
            .iter()
            .enumerate()
            .any(|(i, c)| i != small_idx && c.size() >= min_size);

        let target_idx = if has_large {
            continents
                .iter()
                .enumerate()
                .filter(|&(i, c)| i != small_idx && c.size() >= min_size)
                .min_by_key(|&(_, c)| merge_metric(small_center, c.center))
                .map(|(i, _)| i)
        } else {
            // No qualifying target: fold into the largest remnant so that at
            // most one undersized continent survives.
            continents
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != small_idx)
                .max_by_key(|&(_, c)| c.size())
                .map(|(i, _)| i)
        };

        let Some(target_idx) = target_idx else {
            return;
        };

        let small = continents.remove(small_idx);
        let target_idx = if target_idx > small_idx {
            target_idx - 1
        } else {
            target_idx
        };
        let target = &mut continents[target_idx];
        for &i in &small.cells {
            regions.set(i, target.id);
        }
        target.cells.extend(small.cells);
    }
}

/// Compact surviving continent ids into a dense range starting at
/// [`FIRST_CONTINENT_ID`], rewriting the region field to match.
fn renumber(regions: &mut Grid<u32>, continents: &mut [Continent]) {
    for (offset, continent) in continents.iter_mut().enumerate() {
        let new_id = FIRST_CONTINENT_ID + offset as u32;
        if continent.id != new_id {
            for &i in &continent.cells {
                regions.set(i, new_id);
            }
            continent.id = new_id;
        }
    }
}

/// Assign each continent a distinct colour by rotating hue evenly around the
/// wheel, with saturation and lightness drawn from narrow random bands.
fn colorize(continents: &mut [Continent], rng: &mut ChaCha8Rng) {
    let n = continents.len();
    for (i, continent) in continents.iter_mut().enumerate() {
        let hue = i as f32 / n as f32;
        let saturation = 0.90 + rng.gen::<f32>() * 0.10;
        let lightness = 0.50 + rng.gen::<f32>() * 0.10;
        continent.color = hsl_to_rgb(hue, saturation, lightness);
    }
}

/// HSL to RGB, hue in [0, 1). Standard hexcone conversion.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    if s == 0.0 {
        let grey = (l * 255.0) as u8;
        return [grey, grey, grey];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |mut t: f32| -> u8 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0) as u8
    };

    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}
