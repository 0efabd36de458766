//! Erosion and river simulation.
//!
//! Flow accumulation routes one inflow unit per cell into its strictly lower
//! 4-neighbors; shares aimed below the land threshold vanish into the sea.
//! High cells with strong accumulated inflow become river sources, which are
//! pathed to the nearest sea cell by a Dijkstra search whose traversal cost
//! falls with flow strength (water prefers existing drainage). Kept paths
//! carve the height field through a river mask.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Inflow contributed by every cell before splitting between neighbors.
const INFLOW_UNIT: f32 = 1.0;
/// Sources must accumulate more than this multiple of the inflow unit.
const SOURCE_FLOW_FACTOR: f32 = 2.0;
/// Sources must sit above this percentile of the sorted height field.
const SOURCE_HEIGHT_PERCENTILE: f32 = 0.9;
/// Traversal cost floor for land cells (scaled to integer milli-units).
const MIN_LAND_COST: u64 = 50;
/// Traversal cost for cells already below the land threshold.
const SEA_COST: u64 = 10;
/// Cost scale: one unit of `1 - flow` in milli-units.
const COST_SCALE: f32 = 1000.0;

/// Erosion tunables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ErosionParams {
    /// Height subtracted per unit of normalized flow.
    pub factor: f32,
    /// Multiplier applied to the mask value of cells flanking a river
    /// channel; values above 1 widen the carved bed.
    pub widen: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            factor: 0.05,
            widen: 1.2,
        }
    }
}

/// Simulation output.
#[derive(Clone, Debug)]
pub struct RiverOutput {
    /// Eroded height field multiplied by the river mask.
    pub heights: Grid<f32>,
    /// Flow accumulation, normalized by its maximum.
    pub flow: Grid<f32>,
    /// 1.0 away from rivers; carved heights along channels and banks.
    pub river_mask: Grid<f32>,
    /// Kept river paths as ordered grid indices, source first.
    pub rivers: Vec<Vec<usize>>,
}

/// Run flow accumulation, river pathing, and carving over a height field.
pub fn simulate(heights: &Grid<f32>, land_threshold: f32, params: &ErosionParams) -> RiverOutput {
    let flow = accumulate_flow(heights, land_threshold);
    let flow_norm = flow.clone().normalized_by_max();

    let sources = select_sources(heights, &flow, land_threshold);

    let mut rivers = Vec::new();
    for source in sources {
        if let Some(path) = path_to_sea(heights, &flow_norm, land_threshold, source) {
            rivers.push(path);
        }
    }

    let eroded = carve(heights, &flow_norm, params.factor);
    let river_mask = build_river_mask(&eroded, &rivers, params.widen);

    // Widened banks can push the product past 1; keep the field in range.
    let final_data: Vec<f32> = eroded
        .as_slice()
        .iter()
        .zip(river_mask.as_slice())
        .map(|(&h, &m)| (h * m).clamp(0.0, 1.0))
        .collect();

    RiverOutput {
        heights: Grid::from_vec(heights.width, heights.height, final_data),
        flow: flow_norm,
        river_mask,
        rivers,
    }
}

/// Downhill flow accumulation. Each cell splits one inflow unit equally
/// among its strictly lower 4-neighbors; only neighbors still at or above
/// the land threshold receive their share.
pub fn accumulate_flow(heights: &Grid<f32>, land_threshold: f32) -> Grid<f32> {
    let mut flow = Grid::new_with(heights.width, heights.height, 0.0f32);

    let mut lower = [0usize; 4];
    for i in 0..heights.len() {
        let h = *heights.get(i);

        let mut count = 0;
        for n in heights.neighbors4(i) {
            if *heights.get(n) < h {
                lower[count] = n;
                count += 1;
            }
        }
        if count == 0 {
            continue;
        }

        let share = INFLOW_UNIT / count as f32;
        for &n in &lower[..count] {
            if *heights.get(n) >= land_threshold {
                flow.set(n, flow.get(n) + share);
            }
        }
    }

    flow
}

/// River sources: cells above the 90th-percentile height with accumulated
/// flow beyond twice the inflow unit.
fn select_sources(heights: &Grid<f32>, flow: &Grid<f32>, land_threshold: f32) -> Vec<usize> {
    let mut sorted: Vec<f32> = heights.as_slice().to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let cutoff = sorted[((sorted.len() as f32 * SOURCE_HEIGHT_PERCENTILE) as usize)
        .min(sorted.len() - 1)];

    let mut sources = Vec::new();
    for i in 0..heights.len() {
        let h = *heights.get(i);
        if h > cutoff && h >= land_threshold && *flow.get(i) > INFLOW_UNIT * SOURCE_FLOW_FACTOR {
            sources.push(i);
        }
    }
    sources
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct SearchState {
    cost: u64,
    cell: usize,
}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cost of stepping onto a cell: cheap where flow is strong, a fixed low
/// cost below the land threshold (sea cells are reachable goals).
fn step_cost(height: f32, flow_norm: f32, land_threshold: f32) -> u64 {
    if height < land_threshold {
        SEA_COST
    } else {
        (((1.0 - flow_norm) * COST_SCALE) as u64).max(MIN_LAND_COST)
    }
}

/// Dijkstra from a source to the nearest below-threshold cell. The returned
/// path starts at the source and is truncated at the first sea cell; paths
/// without a single land cell are discarded.
fn path_to_sea(
    heights: &Grid<f32>,
    flow_norm: &Grid<f32>,
    land_threshold: f32,
    source: usize,
) -> Option<Vec<usize>> {
    if *heights.get(source) < land_threshold {
        return None;
    }

    let size = heights.len();
    let mut dist = vec![u64::MAX; size];
    let mut prev = vec![usize::MAX; size];
    let mut heap = BinaryHeap::new();

    dist[source] = 0;
    heap.push(SearchState {
        cost: 0,
        cell: source,
    });

    let goal = loop {
        let Some(SearchState { cost, cell }) = heap.pop() else {
            // No reachable sea: this river is dropped.
            return None;
        };
        if cost > dist[cell] {
            continue;
        }
        if *heights.get(cell) < land_threshold {
            break cell;
        }

        for n in heights.neighbors4(cell) {
            let next_cost =
                cost + step_cost(*heights.get(n), *flow_norm.get(n), land_threshold);
            if next_cost < dist[n] {
                dist[n] = next_cost;
                prev[n] = cell;
                heap.push(SearchState {
                    cost: next_cost,
                    cell: n,
                });
            }
        }
    };

    let mut path = Vec::new();
    let mut cell = goal;
    loop {
        path.push(cell);
        if cell == source {
            break;
        }
        cell = prev[cell];
    }
    path.reverse();

    // Truncate at the first below-threshold cell.
    if let Some(cut) = path
        .iter()
        .position(|&i| *heights.get(i) < land_threshold)
    {
        path.truncate(cut + 1);
    }

    let land_cells = path
        .iter()
        .filter(|&&i| *heights.get(i) >= land_threshold)
        .count();
    if land_cells == 0 {
        return None;
    }
    Some(path)
}

/// Subtract `flow * factor` from every cell.
fn carve(heights: &Grid<f32>, flow_norm: &Grid<f32>, factor: f32) -> Grid<f32> {
    let data: Vec<f32> = heights
        .as_slice()
        .iter()
        .zip(flow_norm.as_slice())
        .map(|(&h, &f)| h - f * factor)
        .collect();
    Grid::from_vec(heights.width, heights.height, data)
}

/// Build the river mask: 1.0 everywhere, the eroded height along each kept
/// path, and `height * widen` on each still-unmarked 4-neighbor so the
/// carved channel is wider than a single cell.
fn build_river_mask(eroded: &Grid<f32>, rivers: &[Vec<usize>], widen: f32) -> Grid<f32> {
    let mut mask = Grid::new_with(eroded.width, eroded.height, 1.0f32);
    let mut marked = Grid::new_with(eroded.width, eroded.height, false);

    for path in rivers {
        for &i in path {
            mask.set(i, *eroded.get(i));
            marked.set(i, true);
        }
        for &i in path {
            for n in eroded.neighbors4(i) {
                if !*marked.get(n) {
                    mask.set(n, *eroded.get(n) * widen);
                    marked.set(n, true);
                }
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A west-high, east-low ramp draining into a sea column on the right.
    fn ramp_to_sea() -> Grid<f32> {
        let width = 6;
        let height = 5;
        let mut grid = Grid::new_with(width, height, 0.0f32);
        for y in 0..height {
            for x in 0..width {
                let h = if x == width - 1 {
                    0.05
                } else {
                    1.0 - x as f32 * 0.15
                };
                *grid.at_mut(x, y) = h;
            }
        }
        grid
    }

    #[test]
    fn test_flow_splits_equally_between_lower_neighbors() {
        // A single ridge cell with one lower neighbor on each side; the two
        // valley cells have no outlet of their own.
        let heights = Grid::from_vec(3, 1, vec![0.8, 1.0, 0.7]);
        let flow = accumulate_flow(&heights, 0.0);
        assert_eq!(flow.as_slice(), &[0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_flow_vanishes_into_sea() {
        let heights = Grid::from_vec(3, 1, vec![1.0, 0.5, 0.1]);
        // 0.1 is below the threshold: the middle cell's outflow toward it
        // disappears instead of accumulating.
        let flow = accumulate_flow(&heights, 0.4);
        assert_eq!(*flow.at(2, 0), 0.0);
        assert_eq!(*flow.at(1, 0), 1.0);
    }

    #[test]
    fn test_path_reaches_nearest_sea_and_truncates() {
        let heights = ramp_to_sea();
        let flow_norm = accumulate_flow(&heights, 0.2).normalized_by_max();
        let source = heights.index(0, 2);

        let path = path_to_sea(&heights, &flow_norm, 0.2, source).expect("path must exist");

        assert_eq!(path[0], source);
        let last = *path.last().unwrap();
        assert!(*heights.get(last) < 0.2);
        // Every cell before the endpoint is land.
        for &i in &path[..path.len() - 1] {
            assert!(*heights.get(i) >= 0.2);
        }
    }

    #[test]
    fn test_unreachable_sea_drops_river() {
        // All land, no below-threshold cell anywhere.
        let heights = Grid::new_with(4, 4, 0.8f32);
        let flow_norm = Grid::new_with(4, 4, 0.0f32);
        assert!(path_to_sea(&heights, &flow_norm, 0.2, 5).is_none());
    }

    #[test]
    fn test_simulate_is_deterministic_and_normalized() {
        let heights = ramp_to_sea();
        let params = ErosionParams::default();

        let a = simulate(&heights, 0.2, &params);
        let b = simulate(&heights, 0.2, &params);

        assert_eq!(a.heights, b.heights);
        assert_eq!(a.flow, b.flow);
        assert_eq!(a.rivers, b.rivers);

        let (min, max) = a.flow.min_max();
        assert!(min >= 0.0);
        assert!(max <= 1.0);
    }

    #[test]
    fn test_carving_never_raises_terrain() {
        let heights = ramp_to_sea();
        let out = simulate(&heights, 0.2, &ErosionParams::default());
        for (before, after) in heights.as_slice().iter().zip(out.heights.as_slice()) {
            assert!(after <= before, "erosion must only lower cells");
        }
    }

    #[test]
    fn test_river_mask_defaults_to_one() {
        let heights = ramp_to_sea();
        let out = simulate(&heights, 0.2, &ErosionParams::default());

        let touched: std::collections::HashSet<usize> = out
            .rivers
            .iter()
            .flatten()
            .flat_map(|&i| std::iter::once(i).chain(heights.neighbors4(i)))
            .collect();

        for i in 0..heights.len() {
            if !touched.contains(&i) {
                assert_eq!(*out.river_mask.get(i), 1.0);
            }
        }
    }

    #[test]
    fn test_river_mask_stamps_channel_and_banks() {
        // Distinct eroded heights over a 5x3 grid; one path along the
        // middle row.
        let eroded = Grid::from_vec(5, 3, (0..15).map(|i| i as f32 / 14.0).collect());
        let path = vec![eroded.index(1, 1), eroded.index(2, 1), eroded.index(3, 1)];
        let mask = build_river_mask(&eroded, &[path.clone()], 1.2);

        // Channel cells carry the eroded height itself.
        for &i in &path {
            assert_eq!(*mask.get(i), *eroded.get(i));
        }
        // Unmarked 4-neighbors of the channel become widened banks.
        let banks = [
            eroded.index(1, 0),
            eroded.index(2, 0),
            eroded.index(3, 0),
            eroded.index(1, 2),
            eroded.index(2, 2),
            eroded.index(3, 2),
            eroded.index(0, 1),
            eroded.index(4, 1),
        ];
        for &i in &banks {
            assert!((mask.get(i) - eroded.get(i) * 1.2).abs() < 1e-6);
        }
        // Cells touching neither channel nor bank stay at 1.0.
        assert_eq!(*mask.at(0, 0), 1.0);
        assert_eq!(*mask.at(4, 0), 1.0);
        assert_eq!(*mask.at(0, 2), 1.0);
        assert_eq!(*mask.at(4, 2), 1.0);
    }

    /// A walled crater: a 5x5 plateau at 1.0 whose center pit is the only
    /// strictly lower neighbor of its four flanking cells, so the pit
    /// collects a full inflow unit from each of them. A sea column sits
    /// along the east edge.
    fn crater_island() -> Grid<f32> {
        let size = 17;
        let mut grid = Grid::new_with(size, size, 0.1f32);
        for y in 6..11 {
            for x in 6..11 {
                *grid.at_mut(x, y) = 1.0;
            }
        }
        *grid.at_mut(8, 8) = 0.9;
        for y in 0..size {
            *grid.at_mut(size - 1, y) = 0.0;
        }
        grid
    }

    #[test]
    fn test_crater_pit_spawns_river_through_full_pipeline() {
        let heights = crater_island();
        let out = simulate(&heights, 0.05, &ErosionParams::default());

        // The pit gathers flow 4.0, above the source threshold; no other
        // cell both exceeds the height percentile and collects real flow.
        assert_eq!(out.rivers.len(), 1);
        let path = &out.rivers[0];
        let pit = heights.index(8, 8);
        assert_eq!(path[0], pit);

        // Containment: every cell but the endpoint is land.
        let last = *path.last().unwrap();
        assert!(*heights.get(last) < 0.05);
        for &i in &path[..path.len() - 1] {
            assert!(*heights.get(i) >= 0.05);
        }

        // The pit is the flow maximum, so it erodes by the full factor and
        // the channel stamp squares that into the final height.
        assert!((out.river_mask.get(pit) - 0.85).abs() < 1e-6);
        assert!((out.heights.get(pit) - 0.85 * 0.85).abs() < 1e-5);

        // The west flank is off the eastbound path, so it is a widened
        // bank; its raised product is clamped back into range.
        let west_flank = heights.index(7, 8);
        assert!(!path.contains(&west_flank));
        assert!((out.river_mask.get(west_flank) - 1.2).abs() < 1e-6);
        assert_eq!(*out.heights.get(west_flank), 1.0);

        // Far corner: no flow, no river, untouched.
        assert_eq!(*out.river_mask.at(0, 0), 1.0);
        assert_eq!(*out.heights.at(0, 0), 0.1);
    }

    #[test]
    fn test_flat_field_produces_no_flow_and_no_rivers() {
        let heights = Grid::new_with(5, 5, 0.0f32);
        let out = simulate(&heights, 0.5, &ErosionParams::default());

        assert!(out.flow.as_slice().iter().all(|&v| v == 0.0));
        assert!(out.rivers.is_empty());
        assert_eq!(out.heights, heights);
    }
}
