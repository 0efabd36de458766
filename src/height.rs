//! Height field construction: noise shaped by a center-bias mask.

use crate::grid::Grid;

/// Multiply the combined noise field by the mask, then min-max rescale so the
/// result spans exactly [0, 1]. Both ends are reset (not merely divided by
/// the max); a constant product collapses to all-zero.
pub fn build(noise: &Grid<f32>, mask: &Grid<f32>) -> Grid<f32> {
    assert_eq!(noise.len(), mask.len(), "noise/mask size mismatch");

    let data: Vec<f32> = noise
        .as_slice()
        .iter()
        .zip(mask.as_slice())
        .map(|(&n, &m)| n * m)
        .collect();

    Grid::from_vec(noise.width, noise.height, data).rescaled_unit()
}
