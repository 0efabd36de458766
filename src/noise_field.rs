//! Multi-octave noise field synthesis.
//!
//! Layers are sampled from seeded Perlin noise at geometrically spaced
//! frequencies and blended with exponentially decaying weights into a single
//! field in [0, 1]. Layer seeds are drawn from the generation's ChaCha stream,
//! so the whole synthesis is reproducible from the master seed.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::grid::Grid;

/// Default exponent floor for octave frequencies; layer `n` samples at
/// `2^(n + min_pow)`.
pub const DEFAULT_MIN_POW: u32 = 2;

/// Generate `count` octave layers. Layer `n` counts down from `count` to 1,
/// so the first generated layer has the largest frequency divisor (the
/// smoothest variation) and the last the smallest (the finest detail).
///
/// Each layer consumes one `u32` from the random stream to seed its Perlin
/// permutation; sampling itself is pure, so rows are filled in parallel
/// without affecting reproducibility.
pub fn generate_layers(
    rng: &mut ChaCha8Rng,
    width: usize,
    height: usize,
    count: u32,
    min_pow: u32,
) -> Vec<Grid<f32>> {
    let mut layers = Vec::with_capacity(count as usize);
    for n in (1..=count).rev() {
        let frequency = 2f64.powi((n + min_pow) as i32);
        let perlin = Perlin::new(rng.gen());
        layers.push(sample_layer(&perlin, width, height, frequency));
    }
    layers
}

/// Sample one layer, mapping raw noise from [-1, 1] to [0, 1].
fn sample_layer(perlin: &Perlin, width: usize, height: usize, frequency: f64) -> Grid<f32> {
    let mut data = vec![0.0f32; width * height];
    data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, cell) in row.iter_mut().enumerate() {
            let n = perlin.get([
                x as f64 / frequency * 2.0,
                y as f64 / frequency * 2.0,
            ]);
            *cell = (n * 0.5 + 0.5) as f32;
        }
    });
    Grid::from_vec(width, height, data)
}

/// Blend octave layers into one field by weighted average.
///
/// Counting `i` upward from the last generated layer (the highest-frequency
/// one), layer weights are `2^(i / roughness)`: the smoothest layer dominates
/// at `roughness = 1`, and larger roughness flattens the curve, letting the
/// detail layers through. The result is a weighted average of values in
/// [0, 1], so it stays in range by construction.
pub fn combine_weighted(layers: &[Grid<f32>], roughness: f32) -> Grid<f32> {
    assert!(!layers.is_empty(), "cannot combine zero noise layers");
    let width = layers[0].width;
    let height = layers[0].height;

    let count = layers.len();
    let weights: Vec<f32> = (0..count)
        .map(|j| 2f32.powf((count - 1 - j) as f32 / roughness))
        .collect();
    let weight_sum: f32 = weights.iter().sum();

    let mut combined = vec![0.0f32; width * height];
    for (layer, &weight) in layers.iter().zip(&weights) {
        for (acc, &v) in combined.iter_mut().zip(layer.as_slice()) {
            *acc += v * weight;
        }
    }
    for v in &mut combined {
        *v /= weight_sum;
    }

    Grid::from_vec(width, height, combined)
}
