//! Wind field synthesis.
//!
//! Wind is independent of the height pipeline apart from sharing the random
//! stream: a base noise field is blended with a deterministic latitude band
//! oscillation, then perturbed by a second "continent noise" layer that
//! loosely correlates wind strength with large-scale terrain structure.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::noise_field::{self, DEFAULT_MIN_POW};

/// Tunables for wind synthesis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WindParams {
    /// Octave count for the base wind noise.
    pub noise_octaves: u32,
    /// Number of horizontal latitude strips.
    pub band_count: u32,
    /// Weight of the latitude oscillation added to the base noise.
    pub band_weight: f32,
    /// Octave count for the secondary continent-noise layer.
    pub continent_octaves: u32,
    /// Weight of the continent-noise perturbation.
    pub continent_weight: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            noise_octaves: 6,
            band_count: 6,
            band_weight: 0.5,
            continent_octaves: 4,
            continent_weight: 0.3,
        }
    }
}

/// Wind synthesis output. Both fields are max-normalized.
#[derive(Clone, Debug)]
pub struct WindFields {
    pub wind: Grid<f32>,
    pub continent_noise: Grid<f32>,
}

/// Triangular latitude ramp for a row: within each strip the value rises
/// 0 to 1, mirrored on odd-indexed strips so adjacent strips join smoothly.
fn band_value(y: usize, height: usize, band_count: u32) -> f32 {
    let strip_height = height as f32 / band_count as f32;
    let strip = ((y as f32 / strip_height) as u32).min(band_count - 1);
    let t = (y as f32 - strip as f32 * strip_height) / strip_height;
    if strip % 2 == 1 {
        1.0 - t
    } else {
        t
    }
}

/// Generate the wind field and its continent-noise companion.
pub fn generate(
    rng: &mut ChaCha8Rng,
    width: usize,
    height: usize,
    params: &WindParams,
) -> WindFields {
    let base_layers =
        noise_field::generate_layers(rng, width, height, params.noise_octaves, DEFAULT_MIN_POW);
    let mut wind = noise_field::combine_weighted(&base_layers, 1.0);

    for i in 0..wind.len() {
        let (_, y) = wind.coords(i);
        let banded = wind.get(i) + band_value(y, height, params.band_count) * params.band_weight;
        wind.set(i, banded);
    }
    let wind = wind.normalized_by_max();

    let continent_layers = noise_field::generate_layers(
        rng,
        width,
        height,
        params.continent_octaves,
        DEFAULT_MIN_POW,
    );
    let continent_noise = noise_field::combine_weighted(&continent_layers, 1.0);

    let mut blended = wind;
    for (v, &c) in blended
        .as_mut_slice()
        .iter_mut()
        .zip(continent_noise.as_slice())
    {
        *v += c * params.continent_weight;
    }

    WindFields {
        wind: blended.normalized_by_max(),
        continent_noise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_band_value_ramps_and_mirrors() {
        // 4 strips over 40 rows: strip 0 ramps up, strip 1 ramps down.
        assert_eq!(band_value(0, 40, 4), 0.0);
        assert!((band_value(5, 40, 4) - 0.5).abs() < 1e-6);
        assert!((band_value(10, 40, 4) - 1.0).abs() < 1e-6);
        assert!((band_value(15, 40, 4) - 0.5).abs() < 1e-6);
        assert_eq!(band_value(20, 40, 4), 0.0);
    }

    #[test]
    fn test_wind_is_deterministic() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(77);
        let mut rng_b = ChaCha8Rng::seed_from_u64(77);
        let params = WindParams::default();

        let a = generate(&mut rng_a, 24, 18, &params);
        let b = generate(&mut rng_b, 24, 18, &params);

        assert_eq!(a.wind, b.wind);
        assert_eq!(a.continent_noise, b.continent_noise);
    }

    #[test]
    fn test_wind_peaks_at_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let fields = generate(&mut rng, 32, 32, &WindParams::default());

        let (min, max) = fields.wind.min_max();
        assert!((max - 1.0).abs() < 1e-6);
        assert!(min >= 0.0);
    }

    #[test]
    fn test_continent_noise_in_unit_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let fields = generate(&mut rng, 16, 16, &WindParams::default());
        for &v in fields.continent_noise.as_slice() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_zero_band_weight_matches_pure_noise_shape() {
        // With no band contribution the wind is just normalized noise; the
        // maximum must still be exactly 1.
        let params = WindParams {
            band_weight: 0.0,
            continent_weight: 0.0,
            ..WindParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let fields = generate(&mut rng, 20, 20, &params);
        let (_, max) = fields.wind.min_max();
        assert!((max - 1.0).abs() < 1e-6);
    }
}
