//! Elevation bands: named terrain categories with resolved height thresholds.
//!
//! Band specs declare their threshold in one of three encodings. Resolution
//! turns every spec into a concrete height value against the sorted height
//! distribution, producing a table ordered ascending by resolved value. Band
//! index 0 is the lowest band (typically the sea floor).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// How a band spec encodes its threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    /// Absolute level in [-255, 255], mapped to `level / 255`.
    Absolute(i32),
    /// Fraction of sea level added to sea level (may be negative).
    RelativeToSea(f32),
    /// Fraction of sky level added to sky level (may be negative).
    RelativeToSky(f32),
}

/// Declared elevation band, before resolution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BandSpec {
    pub name: String,
    pub threshold: Threshold,
    pub color: [u8; 3],
}

impl BandSpec {
    pub fn new(name: &str, threshold: Threshold, color: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            threshold,
            color,
        }
    }
}

/// Resolved elevation band. `value` is the concrete height threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub name: String,
    pub value: f32,
    pub color: [u8; 3],
}

/// Resolved band table, sorted ascending by threshold value.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationTable {
    pub bands: Vec<Band>,
    /// Height value at percentile `1 - percent_land` of the sorted field.
    pub sea_level: f32,
    /// Maximum height value of the field.
    pub sky_level: f32,
}

impl ElevationTable {
    /// Classify a height: scan bands highest-first, return the first band
    /// whose threshold is at or below the height. Heights below every
    /// threshold fall into band 0.
    pub fn classify(&self, height: f32) -> usize {
        for (i, band) in self.bands.iter().enumerate().rev() {
            if height >= band.value {
                return i;
            }
        }
        0
    }

    /// Threshold at or above which a cell counts as land for segmentation
    /// and erosion. Fixed policy: the second band in the sorted list (the
    /// band immediately above the sea band). `None` when the table is too
    /// short to have a land band.
    pub fn land_threshold(&self) -> Option<f32> {
        self.bands.get(1).map(|band| band.value)
    }
}

/// Resolve band specs against a height field.
///
/// Sea level is the sorted height at rank `ceil((1 - percent_land) * size)`,
/// i.e. the value below which the non-land fraction of cells falls; sky
/// level is the field maximum. Sea- and sky-relative bands resolve through a
/// rank lookup of their nominal fraction into the sorted array; absolute
/// bands resolve directly to `level / 255`.
pub fn resolve_bands(
    specs: &[BandSpec],
    heights: &Grid<f32>,
    percent_land: f32,
) -> ElevationTable {
    let mut sorted: Vec<f32> = heights.as_slice().to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let sea_level = sorted[rank(1.0 - percent_land, sorted.len())];
    let sky_level = sorted[sorted.len() - 1];

    let mut bands: Vec<Band> = specs
        .iter()
        .map(|spec| {
            let value = match spec.threshold {
                Threshold::Absolute(level) => level as f32 / 255.0,
                Threshold::RelativeToSea(pct) => {
                    sorted[rank(sea_level + sea_level * pct, sorted.len())]
                }
                Threshold::RelativeToSky(pct) => {
                    sorted[rank(sky_level + sky_level * pct, sorted.len())]
                }
            };
            Band {
                name: spec.name.clone(),
                value,
                color: spec.color,
            }
        })
        .collect();

    bands.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

    ElevationTable {
        bands,
        sea_level,
        sky_level,
    }
}

/// Convert a nominal fraction to a rank in the sorted array, clamped to the
/// valid index range.
fn rank(fraction: f32, len: usize) -> usize {
    let raw = (fraction * len as f32).ceil();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_grid() -> Grid<f32> {
        // 16 evenly spaced heights from 0.0 to 1.0.
        let data: Vec<f32> = (0..16).map(|i| i as f32 / 15.0).collect();
        Grid::from_vec(4, 4, data)
    }

    #[test]
    fn test_absolute_band_resolution() {
        let specs = vec![
            BandSpec::new("low", Threshold::Absolute(0), [0, 0, 0]),
            BandSpec::new("high", Threshold::Absolute(128), [255, 255, 255]),
        ];
        let table = resolve_bands(&specs, &ramp_grid(), 0.5);

        assert_eq!(table.bands[0].value, 0.0);
        assert!((table.bands[1].value - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_sea_and_sky_levels() {
        let table = resolve_bands(
            &[BandSpec::new("base", Threshold::Absolute(0), [0, 0, 0])],
            &ramp_grid(),
            0.5,
        );
        // 50% land: sea level sits at the middle of the sorted ramp.
        assert!((table.sea_level - 8.0 / 15.0).abs() < 1e-6);
        assert_eq!(table.sky_level, 1.0);
    }

    #[test]
    fn test_bands_sorted_ascending() {
        let specs = vec![
            BandSpec::new("peaks", Threshold::RelativeToSky(-0.05), [255, 255, 255]),
            BandSpec::new("sea", Threshold::Absolute(0), [0, 0, 255]),
            BandSpec::new("plains", Threshold::RelativeToSea(0.1), [0, 255, 0]),
        ];
        let table = resolve_bands(&specs, &ramp_grid(), 0.4);

        for pair in table.bands.windows(2) {
            assert!(pair[0].value <= pair[1].value);
        }
        assert_eq!(table.bands[0].name, "sea");
    }

    #[test]
    fn test_classify_monotone_in_height() {
        let specs = vec![
            BandSpec::new("sea", Threshold::Absolute(0), [0, 0, 255]),
            BandSpec::new("land", Threshold::Absolute(64), [0, 255, 0]),
            BandSpec::new("hills", Threshold::Absolute(160), [128, 128, 0]),
        ];
        let table = resolve_bands(&specs, &ramp_grid(), 0.4);

        let mut last = 0;
        for i in 0..=20 {
            let h = i as f32 / 20.0;
            let band = table.classify(h);
            assert!(band >= last, "classification must not decrease with height");
            last = band;
        }
    }

    #[test]
    fn test_classify_below_all_bands_is_zero() {
        let specs = vec![BandSpec::new("high", Threshold::Absolute(200), [0, 0, 0])];
        let table = resolve_bands(&specs, &ramp_grid(), 0.4);
        assert_eq!(table.classify(0.0), 0);
    }

    #[test]
    fn test_flat_field_classifies_all_to_band_zero() {
        // Scenario: a perfectly flat (all-zero after normalization) field.
        let flat = Grid::new_with(4, 4, 0.0f32);
        let specs = vec![
            BandSpec::new("sea", Threshold::Absolute(0), [0, 0, 255]),
            BandSpec::new("land", Threshold::Absolute(64), [0, 255, 0]),
        ];
        let table = resolve_bands(&specs, &flat, 0.4);
        for &h in flat.as_slice() {
            assert_eq!(table.classify(h), 0);
        }
    }

    #[test]
    fn test_rank_clamps_to_valid_range() {
        assert_eq!(rank(-0.5, 10), 0);
        assert_eq!(rank(0.0, 10), 0);
        assert_eq!(rank(2.0, 10), 9);
    }

    #[test]
    fn test_land_threshold_policy() {
        let specs = vec![
            BandSpec::new("sea", Threshold::Absolute(0), [0, 0, 255]),
            BandSpec::new("shore", Threshold::Absolute(100), [200, 200, 100]),
            BandSpec::new("hills", Threshold::Absolute(200), [100, 80, 40]),
        ];
        let table = resolve_bands(&specs, &ramp_grid(), 0.4);
        // Second sorted band is the land threshold.
        assert_eq!(table.land_threshold(), Some(table.bands[1].value));

        let short = resolve_bands(&specs[..1], &ramp_grid(), 0.4);
        assert_eq!(short.land_threshold(), None);
    }
}
