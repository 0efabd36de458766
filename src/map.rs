//! Top-level map generation: configuration, pipeline orchestration, and the
//! assembled world output.
//!
//! `generate` runs every stage in a fixed order against a single seeded
//! random stream, so one `(config, seed)` pair always produces the same
//! world, cell for cell.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::continents::{self, ContinentMap};
use crate::elevation::{self, BandSpec, ElevationTable, Threshold};
use crate::grid::Grid;
use crate::height;
use crate::mask;
use crate::noise_field::{self, DEFAULT_MIN_POW};
use crate::rivers::{self, ErosionParams};
use crate::wind::{self, WindFields, WindParams};

/// Walk budget divisor: default particle life is `width * height / 50`.
const DEFAULT_LIFE_DIVISOR: usize = 50;

/// Errors from map generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("map dimensions must be nonzero, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("at least one elevation band is required")]
    NoElevationBands,
    #[error("noise octave counts must be nonzero")]
    NoNoiseOctaves,
    #[error("wind band count must be nonzero")]
    NoWindBands,
}

/// How the center-bias mask that shapes the landmass is produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MaskMode {
    /// Rolling particle deposition: random walks that pile up terrain mass.
    RollingParticles { iterations: usize, life: usize },
    /// Smooth analytic falloff toward all four map edges.
    EdgeGradient,
    /// No mask; the raw noise field becomes the height field.
    None,
}

/// Full generation configuration. Serializable so a world can be described
/// by a single JSON document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    /// Octave count for the height noise.
    pub noise_octaves: u32,
    /// Octave weighting exponent divisor; 1.0 keeps the classic power-of-two
    /// weights, larger values flatten the spectrum.
    pub roughness: f32,
    /// Target fraction of cells above sea level.
    pub percent_land: f32,
    /// Continents smaller than this are merged into a neighbor.
    pub min_continent_size: usize,
    pub mask: MaskMode,
    pub wind: WindParams,
    pub erosion: ErosionParams,
    pub bands: Vec<BandSpec>,
}

impl GenerationConfig {
    /// Configuration with defaults scaled to the map size.
    pub fn new(seed: u64, width: usize, height: usize) -> Self {
        let area = width * height;
        Self {
            seed,
            width,
            height,
            noise_octaves: 7,
            roughness: 1.0,
            percent_land: 0.4,
            min_continent_size: area / 100,
            mask: MaskMode::RollingParticles {
                iterations: area,
                life: area / DEFAULT_LIFE_DIVISOR,
            },
            wind: WindParams::default(),
            erosion: ErosionParams::default(),
            bands: default_bands(),
        }
    }
}

/// The standard six-band table from deep sea to peaks.
pub fn default_bands() -> Vec<BandSpec> {
    vec![
        BandSpec::new("sea", Threshold::Absolute(0), [12, 44, 96]),
        BandSpec::new("shore", Threshold::RelativeToSea(0.0), [208, 192, 136]),
        BandSpec::new("plains", Threshold::RelativeToSea(0.1), [60, 128, 52]),
        BandSpec::new("hills", Threshold::RelativeToSky(-0.25), [116, 100, 72]),
        BandSpec::new("mountains", Threshold::RelativeToSky(-0.1), [132, 132, 132]),
        BandSpec::new("peaks", Threshold::RelativeToSky(-0.02), [236, 236, 240]),
    ]
}

/// A classified map cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub height: f32,
    /// Index into the resolved band table.
    pub band: usize,
}

impl Cell {
    /// Grayscale shade of the cell height, for quick previews.
    pub fn shade(&self) -> u8 {
        (self.height.clamp(0.0, 1.0) * 255.0) as u8
    }
}

/// Everything one generation run produces.
#[derive(Clone, Debug)]
pub struct WorldMap {
    /// Final height field after erosion and river carving, in [0, 1].
    pub heights: Grid<f32>,
    /// Combined multi-octave noise before masking.
    pub noise: Grid<f32>,
    /// Center-bias mask applied to the noise.
    pub mask: Grid<f32>,
    /// Normalized flow accumulation.
    pub flow: Grid<f32>,
    /// River carving mask; 1.0 away from channels.
    pub river_mask: Grid<f32>,
    /// Wind strength and its continent-noise companion field.
    pub wind: WindFields,
    /// Continent segmentation, colouring, and coastlines.
    pub continents: ContinentMap,
    /// Kept river paths as ordered cell indices, source first.
    pub rivers: Vec<Vec<usize>>,
    /// Per-cell band classification of the final heights.
    pub cells: Vec<Cell>,
    /// Resolved elevation band table.
    pub table: ElevationTable,
}

/// Run the full pipeline: noise, mask, height, elevation bands, continents,
/// wind, erosion and rivers, then per-cell classification.
pub fn generate(config: &GenerationConfig) -> Result<WorldMap, GenerationError> {
    if config.width == 0 || config.height == 0 {
        return Err(GenerationError::InvalidDimensions {
            width: config.width,
            height: config.height,
        });
    }
    if config.bands.is_empty() {
        return Err(GenerationError::NoElevationBands);
    }
    if config.noise_octaves == 0
        || config.wind.noise_octaves == 0
        || config.wind.continent_octaves == 0
    {
        return Err(GenerationError::NoNoiseOctaves);
    }
    if config.wind.band_count == 0 {
        return Err(GenerationError::NoWindBands);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let layers = noise_field::generate_layers(
        &mut rng,
        config.width,
        config.height,
        config.noise_octaves,
        DEFAULT_MIN_POW,
    );
    let noise = noise_field::combine_weighted(&layers, config.roughness);

    let land_mask = match config.mask {
        MaskMode::RollingParticles { iterations, life } => {
            mask::rolling_mask(&mut rng, config.width, config.height, iterations, life)
        }
        MaskMode::EdgeGradient => mask::edge_gradient(config.width, config.height),
        MaskMode::None => Grid::new_with(config.width, config.height, 1.0),
    };

    let base_heights = height::build(&noise, &land_mask);

    let table = elevation::resolve_bands(&config.bands, &base_heights, config.percent_land);

    let continents = continents::segment(&base_heights, &table, config.min_continent_size, &mut rng);

    let wind = wind::generate(&mut rng, config.width, config.height, &config.wind);

    // Without a land band there is nothing to erode or drain.
    let (heights, flow, river_mask, river_paths) = match table.land_threshold() {
        Some(threshold) => {
            let out = rivers::simulate(&base_heights, threshold, &config.erosion);
            (out.heights, out.flow, out.river_mask, out.rivers)
        }
        None => (
            base_heights.clone(),
            Grid::new_with(config.width, config.height, 0.0),
            Grid::new_with(config.width, config.height, 1.0),
            Vec::new(),
        ),
    };

    let cells = classify_cells(&heights, &table);

    Ok(WorldMap {
        heights,
        noise,
        mask: land_mask,
        flow,
        river_mask,
        wind,
        continents,
        rivers: river_paths,
        cells,
        table,
    })
}

fn classify_cells(heights: &Grid<f32>, table: &ElevationTable) -> Vec<Cell> {
    (0..heights.len())
        .map(|i| {
            let (x, y) = heights.coords(i);
            let h = *heights.get(i);
            Cell {
                x,
                y,
                height: h,
                band: table.classify(h),
            }
        })
        .collect()
}
