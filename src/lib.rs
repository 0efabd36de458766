//! Terrain grid synthesis library
//!
//! Deterministic generation of 2D world maps: seeded multi-octave noise
//! shaped by a particle mask into a height field, classified into elevation
//! bands, segmented into continents, overlaid with wind, and eroded by
//! simulated rivers. Re-exports modules for use by binaries and tools.

pub mod continents;
pub mod elevation;
pub mod grid;
pub mod height;
pub mod map;
pub mod mask;
pub mod noise_field;
pub mod rivers;
pub mod wind;

pub use grid::Grid;
pub use map::{generate, GenerationConfig, GenerationError, MaskMode, WorldMap};
