use std::fs;
use std::process;

use clap::Parser;

use landmass::map::{self, GenerationConfig, MaskMode};

#[derive(Parser, Debug)]
#[command(name = "landmass")]
#[command(about = "Generate deterministic terrain grids with continents and rivers")]
struct Args {
    /// Width of the map in cells
    #[arg(short = 'W', long, default_value = "256")]
    width: usize,

    /// Height of the map in cells
    #[arg(short = 'H', long, default_value = "256")]
    height: usize,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Octave count for the height noise
    #[arg(short, long, default_value = "7")]
    octaves: u32,

    /// Target fraction of cells above sea level
    #[arg(short = 'l', long, default_value = "0.4")]
    percent_land: f32,

    /// Continents smaller than this are merged (default: area / 100)
    #[arg(short = 'm', long)]
    min_continent_size: Option<usize>,

    /// Use a smooth edge gradient instead of the particle mask
    #[arg(long)]
    edge_gradient: bool,

    /// Read the full generation config from a JSON file (overrides other flags)
    #[arg(short, long)]
    config: Option<String>,
}

fn load_config(args: &Args) -> Result<GenerationConfig, String> {
    if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {}", path, e))?;
        return serde_json::from_str(&text)
            .map_err(|e| format!("invalid config {}: {}", path, e));
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut config = GenerationConfig::new(seed, args.width, args.height);
    config.noise_octaves = args.octaves;
    config.percent_land = args.percent_land;
    if let Some(min) = args.min_continent_size {
        config.min_continent_size = min;
    }
    if args.edge_gradient {
        config.mask = MaskMode::EdgeGradient;
    }
    Ok(config)
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    };

    println!("Generating map with seed: {}", config.seed);
    println!("Map size: {}x{}", config.width, config.height);
    println!(
        "Noise: {} octaves, roughness {:.2}, {:.0}% land target",
        config.noise_octaves,
        config.roughness,
        config.percent_land * 100.0
    );

    let world = match map::generate(&config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("generation failed: {}", e);
            process::exit(1);
        }
    };

    let sea_band = 0;
    let land_cells = world.cells.iter().filter(|c| c.band > sea_band).count();
    let total = world.cells.len();
    println!(
        "Height field: {} cells are land ({:.1}%)",
        land_cells,
        100.0 * land_cells as f64 / total as f64
    );
    println!(
        "Elevation bands: {} (sea level {:.3}, sky level {:.3})",
        world.table.bands.len(),
        world.table.sea_level,
        world.table.sky_level
    );

    println!("Continents: {}", world.continents.continents.len());
    for continent in &world.continents.continents {
        println!(
            "  continent {}: {} cells, center ({}, {})",
            continent.id,
            continent.size(),
            continent.center.0,
            continent.center.1
        );
    }

    let river_cells: usize = world.rivers.iter().map(|p| p.len()).sum();
    println!(
        "Rivers: {} paths covering {} cells",
        world.rivers.len(),
        river_cells
    );

    let (wind_min, wind_max) = world.wind.wind.min_max();
    println!("Wind field range: {:.3} to {:.3}", wind_min, wind_max);
    println!("Done.");
}
