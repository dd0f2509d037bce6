//! Debug script to print the biome track and page heights as ASCII

use std::sync::Arc;

use glyphscape::assets::{GlyphLibrary, SyntheticAssets};
use glyphscape::catalog::SpriteCatalog;
use glyphscape::config::SceneConfig;
use glyphscape::page_cache::PageGenerator;
use glyphscape::seeds::WorldSeeds;

const HEIGHT_RAMP: [char; 8] = ['.', ':', '-', '=', '+', '*', '#', '@'];

fn main() {
    let mut args = std::env::args().skip(1);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let first: i64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(-20);
    let last: i64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(20);

    let mut config = SceneConfig::default();
    config.world.seed = seed;
    let geometry = config.canvas.geometry();
    let seeds = WorldSeeds::from_master(seed);

    let catalog = SpriteCatalog::builtin();
    let library = GlyphLibrary::compile(&catalog, &SyntheticAssets::new(geometry.cell), geometry.cell, &config.glyph);
    let rolls = library.roll_table(&catalog);
    let mut generator = PageGenerator::new(&config, &seeds, Arc::new(catalog), rolls);

    println!(
        "=== PAGE DEBUG pages {}..={} ({}x{} per page) ===",
        first, last, geometry.map_width, geometry.map_height
    );
    println!("{seeds}");
    println!();
    println!("{:>6} {:>9} {:>8} {:>8} {:>5} {:>7}", "page", "offset", "temp", "biome", "maxh", "sprites");

    let mut thumbnails = Vec::new();
    for index in first..=last {
        let page = generator.generate(index);
        let max_height = page.heights.iter().map(|(_, _, &h)| h).max().unwrap_or(0);
        let sprite_count = page.sprites.iter().filter(|(_, _, s)| s.is_some()).count();
        println!(
            "{:>6} {:>9} {:>7.1}C {:>8} {:>5} {:>7}",
            index,
            index.saturating_mul(geometry.map_width as i64),
            page.temperature,
            page.biome.name(),
            max_height,
            sprite_count
        );
        thumbnails.push(page);
    }

    // Column profile of every page: tallest cell per column, one row per page
    println!();
    println!("HEIGHT PROFILE (max height per column):");
    for page in &thumbnails {
        let peak = page.heights.iter().map(|(_, _, &h)| h).max().unwrap_or(0).max(1);
        let line: String = (0..page.heights.width)
            .map(|x| {
                let h = (0..page.heights.height).map(|y| *page.heights.get(x, y)).max().unwrap_or(0);
                if h == 0 {
                    ' '
                } else {
                    let idx = (h as usize * (HEIGHT_RAMP.len() - 1)) / peak as usize;
                    HEIGHT_RAMP[idx]
                }
            })
            .collect();
        println!("{:>4}{} |{}|", page.index, page.biome.symbol(), line);
    }
}
