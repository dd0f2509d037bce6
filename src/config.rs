//! Scene configuration
//!
//! Every tunable constant the generator depends on lives here: output grid
//! size, glyph cell aspect, per-biome noise scales and smoothing windows,
//! placement coefficients, glyph compiler thresholds and the world seed.
//! The whole tree is `serde`-serializable and loads from an optional JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SceneConfig {
    pub canvas: CanvasConfig,
    pub world: WorldConfig,
    pub biome: BiomeConfig,
    pub terrain: TerrainConfig,
    pub placement: PlacementConfig,
    pub glyph: GlyphConfig,
    pub render: RenderConfig,
    pub weather: WeatherConfig,
}

impl SceneConfig {
    /// Load configuration from a JSON file, or fall back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}

// =============================================================================
// CANVAS / GEOMETRY
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Output grid width in glyphs
    pub ascii_width: usize,
    /// Output grid height in glyphs
    pub ascii_height: usize,
    /// Glyph cell width in source pixels
    pub cell_width: u32,
    /// Glyph cell height in source pixels
    pub cell_height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            ascii_width: 504,
            ascii_height: 146,
            cell_width: 8,
            cell_height: 16,
        }
    }
}

impl CanvasConfig {
    /// Source pixels behind one glyph, never smaller than 1x1.
    pub fn cell(&self) -> CellSize {
        CellSize {
            width: self.cell_width.max(1),
            height: self.cell_height.max(1),
        }
    }

    /// Terrain window geometry implied by the output grid.
    ///
    /// Rows run far (0) to near (`y_max`); the extra ten rows let tall near
    /// terrain rise into view from below the bottom edge. Columns start left
    /// of the screen so that rows shifted right by the isometric skew still
    /// cover the left edge.
    pub fn geometry(&self) -> SceneGeometry {
        let y_max = (self.ascii_height as f64 / 3.0).ceil() as i64 + 10;
        let x_min = (-6.0 * y_max as f64 / 7.0).floor() as i64 - 1;
        let x_max = (self.ascii_width as f64 / 7.0).ceil() as i64;
        SceneGeometry {
            ascii_width: self.ascii_width,
            ascii_height: self.ascii_height,
            x_min,
            x_max,
            y_max,
            map_width: (x_max - x_min + 1) as usize,
            map_height: (y_max + 1) as usize,
            cell: self.cell(),
        }
    }
}

/// Pixel size of one glyph cell, shared by the glyph compiler, the synthetic
/// asset generator and PNG export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CellSize {
    fn default() -> Self {
        Self { width: 8, height: 16 }
    }
}

impl CellSize {
    /// Pixel dimensions of a `columns x rows` glyph block.
    pub fn pixels(&self, columns: usize, rows: usize) -> (u32, u32) {
        (columns as u32 * self.width, rows as u32 * self.height)
    }
}

/// Derived dimensions shared by the page cache and the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneGeometry {
    pub ascii_width: usize,
    pub ascii_height: usize,
    /// Screen-space column of the first terrain column
    pub x_min: i64,
    /// Screen-space column of the last terrain column
    pub x_max: i64,
    /// Last terrain row
    pub y_max: i64,
    /// Columns per page and per stitched window
    pub map_width: usize,
    /// Rows per page
    pub map_height: usize,
    pub cell: CellSize,
}

// =============================================================================
// WORLD / CAMERA
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    /// Camera offset at startup, in world columns
    pub start_offset: i64,
    /// Columns scrolled per tick while moving
    pub scroll_step: i64,
    /// Offsets beyond +/- this bound reverse the scroll direction
    pub runaway_bound: i64,
    /// Keep only pages within this many pages of the camera. `None` keeps all.
    pub cache_radius: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_offset: 100,
            scroll_step: 10,
            runaway_bound: 100_000,
            cache_radius: None,
        }
    }
}

// =============================================================================
// BIOME CLASSIFIER
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    /// Temperature floor (absolute zero)
    pub floor_temperature: f64,
    /// Peak height of the temperature envelope above the floor
    pub peak_rise: f64,
    /// Envelope decay: `exp(-x^2 / decay_divisor)` with `x = offset / ascii_width`
    pub decay_divisor: f64,
    /// Amplitude of the noise jitter added on top of the envelope
    pub jitter: f64,
    /// Biome noise is sampled at `offset * biome_noise_scale + biome_noise_shift`
    pub biome_noise_scale: f64,
    pub biome_noise_shift: f64,
    /// Biome noise below this is mountain
    pub mountain_below: f64,
    /// Biome noise below this (and above `mountain_below`) is forest; above is fungi
    pub forest_below: f64,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        Self {
            floor_temperature: -273.15,
            peak_rise: 300.0,
            decay_divisor: 100.0,
            jitter: 10.0,
            biome_noise_scale: 0.5,
            biome_noise_shift: 20.0,
            mountain_below: 0.4,
            forest_below: 0.7,
        }
    }
}

// =============================================================================
// TERRAIN
// =============================================================================

/// One noise layer: `noise(x / scale + shift, y / scale + shift) * amplitude`,
/// contributing only the excess above `threshold`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NoiseLayer {
    pub scale: f64,
    pub shift: f64,
    pub amplitude: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Gentle rolling base shared by every biome (threshold unused)
    pub base: NoiseLayer,
    pub base_window: usize,
    /// Sparse sharp peaks
    pub mountain_peaks: NoiseLayer,
    pub mountain_window: usize,
    /// Mid-frequency bumps under the fungi clumps
    pub fungi_bumps: NoiseLayer,
    pub fungi_window: usize,
    /// Raised 3x2 plateaus stamped per fungi page
    pub fungi_plateaus: usize,
    /// Plateau rise above the ground it is stamped on, `[min, max)`
    pub fungi_plateau_rise: (u32, u32),
    /// Steep localized ice formations
    pub ice_spikes: NoiseLayer,
    /// Ice spike scale at the temperature floor (scale is 0 at 0 degrees)
    pub ice_max_scale: f64,
    /// Single-cell depressions stamped per ice page
    pub ice_pits: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            base: NoiseLayer {
                scale: 50.0,
                shift: 0.0,
                amplitude: 10.0,
                threshold: 0.0,
            },
            base_window: 10,
            mountain_peaks: NoiseLayer {
                scale: 40.0,
                shift: 5.0,
                amplitude: 60.0,
                threshold: 30.0,
            },
            mountain_window: 5,
            fungi_bumps: NoiseLayer {
                scale: 10.0,
                shift: 5.0,
                amplitude: 30.0,
                threshold: 15.0,
            },
            fungi_window: 8,
            fungi_plateaus: 30,
            fungi_plateau_rise: (3, 8),
            ice_spikes: NoiseLayer {
                scale: 5.0,
                shift: 3.0,
                amplitude: 60.0,
                threshold: 40.0,
            },
            ice_max_scale: 15.0,
            ice_pits: 30,
        }
    }
}

// =============================================================================
// SPRITE PLACEMENT
// =============================================================================

/// Density coefficient as a clamped linear function of temperature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoefficientRamp {
    pub from_temperature: f64,
    pub to_temperature: f64,
    pub from_coefficient: f64,
    pub to_coefficient: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Density noise sampled at `(world_x / density_scale, y / density_scale)`
    pub density_scale: f64,
    /// Catalog draws per hit before the cell is left empty
    pub max_draws: usize,
    pub mountain: CoefficientRamp,
    pub forest: CoefficientRamp,
    pub fungi: CoefficientRamp,
    pub ice: CoefficientRamp,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            density_scale: 50.0,
            max_draws: 10,
            mountain: CoefficientRamp {
                from_temperature: 0.0,
                to_temperature: 30.0,
                from_coefficient: 1.0,
                to_coefficient: 1.0,
            },
            forest: CoefficientRamp {
                from_temperature: 0.0,
                to_temperature: 30.0,
                from_coefficient: 0.0,
                to_coefficient: 1.0,
            },
            fungi: CoefficientRamp {
                from_temperature: 0.0,
                to_temperature: 30.0,
                from_coefficient: 0.2,
                to_coefficient: 1.0,
            },
            ice: CoefficientRamp {
                from_temperature: 0.0,
                to_temperature: -40.0,
                from_coefficient: 1.0,
                to_coefficient: 0.2,
            },
        }
    }
}

// =============================================================================
// GLYPH COMPILER
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    /// Gaussian sigma of the fine blur
    pub dog_sigma_small: f32,
    /// Gaussian sigma of the coarse blur
    pub dog_sigma_large: f32,
    /// Fine minus coarse below this marks an edge pixel
    pub dog_threshold: f32,
    /// Minimum Sobel gradient magnitude that casts a vote
    pub sobel_magnitude: f32,
    /// Minimum winning vote for a block to receive an edge glyph
    pub vote_threshold: f32,
    /// Vote weight of horizontal strokes (`-` / `_`)
    pub horizontal_vote: f32,
    /// Pixel rows sampled per block; more than the cell height overlaps the next block
    pub sample_rows: u32,
    /// Invert source images after grayscale conversion
    pub invert_source: bool,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            dog_sigma_small: 1.0,
            dog_sigma_large: 3.0,
            dog_threshold: -10.0,
            sobel_magnitude: 200.0,
            vote_threshold: 15.0,
            horizontal_vote: 1.5,
            sample_rows: 20,
            invert_source: true,
        }
    }
}

// =============================================================================
// RENDER / WEATHER
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Sprite brightness noise sampled at `(world_x / scale, y / scale)`
    pub brightness_scale: f64,
    pub brightness_min: f64,
    pub brightness_max: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            brightness_scale: 30.0,
            brightness_min: 0.5,
            brightness_max: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub snow: bool,
    /// Temperature at which snowfall reaches full strength
    pub cold_limit: f64,
    /// Spawn density at `cold_limit` (fraction of the grid width per frame)
    pub max_density: f64,
    pub min_radius: f64,
    pub max_radius: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            snow: true,
            cold_limit: -40.0,
            max_density: 0.6,
            min_radius: 0.5,
            max_radius: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_matches_canvas() {
        let geometry = CanvasConfig::default().geometry();

        assert_eq!(geometry.y_max, 59);
        assert_eq!(geometry.x_min, -52);
        assert_eq!(geometry.x_max, 72);
        assert_eq!(geometry.map_width, 125);
        assert_eq!(geometry.map_height, 60);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SceneConfig =
            serde_json::from_str(r#"{ "world": { "seed": 9 }, "canvas": { "ascii_width": 80 } }"#)
                .unwrap();

        assert_eq!(config.world.seed, 9);
        assert_eq!(config.world.scroll_step, 10);
        assert_eq!(config.canvas.ascii_width, 80);
        assert_eq!(config.canvas.ascii_height, 146);
        assert_eq!(config.placement.max_draws, 10);
    }

    #[test]
    fn test_cell_size_comes_from_canvas() {
        let config: SceneConfig =
            serde_json::from_str(r#"{ "canvas": { "cell_width": 4, "cell_height": 0 } }"#).unwrap();
        let cell = config.canvas.geometry().cell;

        assert_eq!(cell, CellSize { width: 4, height: 1 });
        assert_eq!(cell.pixels(3, 2), (12, 2));
        assert_eq!(CanvasConfig::default().cell(), CellSize::default());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let config = SceneConfig::load(Path::new("/nonexistent/glyphscape.json")).unwrap();
        assert_eq!(config.world.start_offset, 100);
    }
}
