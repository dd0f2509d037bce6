//! Per-biome height-field synthesis for one page of world space.
//!
//! Every biome starts from the same gentle base: low-frequency noise quantized
//! to a small integer range and median-smoothed into plateaus. Biomes then add
//! their own character on top:
//!
//! 1. mountain: a high-amplitude layer contributing only its excess over a
//!    threshold, re-smoothed with a narrower window (sparse sharp peaks)
//! 2. forest: base only (flat, lots of placement room)
//! 3. fungi: a mid-frequency bump layer plus ~30 raised 3x2 clumps
//! 4. ice: a steep layer scaled by how cold it is, plus single-cell pits

use crate::biomes::{Biome, BiomeClassifier};
use crate::config::{NoiseLayer, SceneGeometry, TerrainConfig};
use crate::noise_field::{remap, NoiseField};
use crate::smoothing::median_filter_in_place;
use crate::tilemap::Tilemap;

/// Synthesizes the elevation grid of a page.
pub struct HeightFieldGenerator {
    noise: NoiseField,
    classifier: BiomeClassifier,
    config: TerrainConfig,
    map_width: usize,
    map_height: usize,
}

impl HeightFieldGenerator {
    pub fn new(
        noise: NoiseField,
        classifier: BiomeClassifier,
        config: TerrainConfig,
        geometry: &SceneGeometry,
    ) -> Self {
        Self {
            noise,
            classifier,
            config,
            map_width: geometry.map_width,
            map_height: geometry.map_height,
        }
    }

    /// World column of the first column of a page.
    pub fn page_offset(&self, page: i64) -> i64 {
        page.saturating_mul(self.map_width as i64)
    }

    /// Generate the height grid for a page, classifying its biome on the way.
    pub fn generate(&mut self, page: i64) -> Tilemap<u32> {
        let offset = self.page_offset(page);
        let biome = self.classifier.biome(offset);
        let temperature = self.classifier.temperature(offset);
        self.generate_for(page, biome, temperature)
    }

    /// Generate the height grid for a page whose biome is already known.
    ///
    /// The random stream is rewound onto the page's own stream first, so the
    /// result depends only on `page` and never on what was generated before.
    pub fn generate_for(&mut self, page: i64, biome: Biome, temperature: f64) -> Tilemap<u32> {
        self.noise.reseed_for_page(page);
        let offset = self.page_offset(page);

        let mut terrain = self.base_pass(offset);

        match biome {
            Biome::Forest => {}
            Biome::Mountain => {
                let layer = self.config.mountain_peaks.clone();
                self.add_peak_layer(&mut terrain, offset, &layer, 1.0);
                median_filter_in_place(&mut terrain, self.config.mountain_window);
            }
            Biome::Fungi => {
                let layer = self.config.fungi_bumps.clone();
                self.add_peak_layer(&mut terrain, offset, &layer, 1.0);
                median_filter_in_place(&mut terrain, self.config.fungi_window);
                self.stamp_plateaus(&mut terrain);
            }
            Biome::Ice => {
                let scale = remap(
                    temperature,
                    0.0,
                    self.classifier.floor_temperature(),
                    0.0,
                    self.config.ice_max_scale,
                    true,
                );
                let layer = self.config.ice_spikes.clone();
                self.add_peak_layer(&mut terrain, offset, &layer, scale);
                self.dig_pits(&mut terrain);
            }
        }

        log::debug!("generated terrain for page {page} ({biome}, {temperature:.1}C)");
        terrain
    }

    /// Low-frequency quantized noise, smoothed with the wide window.
    fn base_pass(&self, offset: i64) -> Tilemap<u32> {
        let layer = &self.config.base;
        let mut terrain = Tilemap::new_with(self.map_width, self.map_height, 0u32);
        for (x, y, cell) in terrain.iter_mut() {
            let e = self.sample(layer, offset, x, y);
            *cell = e.ceil().max(0.0) as u32;
        }
        median_filter_in_place(&mut terrain, self.config.base_window);
        terrain
    }

    /// Add `ceil((e - threshold) * scale)` wherever the layer exceeds its threshold.
    fn add_peak_layer(&self, terrain: &mut Tilemap<u32>, offset: i64, layer: &NoiseLayer, scale: f64) {
        for (x, y, cell) in terrain.iter_mut() {
            let e = self.sample(layer, offset, x, y);
            if e >= layer.threshold {
                *cell += ((e - layer.threshold) * scale).ceil().max(0.0) as u32;
            }
        }
    }

    fn sample(&self, layer: &NoiseLayer, offset: i64, x: usize, y: usize) -> f64 {
        let wx = offset.saturating_add(x as i64) as f64;
        self.noise.noise(
            wx / layer.scale + layer.shift,
            y as f64 / layer.scale + layer.shift,
        ) * layer.amplitude
    }

    /// Stamp raised 3x2 clumps at random positions.
    fn stamp_plateaus(&mut self, terrain: &mut Tilemap<u32>) {
        let (rise_min, rise_max) = self.config.fungi_plateau_rise;
        for _ in 0..self.config.fungi_plateaus {
            let x0 = self.noise.random_index(self.map_width) as i64;
            let y0 = self.noise.random_index(self.map_height) as i64;
            let rise = self.noise.random_range(rise_min as f64, rise_max as f64).floor() as u32;
            let h = *terrain.get(x0 as usize, y0 as usize) + rise;
            for y in y0..=y0 + 1 {
                for x in x0 - 1..=x0 + 1 {
                    if terrain.in_bounds(x, y) {
                        terrain.set(x as usize, y as usize, h);
                    }
                }
            }
        }
    }

    /// Knock random single cells down to sea level.
    fn dig_pits(&mut self, terrain: &mut Tilemap<u32>) {
        for _ in 0..self.config.ice_pits {
            let x = self.noise.random_index(self.map_width);
            let y = self.noise.random_index(self.map_height);
            terrain.set(x, y, 0);
        }
    }
}
