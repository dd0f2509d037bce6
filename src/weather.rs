//! Snowfall overlay for frozen stretches of the world.
//!
//! Drawn over a finished frame; flakes live in screen space and carry over
//! between frames, so the overlay keeps its own random stream and never
//! touches terrain generation.

use crate::config::WeatherConfig;
use crate::noise_field::{remap, NoiseField};
use crate::render::OutputGrid;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snowflake {
    pub x: f64,
    pub y: f64,
    /// Rows fallen per frame
    pub speed: f64,
}

pub struct Snowfall {
    config: WeatherConfig,
    rng: NoiseField,
    flakes: Vec<Snowflake>,
}

impl Snowfall {
    pub fn new(config: WeatherConfig, rng: NoiseField) -> Self {
        Self {
            config,
            rng,
            flakes: Vec::new(),
        }
    }

    pub fn flakes(&self) -> &[Snowflake] {
        &self.flakes
    }

    /// Spawn, draw and advance flakes for one frame at the given temperature.
    /// Does nothing above freezing.
    pub fn apply(&mut self, grid: &mut OutputGrid, temperature: f64) {
        if !self.config.snow || temperature >= 0.0 {
            return;
        }
        let width = grid.width();
        let height = grid.height();
        if width == 0 || height == 0 {
            return;
        }

        let density = remap(temperature, 0.0, self.config.cold_limit, 0.0, self.config.max_density, true);
        let radius = remap(
            temperature,
            0.0,
            self.config.cold_limit,
            self.config.min_radius,
            self.config.max_radius,
            true,
        );

        let spawn = self.rng.random() * density * width as f64;
        let mut spawned = 0.0;
        while spawned < spawn {
            let x = self.rng.random_index(width) as f64;
            let speed = self.rng.random_range(0.5, 1.0);
            self.flakes.push(Snowflake { x, y: 0.0, speed });
            spawned += 1.0;
        }

        for flake in &self.flakes {
            draw_flake(grid, flake, radius);
        }

        let w = width as f64;
        for flake in &mut self.flakes {
            flake.x += self.rng.random() * 2.0 - 1.5;
            if flake.x < 0.0 {
                flake.x = w - 1.0;
            }
            if flake.x >= w {
                flake.x = 0.0;
            }
            flake.y += flake.speed;
        }
        self.flakes.retain(|f| f.y < height as f64);
    }
}

fn draw_flake(grid: &mut OutputGrid, flake: &Snowflake, radius: f64) {
    let x0 = (flake.x - radius).floor() as i64;
    let x1 = (flake.x + radius).floor() as i64;
    let y0 = (flake.y - radius).floor() as i64;
    let y1 = (flake.y + radius).floor() as i64;
    for col in x0..=x1 {
        for row in y0..=y1 {
            let (dx, dy) = (col as f64 - flake.x, row as f64 - flake.y);
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            if col >= 0 && row >= 0 && (col as usize) < grid.width() && (row as usize) < grid.height() {
                grid.set(col as usize, row as usize, '.');
            }
        }
    }
}
