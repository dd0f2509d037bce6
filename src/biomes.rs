//! Biome classification along the scroll axis
//!
//! Temperature is a bell-shaped envelope centred on offset 0 that decays
//! toward absolute zero as the camera travels away in either direction, with a
//! little coherent jitter on top. Cold regions are ice; warm regions are split
//! into mountain, forest and fungi by a second noise sample.
//!
//! Both functions are pure in the offset: pages are cached and never
//! invalidated, so the same offset must always classify the same way.

use serde::{Deserialize, Serialize};

use crate::config::BiomeConfig;
use crate::noise_field::NoiseField;

/// World region type governing terrain shape and sprite catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Mountain,
    Forest,
    Fungi,
    Ice,
}

impl Biome {
    pub fn all() -> &'static [Biome] {
        &[Biome::Mountain, Biome::Forest, Biome::Fungi, Biome::Ice]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Biome::Mountain => "mountain",
            Biome::Forest => "forest",
            Biome::Fungi => "fungi",
            Biome::Ice => "ice",
        }
    }

    /// Single-character tag used by debug output.
    pub fn symbol(&self) -> char {
        match self {
            Biome::Mountain => '^',
            Biome::Forest => 'T',
            Biome::Fungi => 'f',
            Biome::Ice => '#',
        }
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps a world offset to a temperature and a biome.
#[derive(Clone)]
pub struct BiomeClassifier {
    noise: NoiseField,
    config: BiomeConfig,
    /// Offsets are normalised by the output grid width before the envelope
    ascii_width: f64,
}

impl BiomeClassifier {
    pub fn new(noise: NoiseField, config: BiomeConfig, ascii_width: usize) -> Self {
        Self {
            noise,
            config,
            ascii_width: ascii_width.max(1) as f64,
        }
    }

    /// Lowest temperature the classifier can report.
    pub fn floor_temperature(&self) -> f64 {
        self.config.floor_temperature
    }

    /// Temperature envelope without jitter. Peaks at offset 0.
    pub fn base_temperature(&self, offset: i64) -> f64 {
        let x = offset as f64 / self.ascii_width;
        self.config.floor_temperature + (-x * x / self.config.decay_divisor).exp() * self.config.peak_rise
    }

    /// Temperature at an offset, never below the floor.
    pub fn temperature(&self, offset: i64) -> f64 {
        let x = offset as f64 / self.ascii_width;
        let jitter = self.noise.noise1(x) * self.config.jitter;
        (self.base_temperature(offset) + jitter).max(self.config.floor_temperature)
    }

    /// Biome at an offset.
    pub fn biome(&self, offset: i64) -> Biome {
        if self.temperature(offset) < 0.0 {
            return Biome::Ice;
        }
        let e = self
            .noise
            .noise1(offset as f64 * self.config.biome_noise_scale + self.config.biome_noise_shift);
        if e < self.config.mountain_below {
            Biome::Mountain
        } else if e < self.config.forest_below {
            Biome::Forest
        } else {
            Biome::Fungi
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> BiomeClassifier {
        BiomeClassifier::new(NoiseField::new(0, 0), BiomeConfig::default(), 504)
    }

    #[test]
    fn test_peak_temperature_at_origin() {
        let c = classifier();
        assert!((c.base_temperature(0) - 26.85).abs() < 1e-9);
        let t = c.temperature(0);
        assert!(t >= 26.85 && t < 36.85);
    }

    #[test]
    fn test_biome_is_pure() {
        let c = classifier();
        for offset in (-200_000..200_000).step_by(7919) {
            assert_eq!(c.biome(offset), c.biome(offset));
            assert_eq!(c.temperature(offset), c.temperature(offset));
        }
    }

    #[test]
    fn test_far_offsets_freeze() {
        let c = classifier();
        // 40 grid widths out the envelope is ~exp(-16): far below freezing
        assert_eq!(c.biome(504 * 40), Biome::Ice);
        assert_eq!(c.biome(-504 * 40), Biome::Ice);
        assert!(c.temperature(504 * 1000) >= -273.15);
    }

    #[test]
    fn test_warm_offsets_are_never_ice() {
        let c = classifier();
        for offset in (-1000..1000).step_by(125) {
            assert_ne!(c.biome(offset), Biome::Ice);
        }
    }

    #[test]
    fn test_envelope_is_symmetric() {
        let c = classifier();
        assert_eq!(c.base_temperature(3000), c.base_temperature(-3000));
        assert!(c.base_temperature(3000) < c.base_temperature(1000));
    }
}
