//! Coherent noise and seeded uniform randomness shared by every generator.
//!
//! `noise()` is a pure function of its inputs and the seed. `random()` advances
//! an internal ChaCha stream, which is rewound with [`NoiseField::reseed`] or
//! moved onto a page-specific stream with [`NoiseField::reseed_for_page`].

use noise::{NoiseFn, Perlin};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// =============================================================================
// NOISE PARAMETERS
// =============================================================================

const OCTAVES: u32 = 4;
const PERSISTENCE: f64 = 0.5;
const LACUNARITY: f64 = 2.0;

/// Perlin is identically zero on its integer lattice; shifting inputs off it
/// keeps sample points like `offset / 2 + 20` from collapsing to 0.5.
const LATTICE_SHIFT: [f64; 2] = [0.318_309_886, 0.707_106_781];

/// Inputs are folded into `[0, NOISE_PERIOD)` past this magnitude. Perlin
/// converts lattice coordinates to `isize` and cannot take arbitrarily large
/// points; folding keeps every octave well inside that range.
const NOISE_PERIOD: f64 = 1_099_511_627_776.0;

/// Largest value `noise()` / `random()` may return.
const MAX_UNIT: f64 = 1.0 - f64::EPSILON;

/// Seeded coherent-noise function plus a seeded uniform random source.
#[derive(Clone)]
pub struct NoiseField {
    stream_seed: u64,
    perlin: Perlin,
    rng: ChaCha8Rng,
}

impl NoiseField {
    /// `noise_seed` fixes the coherent field; `stream_seed` fixes the random stream.
    pub fn new(noise_seed: u64, stream_seed: u64) -> Self {
        Self {
            stream_seed,
            perlin: Perlin::new(noise_seed as u32),
            rng: ChaCha8Rng::seed_from_u64(stream_seed),
        }
    }

    /// 2-D coherent noise in `[0, 1)`.
    pub fn noise(&self, x: f64, y: f64) -> f64 {
        let v = fbm(&self.perlin, fold(x) + LATTICE_SHIFT[0], fold(y) + LATTICE_SHIFT[1]);
        ((v + 1.0) * 0.5).clamp(0.0, MAX_UNIT)
    }

    /// 1-D coherent noise in `[0, 1)`.
    pub fn noise1(&self, x: f64) -> f64 {
        self.noise(x, 0.0)
    }

    /// Uniform sample in `[0, 1)`. Advances the stream.
    pub fn random(&mut self) -> f64 {
        self.rng.gen::<f64>().min(MAX_UNIT)
    }

    /// Uniform sample in `[lo, hi)`. Advances the stream.
    pub fn random_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.random() * (hi - lo)
    }

    /// Uniform index in `[0, n)`. Advances the stream.
    pub fn random_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n.max(1))
    }

    /// Fisher-Yates shuffle driven by the stream.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Rewind the random stream to its initial state. Noise is unaffected.
    pub fn reseed(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.stream_seed);
    }

    /// Switch to the random stream dedicated to one page: same key, stream
    /// number taken from the page index.
    pub fn reseed_for_page(&mut self, page: i64) {
        self.rng = ChaCha8Rng::seed_from_u64(self.stream_seed);
        self.rng.set_stream(page as u64);
    }
}

fn fold(v: f64) -> f64 {
    if v.abs() < NOISE_PERIOD {
        v
    } else {
        v.rem_euclid(NOISE_PERIOD)
    }
}

/// Fractional Brownian Motion noise, normalized to roughly `[-1, 1]`.
fn fbm(noise: &impl NoiseFn<f64, 2>, x: f64, y: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..OCTAVES {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= PERSISTENCE;
        frequency *= LACUNARITY;
    }

    total / max_value
}

/// Linearly remap `value` from `[in_lo, in_hi]` to `[out_lo, out_hi]`,
/// optionally clamping to the output range. Inverted ranges are allowed.
pub fn remap(value: f64, in_lo: f64, in_hi: f64, out_lo: f64, out_hi: f64, clamp: bool) -> f64 {
    if (in_hi - in_lo).abs() < f64::EPSILON {
        return out_lo;
    }
    let mapped = out_lo + (value - in_lo) / (in_hi - in_lo) * (out_hi - out_lo);
    if clamp {
        let (lo, hi) = if out_lo <= out_hi { (out_lo, out_hi) } else { (out_hi, out_lo) };
        mapped.clamp(lo, hi)
    } else {
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_pure_and_in_unit_range() {
        let field = NoiseField::new(3, 4);
        for i in 0..200 {
            let x = i as f64 * 0.37 - 20.0;
            let y = i as f64 * 0.11;
            let a = field.noise(x, y);
            assert!((0.0..1.0).contains(&a));
            assert_eq!(a, field.noise(x, y));
        }
    }

    #[test]
    fn test_noise_varies_on_integer_inputs() {
        let field = NoiseField::new(0, 0);
        let samples: Vec<f64> = (0..16).map(|i| field.noise1(i as f64 + 20.0)).collect();
        assert!(samples.iter().any(|v| (v - 0.5).abs() > 1e-6));
    }

    #[test]
    fn test_reseed_rewinds_stream() {
        let mut field = NoiseField::new(1, 2);
        let first: Vec<f64> = (0..5).map(|_| field.random()).collect();
        field.reseed();
        let second: Vec<f64> = (0..5).map(|_| field.random()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_streams_do_not_depend_on_history() {
        let mut a = NoiseField::new(1, 2);
        let mut b = NoiseField::new(1, 2);
        for _ in 0..17 {
            b.random();
        }
        a.reseed_for_page(5);
        b.reseed_for_page(5);
        assert_eq!(a.random(), b.random());
    }

    #[test]
    fn test_neighbouring_pages_get_distinct_streams() {
        let mut field = NoiseField::new(1, 42);
        let mut draws = Vec::new();
        for page in [-1, 0, 1] {
            field.reseed_for_page(page);
            draws.push(field.random());
        }
        assert_ne!(draws[0], draws[1]);
        assert_ne!(draws[1], draws[2]);
        assert_ne!(draws[0], draws[2]);

        field.reseed();
        let base = field.random();
        field.reseed_for_page(0);
        assert_eq!(field.random(), base);
    }

    #[test]
    fn test_noise_accepts_extreme_coordinates() {
        let field = NoiseField::new(9, 9);
        for x in [i64::MAX as f64, i64::MIN as f64, 4.6e18 + 20.0, -1e30] {
            let v = field.noise(x, 3.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_remap_clamps_inverted_ranges() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(close(remap(-20.0, 0.0, -40.0, 1.0, 0.2, true), 0.6));
        assert!(close(remap(-80.0, 0.0, -40.0, 1.0, 0.2, true), 0.2));
        assert!(close(remap(10.0, 0.0, -40.0, 1.0, 0.2, true), 1.0));
        assert!(close(remap(45.0, 0.0, 30.0, 0.0, 1.0, false), 1.5));
    }
}
