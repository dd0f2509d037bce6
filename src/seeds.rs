//! Seed management for landscape generation
//!
//! Provides separate seeds for each generation system, so changing how one
//! system consumes randomness never shifts another.

use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

/// Seeds for all landscape generation systems.
///
/// Each system gets its own seed, derived from a master seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Coherent noise permutation (elevation, biome, density, brightness)
    pub noise: u64,
    /// Terrain RNG (fungi plateaus, ice pits); one ChaCha stream per page
    pub terrain: u64,
    /// Sprite placement RNG (visit order, hit rolls, catalog draws); one stream per page
    pub placement: u64,
    /// Weather overlay RNG (snowflakes); never feeds cached state
    pub weather: u64,
}

impl WorldSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            noise: derive_seed(master, "noise"),
            terrain: derive_seed(master, "terrain"),
            placement: derive_seed(master, "placement"),
            weather: derive_seed(master, "weather"),
        }
    }
}

/// Derive a sub-seed from a master seed and a system name.
/// Uses hashing to ensure different systems get different but deterministic seeds.
fn derive_seed(master: u64, system: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    system.hash(&mut hasher);
    hasher.finish()
}

/// Display format for seeds (useful for sharing landscape configurations)
impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, noise: {}, terrain: {}, placement: {}, weather: {} }}",
            self.master, self.noise, self.terrain, self.placement, self.weather,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        let seeds1 = WorldSeeds::from_master(12345);
        let seeds2 = WorldSeeds::from_master(12345);

        assert_eq!(seeds1, seeds2);
    }

    #[test]
    fn test_different_systems_get_different_seeds() {
        let seeds = WorldSeeds::from_master(12345);

        assert_ne!(seeds.noise, seeds.terrain);
        assert_ne!(seeds.terrain, seeds.placement);
        assert_ne!(seeds.placement, seeds.weather);
    }
}
