//! Sprite catalog and weighted selection
//!
//! The catalog is loaded once at startup and never changes afterwards. Each
//! biome has its own list of definitions; a definition is placeable only once
//! its glyphs have been compiled, so roll tables are built from the subset the
//! caller reports as available.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::biomes::Biome;
use crate::error::ConfigError;
use crate::noise_field::NoiseField;

/// Index of a definition inside its catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteId(pub u16);

/// An immutable catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteDefinition {
    pub name: String,
    /// Source image, relative to the asset directory
    pub image: PathBuf,
    pub biome: Biome,
    /// Glyph columns
    pub width: usize,
    /// Glyph rows
    pub height: usize,
    /// Plateau size the cell must offer before this sprite fits
    pub min_dist: u32,
    /// Relative placement frequency
    pub weight: u32,
}

impl SpriteDefinition {
    /// Radius of the square exclusion zone marked around a placement.
    pub fn exclusion_radius(&self) -> u32 {
        (self.min_dist as f64 * 0.5).round() as u32
    }
}

/// All sprite definitions, addressed by [`SpriteId`].
#[derive(Clone, Debug, Default)]
pub struct SpriteCatalog {
    definitions: Vec<SpriteDefinition>,
}

#[derive(Deserialize)]
struct CatalogFile {
    sprites: Vec<SpriteDefinition>,
}

/// Largest catalog a [`SpriteId`] can index.
pub const MAX_SPRITES: usize = u16::MAX as usize + 1;

impl SpriteCatalog {
    pub fn new(definitions: Vec<SpriteDefinition>) -> Result<Self, ConfigError> {
        if definitions.len() > MAX_SPRITES {
            return Err(ConfigError::TooManySprites(definitions.len()));
        }
        Ok(Self { definitions })
    }

    /// Load a catalog from `{ "sprites": [ ... ] }` JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded {} sprite definitions from {}", file.sprites.len(), path.display());
        Self::new(file.sprites)
    }

    /// The built-in catalog of forest, fungi, mountain and ice sprites.
    pub fn builtin() -> Self {
        let definitions = BUILTIN_SPRITES
            .iter()
            .map(|&(biome, name, width, height, min_dist, weight)| SpriteDefinition {
                name: name.to_string(),
                image: PathBuf::from(biome.name()).join(format!("{name}.png")),
                biome,
                width,
                height,
                min_dist,
                weight,
            })
            .collect();
        Self { definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, id: SpriteId) -> Option<&SpriteDefinition> {
        self.definitions.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpriteId, &SpriteDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (SpriteId(i as u16), def))
    }

    pub fn for_biome(&self, biome: Biome) -> impl Iterator<Item = (SpriteId, &SpriteDefinition)> {
        self.iter().filter(move |(_, def)| def.biome == biome)
    }
}

// =============================================================================
// WEIGHTED ROLL
// =============================================================================

/// Cumulative-weight sampler over one biome's placeable definitions.
#[derive(Clone, Debug, Default)]
pub struct WeightedRoll {
    ids: Vec<SpriteId>,
    /// Running weight total, one entry per id
    cumulative: Vec<u64>,
}

impl WeightedRoll {
    pub fn new(entries: impl IntoIterator<Item = (SpriteId, u32)>) -> Self {
        let mut ids = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0u64;
        for (id, weight) in entries {
            if weight == 0 {
                continue;
            }
            total += weight as u64;
            ids.push(id);
            cumulative.push(total);
        }
        Self { ids, cumulative }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Draw one id with probability proportional to its weight.
    pub fn draw(&self, noise: &mut NoiseField) -> Option<SpriteId> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let roll = ((noise.random() * total as f64) as u64).min(total - 1);
        let slot = self.cumulative.partition_point(|&c| c <= roll);
        self.ids.get(slot).copied()
    }
}

/// Per-biome weighted rolls.
#[derive(Clone, Debug, Default)]
pub struct RollTable {
    rolls: HashMap<Biome, WeightedRoll>,
}

impl RollTable {
    /// Build rolls from the definitions for which `available` returns true.
    pub fn new(catalog: &SpriteCatalog, available: impl Fn(SpriteId) -> bool) -> Self {
        let rolls = Biome::all()
            .iter()
            .map(|&biome| {
                let roll = WeightedRoll::new(
                    catalog
                        .for_biome(biome)
                        .filter(|(id, _)| available(*id))
                        .map(|(id, def)| (id, def.weight)),
                );
                (biome, roll)
            })
            .collect();
        Self { rolls }
    }

    pub fn roll(&self, biome: Biome) -> Option<&WeightedRoll> {
        self.rolls.get(&biome).filter(|r| !r.is_empty())
    }

    /// Whether `id` can be drawn in any biome.
    pub fn contains(&self, id: SpriteId) -> bool {
        self.rolls.values().any(|roll| roll.ids.contains(&id))
    }
}

// =============================================================================
// BUILT-IN DEFINITIONS
// =============================================================================

/// (biome, name, glyph width, glyph height, min_dist, weight)
const BUILTIN_SPRITES: &[(Biome, &str, usize, usize, u32, u32)] = &[
    (Biome::Forest, "Autumn Maple 1", 36, 24, 5, 20),
    (Biome::Forest, "Autumn Maple 2", 48, 36, 6, 20),
    (Biome::Forest, "Autumn Maple 3", 24, 16, 3, 20),
    (Biome::Forest, "Autumn Maple 4", 30, 20, 4, 20),
    (Biome::Forest, "Iron-Rich Hematite 1", 16, 12, 1, 3),
    (Biome::Forest, "Mature Frond 1", 4, 3, 0, 20),
    (Biome::Forest, "Mature Frond 2", 8, 6, 0, 10),
    (Biome::Forest, "Mature Oak 2", 54, 42, 5, 10),
    (Biome::Forest, "Moss-Covered Log 1", 15, 8, 1, 2),
    (Biome::Forest, "Moss-Covered Log 2", 15, 8, 1, 2),
    (Biome::Forest, "Mossy Boulder 1", 15, 8, 3, 2),
    (Biome::Forest, "Quartz-Veined Granite 1", 8, 10, 1, 3),
    (Biome::Forest, "Withered Fern 1", 10, 5, 1, 15),
    (Biome::Forest, "Withered Fern 2", 8, 4, 1, 20),
    (Biome::Fungi, "Curled Fiddlehead 1", 6, 4, 1, 5),
    (Biome::Fungi, "Curled Fiddlehead 2", 8, 4, 1, 5),
    (Biome::Fungi, "Curled Fiddlehead 3", 7, 3, 1, 5),
    (Biome::Fungi, "Elf Cup 1", 30, 20, 5, 10),
    (Biome::Fungi, "Elf Cup 2", 20, 15, 4, 6),
    (Biome::Fungi, "Elf Cup 3", 8, 6, 1, 10),
    (Biome::Fungi, "Fly Agaric 1", 18, 12, 4, 6),
    (Biome::Fungi, "Fly Agaric 2", 24, 18, 3, 6),
    (Biome::Fungi, "Fungus-Covered Stone 1", 32, 24, 4, 2),
    (Biome::Fungi, "Fungus-Covered Stone 2", 32, 24, 4, 2),
    (Biome::Fungi, "Turkey Tail Fungi 1", 32, 20, 5, 3),
    (Biome::Fungi, "Turkey Tail Fungi 2", 32, 20, 5, 3),
    (Biome::Fungi, "Withered Fern 1", 10, 5, 1, 20),
    (Biome::Fungi, "Withered Fern 2", 8, 4, 1, 20),
    (Biome::Mountain, "Frost-Shattered Cliff Face 1", 20, 12, 3, 5),
    (Biome::Mountain, "Frost-Shattered Cliff Face 2", 15, 10, 5, 8),
    (Biome::Mountain, "Glacier Lily 1", 12, 8, 3, 10),
    (Biome::Mountain, "Glacier Lily 2", 10, 6, 2, 10),
    (Biome::Mountain, "Time-Lost Cairn 1", 12, 8, 2, 3),
    (Biome::Mountain, "Quartz-Veined Granite 1", 8, 10, 1, 8),
    (Biome::Mountain, "Autumn Maple 3", 24, 16, 3, 5),
    (Biome::Mountain, "Autumn Maple 4", 30, 20, 4, 3),
    (Biome::Mountain, "Quartzite Sentinel 1", 20, 15, 4, 8),
    (Biome::Ice, "Avalanche Debris 1", 16, 12, 6, 5),
    (Biome::Ice, "Avalanche Debris 2", 18, 13, 8, 8),
    (Biome::Ice, "Edelweiss Cluster 1", 14, 8, 4, 10),
    (Biome::Ice, "Edelweiss Cluster 2", 16, 10, 5, 10),
    (Biome::Ice, "Frost-Heaved Megalith 1", 15, 12, 5, 8),
    (Biome::Ice, "Frost-Shattered Cliff Face 1", 15, 12, 6, 5),
    (Biome::Ice, "Frost-Shattered Cliff Face 2", 20, 15, 8, 5),
    (Biome::Ice, "Glacier Lily 1", 12, 8, 3, 10),
    (Biome::Ice, "Glacier Lily 2", 10, 7, 2, 10),
    (Biome::Ice, "Hoarfrost Monolith 1", 34, 26, 12, 2),
    (Biome::Ice, "Lichen-Covered Boulder 1", 32, 24, 10, 2),
    (Biome::Ice, "Pressure Ridge 1", 20, 10, 6, 5),
    (Biome::Ice, "Stonecrop Succulent 1", 48, 30, 15, 1),
];
