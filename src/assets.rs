//! Sprite asset loading and glyph compilation.
//!
//! An [`AssetProvider`] hands the compiler one grayscale raster per sprite
//! definition. Failures are expected (missing files, broken images) and only
//! remove the affected sprite from placement; they never abort startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, ImageBuffer, Luma};
use rayon::prelude::*;

use crate::catalog::{RollTable, SpriteCatalog, SpriteDefinition, SpriteId};
use crate::config::{CellSize, GlyphConfig};
use crate::error::AssetError;
use crate::glyphs::SpriteGlyphs;

/// Supplies decoded grayscale rasters for sprite definitions.
pub trait AssetProvider: Sync {
    fn load(&self, definition: &SpriteDefinition) -> Result<GrayImage, AssetError>;
}

/// Loads sprite images from a directory tree (`<root>/<biome>/<name>.png`).
pub struct DirectoryAssets {
    root: PathBuf,
    /// Source art is dark strokes on light paper; inverting makes strokes bright
    invert: bool,
}

impl DirectoryAssets {
    pub fn new(root: impl AsRef<Path>, invert: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            invert,
        }
    }
}

impl AssetProvider for DirectoryAssets {
    fn load(&self, definition: &SpriteDefinition) -> Result<GrayImage, AssetError> {
        let path = self.root.join(&definition.image);
        if !path.exists() {
            return Err(AssetError::Missing(path));
        }
        let mut image = image::open(&path)
            .map_err(|source| AssetError::Decode { path, source })?
            .to_luma8();
        if self.invert {
            imageops::invert(&mut image);
        }
        Ok(image)
    }
}

// =============================================================================
// SYNTHETIC SILHOUETTES
// =============================================================================

/// Draws simple procedural silhouettes so the scene renders without art files.
///
/// The silhouette kind is picked from the sprite name; shading is a fixed
/// function of the name hash, so every run produces the same glyphs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticAssets {
    cell: CellSize,
}

impl SyntheticAssets {
    pub fn new(cell: CellSize) -> Self {
        Self { cell }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Silhouette {
    Tree,
    Mushroom,
    Flower,
    Rock,
}

impl Silhouette {
    fn for_name(name: &str) -> Self {
        let name = name.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| name.contains(w));
        if any(&["maple", "oak", "frond", "fern", "fiddlehead"]) {
            Silhouette::Tree
        } else if any(&["agaric", "cup", "fungi", "fungus"]) {
            Silhouette::Mushroom
        } else if any(&["lily", "edelweiss", "succulent"]) {
            Silhouette::Flower
        } else {
            Silhouette::Rock
        }
    }

    /// Whether the normalised point (`u` across, `v` down, both in `[0, 1]`) is inside.
    fn covers(self, u: f32, v: f32) -> bool {
        let dx = u - 0.5;
        match self {
            Silhouette::Tree => {
                let canopy = v < 0.75 && dx.abs() < 0.5 * v / 0.75;
                let trunk = v >= 0.75 && dx.abs() < 0.08;
                canopy || trunk
            }
            Silhouette::Mushroom => {
                let cap = v < 0.5 && (dx * dx) / 0.25 + ((v - 0.5) * (v - 0.5)) / 0.25 < 1.0;
                let stem = v >= 0.5 && dx.abs() < 0.12;
                cap || stem
            }
            Silhouette::Flower => {
                let head = (dx * dx + (v - 0.3) * (v - 0.3)) < 0.06;
                let stem = v >= 0.3 && dx.abs() < 0.04;
                head || stem
            }
            Silhouette::Rock => {
                let dy = v - 0.65;
                (dx * dx) / 0.25 + (dy * dy) / 0.12 < 1.0
            }
        }
    }
}

fn name_hash(name: &str) -> u32 {
    name.bytes()
        .fold(2_166_136_261u32, |h, b| (h ^ b as u32).wrapping_mul(16_777_619))
}

impl AssetProvider for SyntheticAssets {
    fn load(&self, definition: &SpriteDefinition) -> Result<GrayImage, AssetError> {
        let (w, h) = self.cell.pixels(definition.width, definition.height);
        if w == 0 || h == 0 {
            return Err(AssetError::EmptyDefinition(definition.name.clone()));
        }
        let shape = Silhouette::for_name(&definition.name);
        let hash = name_hash(&definition.name);
        let base = 120 + (hash % 100) as u8;
        let stripe = 4 + hash % 6;

        Ok(ImageBuffer::from_fn(w, h, |x, y| {
            let u = x as f32 / w as f32;
            let v = y as f32 / h as f32;
            if !shape.covers(u, v) {
                return Luma([0u8]);
            }
            // darker bands give the fill ramp something to resolve
            let band = ((x + y) / stripe) % 3;
            Luma([base.saturating_sub(band as u8 * 30)])
        }))
    }
}

// =============================================================================
// GLYPH LIBRARY
// =============================================================================

/// Compiled glyphs for every sprite whose asset loaded.
#[derive(Clone, Debug, Default)]
pub struct GlyphLibrary {
    glyphs: HashMap<SpriteId, SpriteGlyphs>,
}

impl GlyphLibrary {
    /// Load and compile every catalog entry in parallel. Definitions whose
    /// asset fails are logged and left out.
    pub fn compile(
        catalog: &SpriteCatalog,
        provider: &dyn AssetProvider,
        cell: CellSize,
        config: &GlyphConfig,
    ) -> Self {
        let entries: Vec<(SpriteId, &SpriteDefinition)> = catalog.iter().collect();
        let results: Vec<(SpriteId, Result<SpriteGlyphs, AssetError>)> = entries
            .into_par_iter()
            .map(|(id, def)| (id, compile_sprite(def, provider, cell, config)))
            .collect();

        let mut library = Self::default();
        let mut failed = 0;
        for (id, result) in results {
            match result {
                Ok(glyphs) => library.insert(id, glyphs),
                Err(err) => {
                    failed += 1;
                    log::warn!("sprite {} excluded from placement: {err}", id.0);
                }
            }
        }
        log::info!("compiled {} sprite glyph sets ({failed} failed)", library.len());
        library
    }

    /// Add or replace one sprite's glyphs. Roll tables built earlier do not
    /// see the change; [`crate::driver::FrameDriver::add_glyphs`] rebuilds them.
    pub fn insert(&mut self, id: SpriteId, glyphs: SpriteGlyphs) {
        self.glyphs.insert(id, glyphs);
    }

    pub fn get(&self, id: SpriteId) -> Option<&SpriteGlyphs> {
        self.glyphs.get(&id)
    }

    pub fn contains(&self, id: SpriteId) -> bool {
        self.glyphs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Weighted rolls restricted to sprites that have glyphs.
    pub fn roll_table(&self, catalog: &SpriteCatalog) -> RollTable {
        RollTable::new(catalog, |id| self.contains(id))
    }
}

/// Load and compile a single definition.
pub fn compile_sprite(
    def: &SpriteDefinition,
    provider: &dyn AssetProvider,
    cell: CellSize,
    config: &GlyphConfig,
) -> Result<SpriteGlyphs, AssetError> {
    if def.width == 0 || def.height == 0 {
        return Err(AssetError::EmptyDefinition(def.name.clone()));
    }
    let image = provider.load(def)?;
    Ok(SpriteGlyphs::compile(&image, def.width, def.height, cell, config))
}
