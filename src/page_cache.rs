//! Page cache for the endless scroll axis.
//!
//! Pages are generated lazily as the camera moves and kept in a contiguous
//! arena (`VecDeque`) that grows at either end. The visible window is always
//! exactly one page wide and is stitched from the page containing the offset
//! and its right neighbour.
//!
//! Generation is a pure function of the page index, so an optional eviction
//! radius can drop far pages; revisiting them regenerates identical content.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::biomes::{Biome, BiomeClassifier};
use crate::catalog::{RollTable, SpriteCatalog};
use crate::config::{SceneConfig, SceneGeometry};
use crate::heightmap::HeightFieldGenerator;
use crate::noise_field::NoiseField;
use crate::placement::{SpriteGrid, SpritePlacer};
use crate::seeds::WorldSeeds;
use crate::tilemap::Tilemap;

/// One generated slab of world space: columns `[index * width, (index + 1) * width)`.
#[derive(Clone, Debug)]
pub struct Page {
    pub index: i64,
    pub biome: Biome,
    pub temperature: f64,
    pub heights: Tilemap<u32>,
    pub sprites: SpriteGrid,
}

impl Page {
    fn memory_size(&self) -> usize {
        let cells = self.heights.width * self.heights.height;
        cells * (std::mem::size_of::<u32>() + std::mem::size_of::<Option<crate::catalog::SpriteId>>())
    }
}

/// Cache statistics for monitoring
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheStats {
    /// Lookups served without generating anything
    pub hits: usize,
    /// Pages generated
    pub misses: usize,
    /// Pages dropped by the eviction radius
    pub evictions: usize,
    /// Pages currently held
    pub page_count: usize,
    /// Estimated memory usage in bytes
    pub memory_bytes: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }

    /// Format as human-readable string
    pub fn summary(&self) -> String {
        format!(
            "Hits: {} ({:.0}%) | Generated: {} | Evicted: {} | Pages: {} | Mem: {:.1}KB",
            self.hits,
            self.hit_rate() * 100.0,
            self.misses,
            self.evictions,
            self.page_count,
            self.memory_bytes as f32 / 1024.0
        )
    }
}

// =============================================================================
// PAGE GENERATOR
// =============================================================================

/// Produces complete pages: biome, temperature, terrain and sprites.
pub struct PageGenerator {
    classifier: BiomeClassifier,
    terrain: HeightFieldGenerator,
    placer: SpritePlacer,
    map_width: usize,
}

impl PageGenerator {
    pub fn new(config: &SceneConfig, seeds: &WorldSeeds, catalog: Arc<SpriteCatalog>, rolls: RollTable) -> Self {
        let geometry = config.canvas.geometry();
        let classifier = BiomeClassifier::new(
            NoiseField::new(seeds.noise, seeds.terrain),
            config.biome.clone(),
            geometry.ascii_width,
        );
        let terrain = HeightFieldGenerator::new(
            NoiseField::new(seeds.noise, seeds.terrain),
            classifier.clone(),
            config.terrain.clone(),
            &geometry,
        );
        let placer = SpritePlacer::new(
            NoiseField::new(seeds.noise, seeds.placement),
            config.placement.clone(),
            catalog,
            rolls,
        );
        Self {
            classifier,
            terrain,
            placer,
            map_width: geometry.map_width,
        }
    }

    pub fn classifier(&self) -> &BiomeClassifier {
        &self.classifier
    }

    pub fn rolls(&self) -> &RollTable {
        self.placer.rolls()
    }

    /// Swap the placement rolls. Pages generated before the swap keep the
    /// sprites they were built with.
    pub fn set_rolls(&mut self, rolls: RollTable) {
        self.placer.set_rolls(rolls);
    }

    pub fn generate(&mut self, index: i64) -> Page {
        let offset = index.saturating_mul(self.map_width as i64);
        let biome = self.classifier.biome(offset);
        let temperature = self.classifier.temperature(offset);
        let heights = self.terrain.generate_for(index, biome, temperature);
        let sprites = self.placer.place(&heights, index, offset, biome, temperature);
        Page {
            index,
            biome,
            temperature,
            heights,
            sprites,
        }
    }
}

// =============================================================================
// PAGE CACHE
// =============================================================================

pub struct PageCache {
    generator: PageGenerator,
    pages: VecDeque<Page>,
    /// Index of `pages[0]`
    page_start: i64,
    map_width: usize,
    map_height: usize,
    /// Keep only pages within this many pages of the visible pair
    radius: Option<usize>,
    stats: CacheStats,
}

impl PageCache {
    pub fn new(generator: PageGenerator, geometry: &SceneGeometry, radius: Option<usize>) -> Self {
        Self {
            generator,
            pages: VecDeque::new(),
            page_start: 0,
            map_width: geometry.map_width,
            map_height: geometry.map_height,
            radius,
            stats: CacheStats::default(),
        }
    }

    /// Page containing a world column.
    pub fn page_of(&self, offset: i64) -> i64 {
        offset.div_euclid(self.map_width as i64)
    }

    /// Inclusive range of generated page indices, if any.
    pub fn page_range(&self) -> Option<(i64, i64)> {
        if self.pages.is_empty() {
            None
        } else {
            Some((self.page_start, self.page_start + self.pages.len() as i64 - 1))
        }
    }

    pub fn page(&self, index: i64) -> Option<&Page> {
        let slot = index.checked_sub(self.page_start)?;
        if slot < 0 {
            return None;
        }
        self.pages.get(slot as usize)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn classifier(&self) -> &BiomeClassifier {
        self.generator.classifier()
    }

    pub fn rolls(&self) -> &RollTable {
        self.generator.rolls()
    }

    /// Replace the placement rolls and drop every cached page so the new
    /// set applies to everything drawn from now on.
    pub fn set_rolls(&mut self, rolls: RollTable) {
        self.generator.set_rolls(rolls);
        self.stats.evictions += self.pages.len();
        self.pages.clear();
        self.stats.page_count = 0;
        self.stats.memory_bytes = 0;
    }

    /// Make sure the page holding `offset` and its right neighbour exist.
    /// Returns the number of pages generated.
    pub fn ensure_covers(&mut self, offset: i64) -> usize {
        let first = self.page_of(offset);
        let last = first + 1;
        let mut generated = 0;

        if let (Some(_), Some(radius)) = (self.page_range(), self.radius) {
            let (start, end) = (self.page_start, self.page_start + self.pages.len() as i64 - 1);
            let reach = radius as i64;
            if last < start.saturating_sub(reach) || first > end.saturating_add(reach) {
                // A jump far outside the window: start over rather than fill the gap
                self.stats.evictions += self.pages.len();
                self.pages.clear();
            }
        }

        if self.pages.is_empty() {
            self.page_start = first;
            let page = self.generator.generate(first);
            self.pages.push_back(page);
            generated += 1;
        }
        while self.page_start > first {
            let page = self.generator.generate(self.page_start - 1);
            self.pages.push_front(page);
            self.page_start -= 1;
            generated += 1;
        }
        while self.page_start + (self.pages.len() as i64) - 1 < last {
            let index = self.page_start + self.pages.len() as i64;
            let page = self.generator.generate(index);
            self.pages.push_back(page);
            generated += 1;
        }

        if generated == 0 {
            self.stats.hits += 1;
        } else {
            self.stats.misses += generated;
            log::debug!("generated {generated} page(s) to cover offset {offset}");
        }

        self.evict(first, last);
        self.stats.page_count = self.pages.len();
        self.stats.memory_bytes = self.pages.iter().map(Page::memory_size).sum();
        generated
    }

    fn evict(&mut self, first: i64, last: i64) {
        let Some(radius) = self.radius else {
            return;
        };
        let keep_from = first.saturating_sub(radius as i64);
        let keep_to = last.saturating_add(radius as i64);
        while self.page_start < keep_from && !self.pages.is_empty() {
            self.pages.pop_front();
            self.page_start += 1;
            self.stats.evictions += 1;
        }
        while self.page_start + self.pages.len() as i64 - 1 > keep_to {
            self.pages.pop_back();
            self.stats.evictions += 1;
        }
    }

    /// Stitched one-page-wide height and sprite windows starting at `offset`.
    /// Counts as a single cache lookup.
    pub fn window(&mut self, offset: i64) -> (Tilemap<u32>, SpriteGrid) {
        self.ensure_covers(offset);
        (
            self.stitch(offset, 0u32, |page| &page.heights),
            self.stitch(offset, None, |page| &page.sprites),
        )
    }

    fn stitch<T: Clone>(&self, offset: i64, fill: T, select: impl Fn(&Page) -> &Tilemap<T>) -> Tilemap<T> {
        let first = self.page_of(offset);
        let local = offset.rem_euclid(self.map_width as i64) as usize;
        let head = self.map_width - local;

        let mut window = Tilemap::new_with(self.map_width, self.map_height, fill);
        if let Some(page) = self.page(first) {
            select(page).copy_columns_into(local, head, &mut window, 0);
        }
        if local > 0 {
            if let Some(page) = self.page(first + 1) {
                select(page).copy_columns_into(0, local, &mut window, head);
            }
        }
        window
    }
}
