//! Sprite placement over one page of terrain.
//!
//! Placement works in three steps:
//! 1. a plateau map measures how much flat ground surrounds every cell
//! 2. cells are visited in a shuffled order and hit with a density-noise roll
//! 3. a hit draws from the biome's weighted catalog until a sprite fits, then
//!    claims a square exclusion zone around the cell
//!
//! A sprite is accepted only if its own zone is also free of earlier anchors,
//! so no two placements ever sit inside each other's zones.

use std::sync::Arc;

use crate::biomes::Biome;
use crate::catalog::{RollTable, SpriteCatalog, SpriteId};
use crate::config::{CoefficientRamp, PlacementConfig};
use crate::noise_field::{remap, NoiseField};
use crate::tilemap::Tilemap;

/// Grid of placed sprites, anchored at the cell they were placed on.
pub type SpriteGrid = Tilemap<Option<SpriteId>>;

/// Per-cell plateau size: the minimum of the equal-height run lengths found
/// scanning up, left and right from the cell.
///
/// Runs stop at the page edge; cells beyond it never extend a run.
pub fn plateau_map(heights: &Tilemap<u32>) -> Tilemap<u32> {
    let (w, h) = (heights.width, heights.height);
    let mut up = Tilemap::new_with(w, h, 0u32);
    let mut left = Tilemap::new_with(w, h, 0u32);
    let mut right = Tilemap::new_with(w, h, 0u32);

    for y in 0..h {
        for x in 0..w {
            let here = *heights.get(x, y);
            if y > 0 && *heights.get(x, y - 1) == here {
                let run = *up.get(x, y - 1) + 1;
                up.set(x, y, run);
            }
            if x > 0 && *heights.get(x - 1, y) == here {
                let run = *left.get(x - 1, y) + 1;
                left.set(x, y, run);
            }
        }
        for x in (0..w.saturating_sub(1)).rev() {
            if *heights.get(x + 1, y) == *heights.get(x, y) {
                let run = *right.get(x + 1, y) + 1;
                right.set(x, y, run);
            }
        }
    }

    let mut plateau = Tilemap::new_with(w, h, 0u32);
    for (x, y, cell) in plateau.iter_mut() {
        *cell = (*up.get(x, y)).min(*left.get(x, y)).min(*right.get(x, y));
    }
    plateau
}

/// Places catalog sprites onto terrain pages.
pub struct SpritePlacer {
    noise: NoiseField,
    config: PlacementConfig,
    catalog: Arc<SpriteCatalog>,
    rolls: RollTable,
}

impl SpritePlacer {
    pub fn new(noise: NoiseField, config: PlacementConfig, catalog: Arc<SpriteCatalog>, rolls: RollTable) -> Self {
        Self {
            noise,
            config,
            catalog,
            rolls,
        }
    }

    pub fn rolls(&self) -> &RollTable {
        &self.rolls
    }

    pub fn set_rolls(&mut self, rolls: RollTable) {
        self.rolls = rolls;
    }

    /// Density multiplier for a biome at a temperature.
    pub fn coefficient(&self, biome: Biome, temperature: f64) -> f64 {
        let ramp: &CoefficientRamp = match biome {
            Biome::Mountain => &self.config.mountain,
            Biome::Forest => &self.config.forest,
            Biome::Fungi => &self.config.fungi,
            Biome::Ice => &self.config.ice,
        };
        remap(
            temperature,
            ramp.from_temperature,
            ramp.to_temperature,
            ramp.from_coefficient,
            ramp.to_coefficient,
            true,
        )
    }

    /// Place sprites on one page. `offset` is the world column of the page's
    /// first column.
    pub fn place(
        &mut self,
        heights: &Tilemap<u32>,
        page: i64,
        offset: i64,
        biome: Biome,
        temperature: f64,
    ) -> SpriteGrid {
        self.noise.reseed_for_page(page);
        let (w, h) = (heights.width, heights.height);
        let mut sprites: SpriteGrid = Tilemap::new_with(w, h, None);

        let Some(roll) = self.rolls.roll(biome) else {
            return sprites;
        };

        let plateau = plateau_map(heights);
        let coefficient = self.coefficient(biome, temperature);
        let mut occupied = Tilemap::new_with(w, h, false);

        let mut order: Vec<(usize, usize)> = (0..h).flat_map(|y| (0..w).map(move |x| (x, y))).collect();
        self.noise.shuffle(&mut order);

        let mut placed = 0usize;
        for (x, y) in order {
            if *occupied.get(x, y) {
                continue;
            }
            let wx = offset.saturating_add(x as i64) as f64;
            let density = self
                .noise
                .noise(wx / self.config.density_scale, y as f64 / self.config.density_scale)
                * coefficient;
            if self.noise.random() >= density {
                continue;
            }

            for _ in 0..self.config.max_draws {
                let Some(id) = roll.draw(&mut self.noise) else {
                    break;
                };
                let Some(def) = self.catalog.get(id) else {
                    continue;
                };
                if def.min_dist > *plateau.get(x, y) {
                    continue;
                }
                let radius = def.exclusion_radius() as i64;
                if zone_holds_anchor(&sprites, x, y, radius) {
                    continue;
                }
                sprites.set(x, y, Some(id));
                mark_zone(&mut occupied, x, y, radius);
                placed += 1;
                break;
            }
        }

        log::debug!("placed {placed} sprites on page {page} ({biome})");
        sprites
    }
}

fn zone_cells(width: usize, height: usize, x: usize, y: usize, radius: i64) -> impl Iterator<Item = (usize, usize)> {
    let (x, y) = (x as i64, y as i64);
    let x0 = (x - radius).max(0) as usize;
    let y0 = (y - radius).max(0) as usize;
    let x1 = (x + radius).min(width as i64 - 1) as usize;
    let y1 = (y + radius).min(height as i64 - 1) as usize;
    (y0..=y1).flat_map(move |zy| (x0..=x1).map(move |zx| (zx, zy)))
}

fn zone_holds_anchor(sprites: &SpriteGrid, x: usize, y: usize, radius: i64) -> bool {
    zone_cells(sprites.width, sprites.height, x, y, radius).any(|(zx, zy)| sprites.get(zx, zy).is_some())
}

fn mark_zone(occupied: &mut Tilemap<bool>, x: usize, y: usize, radius: i64) {
    for (zx, zy) in zone_cells(occupied.width, occupied.height, x, y, radius) {
        occupied.set(zx, zy, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SpriteDefinition;
    use std::path::PathBuf;

    fn flat_catalog(min_dists: &[u32]) -> Arc<SpriteCatalog> {
        let defs = min_dists
            .iter()
            .enumerate()
            .map(|(i, &min_dist)| SpriteDefinition {
                name: format!("rock {i}"),
                image: PathBuf::from(format!("rock{i}.png")),
                biome: Biome::Forest,
                width: 4,
                height: 2,
                min_dist,
                weight: 1,
            })
            .collect();
        Arc::new(SpriteCatalog::new(defs).unwrap())
    }

    fn placer(catalog: Arc<SpriteCatalog>, seed: u64) -> SpritePlacer {
        let rolls = RollTable::new(&catalog, |_| true);
        let config = PlacementConfig {
            // saturate density so every free cell gets a roll
            forest: CoefficientRamp {
                from_temperature: 0.0,
                to_temperature: 1.0,
                from_coefficient: 2.0,
                to_coefficient: 2.0,
            },
            ..PlacementConfig::default()
        };
        SpritePlacer::new(NoiseField::new(seed, seed + 1), config, catalog, rolls)
    }

    #[test]
    fn test_plateau_map_measures_runs() {
        let heights = Tilemap::from_rows(vec![
            vec![1, 1, 1, 1],
            vec![1, 1, 1, 1],
            vec![1, 1, 1, 1],
            vec![1, 1, 2, 1],
        ]);
        let plateau = plateau_map(&heights);

        // edge cells have no run on at least one side
        assert_eq!(*plateau.get(0, 2), 0);
        assert_eq!(*plateau.get(1, 0), 0);
        // (1, 2): up 2, left 1, right 2
        assert_eq!(*plateau.get(1, 2), 1);
        assert_eq!(*plateau.get(2, 3), 0);
    }

    #[test]
    fn test_single_column_page_has_no_plateau() {
        let heights = Tilemap::new_with(1, 12, 0u32);
        let plateau = plateau_map(&heights);
        assert!(plateau.iter().all(|(_, _, &d)| d == 0));

        let mut placer = placer(flat_catalog(&[1, 2, 5]), 3);
        let sprites = placer.place(&heights, 0, 0, Biome::Forest, 20.0);
        assert!(sprites.iter().all(|(_, _, s)| s.is_none()));
    }

    #[test]
    fn test_placements_respect_each_others_zones() {
        let catalog = flat_catalog(&[0, 2, 4, 6]);
        let mut placer = placer(catalog.clone(), 7);
        let heights = Tilemap::new_with(40, 30, 3u32);
        let sprites = placer.place(&heights, 2, 80, Biome::Forest, 20.0);

        let anchors: Vec<(i64, i64, i64)> = sprites
            .iter()
            .filter_map(|(x, y, s)| {
                s.map(|id| {
                    let radius = catalog.get(id).map_or(0, |d| d.exclusion_radius()) as i64;
                    (x as i64, y as i64, radius)
                })
            })
            .collect();
        assert!(anchors.len() > 1);

        for (i, &(ax, ay, ar)) in anchors.iter().enumerate() {
            for &(bx, by, _) in anchors.iter().skip(i + 1) {
                let inside = (ax - bx).abs() <= ar && (ay - by).abs() <= ar;
                assert!(!inside, "({bx},{by}) inside zone of ({ax},{ay})");
            }
            for &(bx, by, br) in anchors.iter().take(i) {
                let inside = (ax - bx).abs() <= br && (ay - by).abs() <= br;
                assert!(!inside, "({ax},{ay}) inside zone of ({bx},{by})");
            }
        }
    }

    #[test]
    fn test_placement_is_deterministic_per_page() {
        let catalog = flat_catalog(&[0, 1, 3]);
        let heights = Tilemap::new_with(20, 20, 1u32);
        let mut a = placer(catalog.clone(), 11);
        let mut b = placer(catalog, 11);

        let first = a.place(&heights, 4, 400, Biome::Forest, 15.0);
        b.place(&heights, 9, 900, Biome::Forest, 15.0);
        assert_eq!(first, b.place(&heights, 4, 400, Biome::Forest, 15.0));
    }

    #[test]
    fn test_biome_without_sprites_stays_empty() {
        let mut placer = placer(flat_catalog(&[0]), 1);
        let heights = Tilemap::new_with(10, 10, 0u32);
        let sprites = placer.place(&heights, 0, 0, Biome::Ice, -10.0);
        assert!(sprites.iter().all(|(_, _, s)| s.is_none()));
    }

    #[test]
    fn test_swapped_rolls_take_effect() {
        let catalog = flat_catalog(&[0, 0, 0]);
        let mut placer = placer(Arc::clone(&catalog), 3);
        let heights = Tilemap::new_with(40, 30, 3u32);
        assert!(placer.place(&heights, 0, 0, Biome::Forest, 20.0).iter().any(|(_, _, s)| s.is_some()));

        placer.set_rolls(RollTable::new(&catalog, |id| id == SpriteId(1)));
        assert!(!placer.rolls().contains(SpriteId(0)));
        let sprites = placer.place(&heights, 0, 0, Biome::Forest, 20.0);
        let placed: Vec<SpriteId> = sprites.iter().filter_map(|(_, _, s)| *s).collect();
        assert!(!placed.is_empty());
        assert!(placed.iter().all(|&id| id == SpriteId(1)));
    }

    #[test]
    fn test_coefficients_follow_temperature() {
        let catalog = Arc::new(SpriteCatalog::builtin());
        let rolls = RollTable::new(&catalog, |_| true);
        let placer = SpritePlacer::new(NoiseField::new(0, 0), PlacementConfig::default(), catalog, rolls);

        assert!(placer.coefficient(Biome::Forest, 30.0) > placer.coefficient(Biome::Forest, 5.0));
        assert!(placer.coefficient(Biome::Ice, -40.0) < placer.coefficient(Biome::Ice, -5.0));
        assert_eq!(placer.coefficient(Biome::Mountain, 12.0), 1.0);
        assert!((placer.coefficient(Biome::Fungi, 0.0) - 0.2).abs() < 1e-9);
    }
}
