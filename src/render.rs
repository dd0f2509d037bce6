//! Isometric scene rasterizer.
//!
//! Terrain cells are drawn back to front (row ascending, column descending)
//! with a painter's algorithm: each cell stamps a tile top, edge strokes where
//! a neighbour is lower, and one wall segment per height unit. Wall and tile
//! interiors are stamped as placeholder cells first so later edge strokes can
//! tell "still only fill" apart from real strokes. A final pass turns the
//! placeholders into visible glyphs.

use crate::assets::GlyphLibrary;
use crate::config::{RenderConfig, SceneGeometry};
use crate::noise_field::{remap, NoiseField};
use crate::placement::SpriteGrid;
use crate::tilemap::Tilemap;

// Template placeholders
const TILE_FILL: char = 'A';
const WALL_SIDE: char = 'B';
const WALL_FRONT: char = 'C';

const TILE_TOP: &[&str] = &["_______"];
const TILE_LEFT: &[&str] = &["", "\\_", "  \\_", "    \\_"];
const TILE_RIGHT: &[&str] = &["", "       \\_", "         \\_", "           \\_"];
const TILE_BOTTOM: &[&str] = &["", "", "", "     _______"];
const TILE_FILLING: &[&str] = &["", "AAAAAAAAA", "  AAAAAAAAA", "     AAAAAAA"];

const PILLAR_LEFT: &[&str] = &["", "|", "|"];
const PILLAR_MID: &[&str] = &["", "", "", "", "      |", "      |"];
const PILLAR_RIGHT: &[&str] = &["", "", "", "", "             |", "             |"];
const PILLAR_LEFT_FILLING: &[&str] = &["", "", " BB", " BBBB", "   BBBB"];
const PILLAR_FRONT_FILLING: &[&str] = &["", "", "", "", "       CCCCCCC", "       CCCCCCC"];

/// One cell of the canvas while a frame is being composed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Char(char),
    /// Tile top interior
    TileFill,
    /// Left-facing wall interior
    WallSide,
    /// Front-facing wall interior
    WallFront,
}

impl Glyph {
    fn from_template(c: char) -> Self {
        match c {
            TILE_FILL => Glyph::TileFill,
            WALL_SIDE => Glyph::WallSide,
            WALL_FRONT => Glyph::WallFront,
            other => Glyph::Char(other),
        }
    }

    fn is_placeholder(self) -> bool {
        !matches!(self, Glyph::Char(_))
    }

    /// Visible glyph once composition is done.
    pub fn visible(self) -> char {
        match self {
            Glyph::Char(c) => c,
            Glyph::TileFill => ' ',
            Glyph::WallSide => '#',
            Glyph::WallFront => '.',
        }
    }
}

/// A finished frame: `ascii_width x ascii_height` glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputGrid {
    cells: Tilemap<char>,
}

impl OutputGrid {
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            cells: Tilemap::new_with(width, height, ' '),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.width
    }

    pub fn height(&self) -> usize {
        self.cells.height
    }

    pub fn get(&self, col: usize, row: usize) -> char {
        *self.cells.get(col, row)
    }

    pub fn set(&mut self, col: usize, row: usize, glyph: char) {
        self.cells.set(col, row, glyph);
    }

    pub fn row(&self, row: usize) -> &[char] {
        self.cells.row(row)
    }

    /// Newline-joined rows.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity((self.width() + 1) * self.height());
        for row in 0..self.height() {
            if row > 0 {
                text.push('\n');
            }
            text.extend(self.row(row));
        }
        text
    }
}

/// Draws stitched terrain and sprite windows onto an output grid.
pub struct SceneRasterizer {
    geometry: SceneGeometry,
    noise: NoiseField,
    config: RenderConfig,
}

impl SceneRasterizer {
    pub fn new(geometry: SceneGeometry, noise: NoiseField, config: RenderConfig) -> Self {
        Self {
            geometry,
            noise,
            config,
        }
    }

    pub fn geometry(&self) -> &SceneGeometry {
        &self.geometry
    }

    /// Render one frame. `offset` is the world column of the window's first column.
    pub fn render(&self, heights: &Tilemap<u32>, sprites: &SpriteGrid, offset: i64, library: &GlyphLibrary) -> OutputGrid {
        let g = &self.geometry;
        let mut canvas = Tilemap::new_with(g.ascii_width, g.ascii_height, Glyph::Char(' '));
        let height_at = |x: i64, y: i64| heights.get_or(x - g.x_min, y, 0) as i64;

        for y in 0..=g.y_max {
            for x in (g.x_min..=g.x_max).rev() {
                let h = height_at(x, y);
                let i = y * 3 - h * 2;
                let j = x * 7 + y * 6;

                stamp(&mut canvas, TILE_FILLING, i, j, true);
                if height_at(x, y - 1) != h {
                    stamp(&mut canvas, TILE_TOP, i, j, false);
                }
                if height_at(x, y + 1) < h {
                    stamp(&mut canvas, TILE_BOTTOM, i, j, true);
                }
                if height_at(x - 1, y) < h {
                    stamp(&mut canvas, TILE_LEFT, i, j, true);
                }
                if height_at(x + 1, y) != h {
                    stamp(&mut canvas, TILE_RIGHT, i, j, true);
                }

                let left = height_at(x - 1, y).max(height_at(x, y - 1));
                let mid = height_at(x - 1, y).max(height_at(x, y + 1));
                let right = height_at(x, y + 1).max(height_at(x + 1, y));

                for t in 0..=h {
                    stamp(&mut canvas, PILLAR_LEFT_FILLING, i + t * 2, j - 1, true);
                }
                for t in 0..=h {
                    stamp(&mut canvas, PILLAR_FRONT_FILLING, i + t * 2, j - 1, true);
                }
                for t in 0..h - left {
                    stamp(&mut canvas, PILLAR_LEFT, i + t * 2, j - 1, true);
                }
                for t in 0..h - mid {
                    stamp(&mut canvas, PILLAR_MID, i + t * 2, j - 1, true);
                }
                for t in 0..h - right {
                    stamp(&mut canvas, PILLAR_RIGHT, i + t * 2, j - 1, true);
                }
            }

            for x in (g.x_min..=g.x_max).rev() {
                let local = x - g.x_min;
                let Some(Some(id)) = sprites.get_signed(local, y) else {
                    continue;
                };
                let Some(glyphs) = library.get(*id) else {
                    continue;
                };
                let h = height_at(x, y);
                let i = y * 3 - h * 2;
                let j = x * 7 + y * 6;

                let brightness = self.brightness(offset.saturating_add(local), y);
                let composed = glyphs.compose(brightness);
                let top = i + 3 - composed.height as i64;
                let left = j + 6 - (composed.width as f64 / 2.0).round() as i64;
                for (k, t, &c) in composed.iter() {
                    put(&mut canvas, top + t as i64, left + k as i64, Glyph::Char(c), true);
                }
            }
        }

        let mut out = OutputGrid::blank(g.ascii_width, g.ascii_height);
        for (col, row, glyph) in canvas.iter() {
            out.set(col, row, glyph.visible());
        }
        out
    }

    /// Sprite brightness multiplier at a world column and row.
    pub fn brightness(&self, world_x: i64, y: i64) -> f64 {
        let scale = self.config.brightness_scale;
        let n = self.noise.noise(world_x as f64 / scale, y as f64 / scale);
        remap(n, 0.0, 1.0, self.config.brightness_min, self.config.brightness_max, false)
    }
}

fn stamp(canvas: &mut Tilemap<Glyph>, template: &[&str], row: i64, col: i64, cover: bool) {
    for (t, line) in template.iter().enumerate() {
        for (k, c) in line.chars().enumerate() {
            put(canvas, row + t as i64, col + k as i64, Glyph::from_template(c), cover);
        }
    }
}

/// Write one glyph. Spaces are transparent; without `cover` only
/// placeholders are overwritten.
fn put(canvas: &mut Tilemap<Glyph>, row: i64, col: i64, glyph: Glyph, cover: bool) {
    if glyph == Glyph::Char(' ') || !canvas.in_bounds(col, row) {
        return;
    }
    let cell = canvas.get_mut(col as usize, row as usize);
    if cover || cell.is_placeholder() {
        *cell = glyph;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SpriteId;
    use crate::config::CanvasConfig;
    use crate::glyphs::SpriteGlyphs;

    fn rasterizer() -> SceneRasterizer {
        SceneRasterizer::new(CanvasConfig::default().geometry(), NoiseField::new(0, 0), RenderConfig::default())
    }

    fn empty_scene(r: &SceneRasterizer) -> (Tilemap<u32>, SpriteGrid) {
        let g = r.geometry();
        (
            Tilemap::new_with(g.map_width, g.map_height, 0),
            Tilemap::new_with(g.map_width, g.map_height, None),
        )
    }

    #[test]
    fn test_output_has_grid_size_and_no_placeholders() {
        let r = rasterizer();
        let (heights, sprites) = empty_scene(&r);
        let out = r.render(&heights, &sprites, 0, &GlyphLibrary::default());

        assert_eq!(out.width(), 504);
        assert_eq!(out.height(), 146);
        let text = out.to_text();
        assert_eq!(text.lines().count(), 146);
        assert!(!text.contains(&['A', 'B', 'C'][..]));
    }

    #[test]
    fn test_raised_cell_draws_exposed_walls() {
        let r = rasterizer();
        let (mut heights, sprites) = empty_scene(&r);
        // screen column x = 0 sits at local column -x_min
        let local = (-r.geometry().x_min) as usize;
        heights.set(local, 20, 3);
        let out = r.render(&heights, &sprites, 0, &GlyphLibrary::default());

        // i = 20 * 3 - 3 * 2 = 54, j = 0 * 7 + 20 * 6 = 120
        assert_eq!(out.get(119, 55), '|');
        assert_eq!(out.get(120, 55), '\\');
    }

    #[test]
    fn test_sprite_is_stamped_above_its_cell() {
        let r = rasterizer();
        let (heights, mut sprites) = empty_scene(&r);
        let local = (-r.geometry().x_min) as usize;
        sprites.set(local, 20, Some(SpriteId(0)));

        let mut library = GlyphLibrary::default();
        library.insert(
            SpriteId(0),
            SpriteGlyphs {
                edges: Tilemap::from_rows(vec![vec!['/', '\\']]),
                fill: Tilemap::from_rows(vec![vec![0, 0]]),
            },
        );
        let out = r.render(&heights, &sprites, 0, &library);

        // i = 60, j = 120: top = 60 + 3 - 1, left = 120 + 6 - 1
        assert_eq!(out.get(125, 62), '/');
        assert_eq!(out.get(126, 62), '\\');
    }

    #[test]
    fn test_sprites_without_glyphs_are_skipped() {
        let r = rasterizer();
        let (heights, mut sprites) = empty_scene(&r);
        let baseline = r.render(&heights, &sprites, 0, &GlyphLibrary::default());
        sprites.set(60, 20, Some(SpriteId(7)));
        assert_eq!(r.render(&heights, &sprites, 0, &GlyphLibrary::default()), baseline);
    }

    #[test]
    fn test_brightness_stays_in_range() {
        let r = rasterizer();
        for x in -200..200 {
            let b = r.brightness(x * 13, x.rem_euclid(60));
            assert!((0.5..=2.0).contains(&b));
        }
    }
}
