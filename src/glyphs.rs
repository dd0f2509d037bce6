//! Sprite raster to glyph conversion.
//!
//! A sprite image is compiled once into two matrices, one entry per glyph
//! cell (8x16 pixels unless the canvas says otherwise):
//!
//! - an edge matrix: Difference-of-Gaussians edge mask, then a Sobel vote per
//!   block over six stroke glyphs (`| / _ - \` and a backtick)
//! - a fill matrix: mean luminance of the block
//!
//! At render time edge glyphs win; blank edge cells fall back to a brightness
//! ramp indexed by the fill value times a brightness multiplier.

use std::f32::consts::PI;

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::config::{CellSize, GlyphConfig};
use crate::tilemap::Tilemap;

/// Light-to-dark brightness ramp, 11 levels.
pub const BRIGHTNESS_RAMP: [char; 11] = [' ', '.', ':', '-', '+', '*', 'o', 'O', '%', '#', '@'];

/// Stroke glyphs in vote order, with the gradient angle each one answers to.
/// `_` and `-` share a bucket; the half of the block a vote lands in decides.
const STROKES: [(char, f32); 6] = [
    ('|', 0.0),
    ('/', 0.463_647_6), // atan(0.5)
    ('_', PI / 2.0),
    ('-', PI / 2.0),
    ('`', PI / 2.0 + 0.45),
    ('\\', PI - 0.463_647_6),
];

const UNDERSCORE: usize = 2;
const DASH: usize = 3;

/// Compiled glyph stencils for one sprite.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteGlyphs {
    pub edges: Tilemap<char>,
    pub fill: Tilemap<u8>,
}

impl SpriteGlyphs {
    /// Compile both matrices from a grayscale source.
    pub fn compile(image: &GrayImage, width: usize, height: usize, cell: CellSize, config: &GlyphConfig) -> Self {
        let resized = resize_to_cells(image, width, height, cell);
        Self {
            edges: edge_matrix(&resized, width, height, cell, config),
            fill: fill_matrix(&resized, width, height, cell),
        }
    }

    pub fn width(&self) -> usize {
        self.edges.width
    }

    pub fn height(&self) -> usize {
        self.edges.height
    }

    /// Final glyph at one cell.
    pub fn glyph_at(&self, x: usize, y: usize, brightness: f64) -> char {
        let edge = *self.edges.get(x, y);
        if edge != ' ' {
            return edge;
        }
        ramp_glyph(*self.fill.get(x, y), brightness)
    }

    /// Composite the edge and fill matrices into displayable glyphs.
    pub fn compose(&self, brightness: f64) -> Tilemap<char> {
        let mut out = Tilemap::new_with(self.width(), self.height(), ' ');
        for (x, y, cell) in out.iter_mut() {
            *cell = self.glyph_at(x, y, brightness);
        }
        out
    }
}

/// Map a fill luminance through the brightness ramp.
pub fn ramp_glyph(fill: u8, brightness: f64) -> char {
    let level = (fill as f64 / 255.0 * brightness).clamp(0.0, 1.0);
    BRIGHTNESS_RAMP[(level * (BRIGHTNESS_RAMP.len() - 1) as f64).round() as usize]
}

/// Edge glyph matrix of `width x height` cells.
pub fn compile_edge(
    image: &GrayImage,
    width: usize,
    height: usize,
    cell: CellSize,
    config: &GlyphConfig,
) -> Tilemap<char> {
    edge_matrix(&resize_to_cells(image, width, height, cell), width, height, cell, config)
}

/// Block-mean luminance matrix of `width x height` cells.
pub fn compile_fill(image: &GrayImage, width: usize, height: usize, cell: CellSize) -> Tilemap<u8> {
    fill_matrix(&resize_to_cells(image, width, height, cell), width, height, cell)
}

fn resize_to_cells(image: &GrayImage, width: usize, height: usize, cell: CellSize) -> GrayImage {
    let (w, h) = cell.pixels(width, height);
    if image.dimensions() == (w, h) {
        return image.clone();
    }
    imageops::resize(image, w, h, FilterType::Triangle)
}

// =============================================================================
// EDGES
// =============================================================================

/// Binary DoG edge mask: 255 where the fine blur falls below the coarse blur
/// by more than the threshold.
fn dog_mask(image: &GrayImage, config: &GlyphConfig) -> GrayImage {
    let fine = imageops::blur(image, config.dog_sigma_small);
    let coarse = imageops::blur(image, config.dog_sigma_large);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let diff = fine.get_pixel(x, y)[0] as f32 - coarse.get_pixel(x, y)[0] as f32;
        image::Luma([if diff < config.dog_threshold { 255 } else { 0 }])
    })
}

fn sobel(mask: &GrayImage, x: u32, y: u32) -> (f32, f32) {
    let p = |dx: i32, dy: i32| mask.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as f32;
    let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
    let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
    (gx, gy)
}

/// Index into `STROKES` of the bucket nearest to a folded angle in `[0, PI)`.
fn nearest_stroke(angle: f32) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (i, &(_, bucket)) in STROKES.iter().enumerate() {
        let distance = [bucket, bucket - PI, bucket + PI]
            .iter()
            .map(|b| (angle - b).abs())
            .fold(f32::MAX, f32::min);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

fn edge_matrix(
    image: &GrayImage,
    width: usize,
    height: usize,
    cell: CellSize,
    config: &GlyphConfig,
) -> Tilemap<char> {
    let mask = dog_mask(image, config);
    let (w, h) = mask.dimensions();
    let mut edges = Tilemap::new_with(width, height, ' ');

    for (bx, by, glyph) in edges.iter_mut() {
        let x0 = bx as u32 * cell.width;
        let y0 = by as u32 * cell.height;
        let mut votes = [0.0f32; STROKES.len()];

        for y in y0..y0 + config.sample_rows {
            for x in x0..x0 + cell.width {
                if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
                    continue;
                }
                let (gx, gy) = sobel(&mask, x, y);
                if (gx * gx + gy * gy).sqrt() <= config.sobel_magnitude {
                    continue;
                }
                let mut angle = gy.atan2(gx);
                if angle < 0.0 {
                    angle += PI;
                }
                if angle >= PI {
                    angle -= PI;
                }
                let stroke = nearest_stroke(angle);
                if stroke == UNDERSCORE || stroke == DASH {
                    let slot = if y - y0 < cell.height / 2 { DASH } else { UNDERSCORE };
                    votes[slot] += config.horizontal_vote;
                } else {
                    votes[stroke] += 1.0;
                }
            }
        }

        let mut winner = 0;
        for i in 1..votes.len() {
            if votes[i] > votes[winner] {
                winner = i;
            }
        }
        if votes[winner] > config.vote_threshold {
            *glyph = STROKES[winner].0;
        }
    }
    edges
}

// =============================================================================
// FILL
// =============================================================================

fn fill_matrix(image: &GrayImage, width: usize, height: usize, cell: CellSize) -> Tilemap<u8> {
    let mut fill = Tilemap::new_with(width, height, 0u8);
    let area = (cell.width * cell.height) as f64;
    for (bx, by, mean) in fill.iter_mut() {
        let x0 = bx as u32 * cell.width;
        let y0 = by as u32 * cell.height;
        let mut sum = 0u64;
        for y in y0..y0 + cell.height {
            for x in x0..x0 + cell.width {
                sum += image.get_pixel(x, y)[0] as u64;
            }
        }
        *mean = (sum as f64 / area).round() as u8;
    }
    fill
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_compiles_to_blank_glyphs() {
        let image = GrayImage::new(32, 32);
        let glyphs = SpriteGlyphs::compile(&image, 4, 2, CellSize::default(), &GlyphConfig::default());

        assert_eq!(glyphs.width(), 4);
        assert_eq!(glyphs.height(), 2);
        assert!(glyphs.compose(2.0).iter().all(|(_, _, &c)| c == ' '));
    }

    #[test]
    fn test_fill_is_block_mean() {
        let image = GrayImage::from_fn(16, 16, |x, _| image::Luma([if x < 8 { 200 } else { 0 }]));
        let fill = compile_fill(&image, 2, 1, CellSize::default());
        assert_eq!(*fill.get(0, 0), 200);
        assert_eq!(*fill.get(1, 0), 0);
    }

    #[test]
    fn test_cell_size_sets_block_bounds() {
        // 8x4 source: with 4x4 cells the bright half is exactly the first block
        let image = GrayImage::from_fn(8, 4, |x, _| image::Luma([if x < 4 { 200 } else { 0 }]));
        let cell = CellSize { width: 4, height: 4 };
        let fill = compile_fill(&image, 2, 1, cell);
        assert_eq!(*fill.get(0, 0), 200);
        assert_eq!(*fill.get(1, 0), 0);

        let glyphs = SpriteGlyphs::compile(&image, 2, 1, cell, &GlyphConfig::default());
        assert_eq!(glyphs.fill, fill);
    }

    #[test]
    fn test_vertical_bar_votes_for_pipe() {
        let image = GrayImage::from_fn(32, 32, |x, _| image::Luma([if (12..20).contains(&x) { 255 } else { 0 }]));
        let edges = compile_edge(&image, 4, 2, CellSize::default(), &GlyphConfig::default());
        assert!(edges.iter().any(|(_, _, &c)| c == '|'));
    }

    #[test]
    fn test_nearest_stroke_wraps_around() {
        assert_eq!(STROKES[nearest_stroke(0.05)].0, '|');
        assert_eq!(STROKES[nearest_stroke(PI - 0.05)].0, '|');
        assert_eq!(STROKES[nearest_stroke(0.5)].0, '/');
        assert_eq!(STROKES[nearest_stroke(PI / 2.0)].0, '_');
        assert_eq!(STROKES[nearest_stroke(2.0)].0, '`');
        assert_eq!(STROKES[nearest_stroke(2.6)].0, '\\');
    }

    #[test]
    fn test_edge_glyph_beats_fill() {
        let glyphs = SpriteGlyphs {
            edges: Tilemap::from_rows(vec![vec!['/', ' ']]),
            fill: Tilemap::from_rows(vec![vec![255, 255]]),
        };
        let out = glyphs.compose(1.0);
        assert_eq!(*out.get(0, 0), '/');
        assert_eq!(*out.get(1, 0), '@');
    }

    #[test]
    fn test_brightness_scales_the_ramp() {
        assert_eq!(ramp_glyph(0, 2.0), ' ');
        assert_eq!(ramp_glyph(255, 1.0), '@');
        assert_eq!(ramp_glyph(128, 2.0), '@');
        assert_eq!(ramp_glyph(128, 0.5), '-');
    }
}
