//! Frame snapshots: PNG and text export of a rendered frame.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use image::{Rgb, RgbImage};

use crate::biomes::Biome;
use crate::config::CellSize;
use crate::render::OutputGrid;

const FOREGROUND: Rgb<u8> = Rgb([230, 230, 220]);
const BACKGROUND: Rgb<u8> = Rgb([12, 12, 16]);

/// Where a frame was taken, written into the text header.
#[derive(Clone, Debug)]
pub struct FrameInfo {
    pub seed: u64,
    pub offset: i64,
    pub biome: Biome,
    pub temperature: f64,
}

/// Rasterize a frame into an image, one `cell`-sized block per glyph.
pub fn frame_image(grid: &OutputGrid, cell: CellSize) -> RgbImage {
    let (img_width, img_height) = cell.pixels(grid.width(), grid.height());
    let mut img = RgbImage::from_pixel(img_width, img_height, BACKGROUND);
    let font = create_bitmap_font();

    // 5x7 bitmaps scaled by whole pixels (8x16 cells draw rows doubled), centred
    let scale_x = (cell.width / 6).max(1);
    let scale_y = (cell.height / 8).max(1);
    let offset_x = cell.width.saturating_sub(5 * scale_x) / 2;
    let offset_y = cell.height.saturating_sub(7 * scale_y) / 2;

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let Some(glyph) = font.get(&grid.get(col, row)) else {
                continue;
            };
            let cell_x = col as u32 * cell.width;
            let cell_y = row as u32 * cell.height;
            for (row_idx, &bits) in glyph.iter().enumerate() {
                for bit in 0..5u32 {
                    if (bits >> (4 - bit)) & 1 == 0 {
                        continue;
                    }
                    for dy in 0..scale_y {
                        for dx in 0..scale_x {
                            let x = offset_x + bit * scale_x + dx;
                            let y = offset_y + row_idx as u32 * scale_y + dy;
                            if x < cell.width && y < cell.height {
                                img.put_pixel(cell_x + x, cell_y + y, FOREGROUND);
                            }
                        }
                    }
                }
            }
        }
    }
    img
}

/// Save a frame as a PNG.
pub fn export_png(grid: &OutputGrid, cell: CellSize, path: &Path) -> io::Result<()> {
    frame_image(grid, cell)
        .save(path)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("saved frame image to {}", path.display());
    Ok(())
}

/// Header block written above a text snapshot.
pub fn text_header(info: &FrameInfo, grid: &OutputGrid) -> String {
    format!(
        "=== GLYPHSCAPE FRAME ===\nSeed: {}\nOffset: {}\nBiome: {} ({:.1}C)\nSize: {}x{}\nGenerated: {}\n",
        info.seed,
        info.offset,
        info.biome,
        info.temperature,
        grid.width(),
        grid.height(),
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Save a frame as text with a header.
pub fn export_text(grid: &OutputGrid, info: &FrameInfo, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    write!(file, "{}", text_header(info, grid))?;
    writeln!(file)?;
    writeln!(file, "{}", grid.to_text())?;
    log::info!("saved frame text to {}", path.display());
    Ok(())
}

/// 5x7 bitmaps for every glyph the renderer emits.
fn create_bitmap_font() -> HashMap<char, [u8; 7]> {
    let mut font = HashMap::new();

    // Each entry is 7 rows of 5-bit patterns (MSB = leftmost pixel)
    font.insert('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100]);
    font.insert(':', [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000]);
    font.insert('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]);
    font.insert('+', [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]);
    font.insert('*', [0b00000, 0b10101, 0b01110, 0b11111, 0b01110, 0b10101, 0b00000]);
    font.insert('o', [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110]);
    font.insert('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]);
    font.insert('%', [0b11001, 0b11010, 0b00100, 0b01000, 0b01011, 0b10011, 0b00000]);
    font.insert('#', [0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b00000]);
    font.insert('@', [0b01110, 0b10001, 0b10111, 0b10101, 0b10111, 0b10000, 0b01110]);

    // Strokes
    font.insert('_', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111]);
    font.insert('|', [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]);
    font.insert('/', [0b00001, 0b00010, 0b00100, 0b00100, 0b01000, 0b10000, 0b00000]);
    font.insert('\\', [0b10000, 0b01000, 0b00100, 0b00100, 0b00010, 0b00001, 0b00000]);
    font.insert('`', [0b01000, 0b00100, 0b00010, 0b00000, 0b00000, 0b00000, 0b00000]);

    font
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_image_size_and_ink() {
        let mut grid = OutputGrid::blank(4, 2);
        let blank = frame_image(&grid, CellSize::default());
        assert_eq!(blank.dimensions(), (32, 32));
        assert!(blank.pixels().all(|p| *p == BACKGROUND));

        grid.set(1, 1, '|');
        let img = frame_image(&grid, CellSize::default());
        // '|' is the middle column of the bitmap, drawn in the second cell row
        assert_eq!(*img.get_pixel(8 + 1 + 2, 16 + 1), FOREGROUND);
        assert_eq!(*img.get_pixel(8 + 1 + 2, 16 + 2), FOREGROUND);
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_frame_image_follows_cell_size() {
        let mut grid = OutputGrid::blank(3, 2);
        grid.set(2, 0, '|');

        let big = frame_image(&grid, CellSize { width: 12, height: 24 });
        assert_eq!(big.dimensions(), (36, 48));
        // scale 2x3, offsets (1, 1): the pipe fills columns 29 and 30
        assert_eq!(*big.get_pixel(24 + 1 + 4, 1), FOREGROUND);
        assert_eq!(*big.get_pixel(24 + 1 + 5, 3), FOREGROUND);
        assert_eq!(*big.get_pixel(24 + 1 + 6, 1), BACKGROUND);

        // cells smaller than the font clip instead of spilling into neighbours
        let tiny = frame_image(&grid, CellSize { width: 3, height: 4 });
        assert_eq!(tiny.dimensions(), (9, 8));
        assert!(tiny.enumerate_pixels().all(|(x, y, p)| *p == BACKGROUND || (x >= 6 && y < 4)));
        assert!(tiny.pixels().any(|p| *p == FOREGROUND));
    }

    #[test]
    fn test_font_covers_renderer_alphabet() {
        let font = create_bitmap_font();
        for c in crate::glyphs::BRIGHTNESS_RAMP.iter().skip(1) {
            assert!(font.contains_key(c), "missing {c}");
        }
        for c in ['_', '|', '/', '\\', '`'] {
            assert!(font.contains_key(&c));
        }
    }

    #[test]
    fn test_text_header_names_the_frame() {
        let grid = OutputGrid::blank(10, 3);
        let info = FrameInfo {
            seed: 7,
            offset: -250,
            biome: Biome::Ice,
            temperature: -12.5,
        };
        let header = text_header(&info, &grid);
        assert!(header.contains("Seed: 7"));
        assert!(header.contains("Offset: -250"));
        assert!(header.contains("Biome: ice (-12.5C)"));
        assert!(header.contains("Size: 10x3"));
    }
}
