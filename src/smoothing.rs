//! Rank-order (median) smoothing of integer grids.
//!
//! Raw noise quantized to integers is speckled; a median pass turns it into
//! contiguous plateaus whose run lengths drive sprite placement.

use crate::tilemap::Tilemap;

/// Replace every cell with the median of its `window_size` neighbourhood.
///
/// The window extends `window_size / 2` cells in each direction, so even sizes
/// behave like the next odd size. The window is clipped at the grid edges
/// (no wraparound); when the clipped window holds an even number of values the
/// upper median is used.
pub fn median_filter(grid: &Tilemap<u32>, window_size: usize) -> Tilemap<u32> {
    let half = (window_size / 2) as i64;
    let mut result = Tilemap::new_with(grid.width, grid.height, 0u32);
    let mut values = Vec::with_capacity(((2 * half + 1) * (2 * half + 1)) as usize);

    for y in 0..grid.height as i64 {
        for x in 0..grid.width as i64 {
            values.clear();
            for dy in -half..=half {
                for dx in -half..=half {
                    if let Some(&v) = grid.get_signed(x + dx, y + dy) {
                        values.push(v);
                    }
                }
            }
            let mid = values.len() / 2;
            let (_, median, _) = values.select_nth_unstable(mid);
            result.set(x as usize, y as usize, *median);
        }
    }

    result
}

/// In-place variant used by the terrain passes.
pub fn median_filter_in_place(grid: &mut Tilemap<u32>, window_size: usize) {
    *grid = median_filter(grid, window_size);
}
