/// A dense 2D grid stored row-major.
///
/// Unlike a wrapping world map, the landscape never wraps: signed lookups
/// outside the grid resolve to a caller-supplied sentinel instead of panicking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a tilemap from row vectors. All rows must share the first row's length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        debug_assert!(rows.iter().all(|r| r.len() == width));
        Self {
            width,
            height,
            data: rows.into_iter().flatten().collect(),
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Whether signed coordinates fall inside the grid.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Signed lookup. Out-of-bounds coordinates return `None`.
    pub fn get_signed(&self, x: i64, y: i64) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Signed lookup with a sentinel for out-of-bounds coordinates.
    pub fn get_or(&self, x: i64, y: i64, sentinel: T) -> T {
        self.get_signed(x, y).cloned().unwrap_or(sentinel)
    }

    /// One row as a slice.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Copy a horizontal span `[src_x, src_x + len)` of every row into `dest`
    /// starting at column `dest_x`. Both maps must have the same height.
    pub fn copy_columns_into(&self, src_x: usize, len: usize, dest: &mut Tilemap<T>, dest_x: usize) {
        debug_assert_eq!(self.height, dest.height);
        debug_assert!(src_x + len <= self.width && dest_x + len <= dest.width);
        for y in 0..self.height {
            let src = y * self.width + src_x;
            let dst = y * dest.width + dest_x;
            dest.data[dst..dst + len].clone_from_slice(&self.data[src..src + len]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_returns_sentinel() {
        let map = Tilemap::new_with(3, 2, 5u32);

        assert_eq!(map.get_or(-1, 0, 0), 0);
        assert_eq!(map.get_or(3, 0, 0), 0);
        assert_eq!(map.get_or(0, 2, 0), 0);
        assert_eq!(map.get_or(2, 1, 0), 5);
    }

    #[test]
    fn test_from_rows_preserves_layout() {
        let map = Tilemap::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]);

        assert_eq!(map.width, 3);
        assert_eq!(map.height, 2);
        assert_eq!(*map.get(2, 0), 3);
        assert_eq!(map.row(1), &[4, 5, 6]);
    }

    #[test]
    fn test_copy_columns_into() {
        let src = Tilemap::from_rows(vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
        let mut dest = Tilemap::new_with(4, 2, 0);

        src.copy_columns_into(2, 2, &mut dest, 0);
        src.copy_columns_into(0, 2, &mut dest, 2);

        assert_eq!(dest.row(0), &[3, 4, 1, 2]);
        assert_eq!(dest.row(1), &[7, 8, 5, 6]);
    }
}
