//! Binary masks and Moore-neighbor boundary tracing.

/// A row-major grid of solid/empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl BinaryMask {
    /// An all-empty mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Build a mask from an RGBA buffer, marking pixels whose alpha exceeds `threshold`.
    pub fn from_rgba_alpha(width: usize, height: usize, rgba: &[u8], threshold: u8) -> Self {
        let cells = rgba
            .chunks_exact(4)
            .take(width * height)
            .map(|px| px[3] > threshold)
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set(&mut self, x: usize, y: usize, solid: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = solid;
        }
    }

    /// Solid test; anything outside the grid is empty.
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// First solid cell in raster order.
    pub fn first_solid(&self) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|&solid| solid)
            .map(|idx| (idx % self.width, idx / self.width))
    }
}

/// Neighbor offsets, clockwise from north.
const NEIGHBORS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Index into [`NEIGHBORS`] of the west neighbor, the initial backtrack direction.
const WEST: usize = 6;

/// Trace the outer boundary of the blob containing `start`.
///
/// `start` should be the first solid cell in raster order, so its west
/// neighbor is known to be empty. The sweep around each cell begins just
/// clockwise of the cell it was entered from. Tracing stops on returning to
/// `start`, on an isolated cell, or after `2 × width × height` steps.
/// The returned contour begins with `start` and, for closed loops, ends
/// with it again.
pub fn trace_outer_boundary(mask: &BinaryMask, start: (usize, usize)) -> Vec<(usize, usize)> {
    let (sx, sy) = (start.0 as i64, start.1 as i64);
    let (mut cx, mut cy) = (sx, sy);
    let mut backtrack = WEST;
    let mut contour = vec![start];

    let max_steps = mask.width() * mask.height() * 2;
    for _ in 0..max_steps {
        let next = (1..=8)
            .map(|i| (backtrack + i) % 8)
            .find(|&dir| {
                let (ox, oy) = NEIGHBORS[dir];
                mask.is_solid(cx + ox, cy + oy)
            });

        let Some(dir) = next else {
            break;
        };

        let (ox, oy) = NEIGHBORS[dir];
        cx += ox;
        cy += oy;
        contour.push((cx as usize, cy as usize));
        backtrack = (dir + 4) % 8;

        if cx == sx && cy == sy {
            break;
        }
    }

    contour
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> BinaryMask {
        let height = rows.len();
        let width = rows[0].len();
        let mut mask = BinaryMask::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                mask.set(x, y, c == '#');
            }
        }
        mask
    }

    #[test]
    fn test_first_solid_raster_order() {
        let mask = mask_from_rows(&["....", "..#.", "#..."]);
        assert_eq!(mask.first_solid(), Some((2, 1)));
        assert_eq!(BinaryMask::new(3, 3).first_solid(), None);
    }

    #[test]
    fn test_out_of_bounds_is_empty() {
        let mask = mask_from_rows(&["##", "##"]);
        assert!(mask.is_solid(0, 0));
        assert!(!mask.is_solid(-1, 0));
        assert!(!mask.is_solid(2, 1));
    }

    #[test]
    fn test_isolated_pixel() {
        let mask = mask_from_rows(&["...", ".#.", "..."]);
        let start = mask.first_solid().unwrap();
        assert_eq!(trace_outer_boundary(&mask, start), vec![(1, 1)]);
    }

    #[test]
    fn test_square_blob_boundary() {
        let mask = mask_from_rows(&[".....", ".###.", ".###.", ".###.", "....."]);
        let start = mask.first_solid().unwrap();
        let contour = trace_outer_boundary(&mask, start);

        assert_eq!(contour.first(), Some(&(1, 1)));
        assert_eq!(contour.last(), Some(&(1, 1)));
        // Eight border cells plus the closing repeat of the start.
        assert_eq!(contour.len(), 9);
        assert!(!contour.contains(&(2, 2)));
        for corner in [(3, 1), (3, 3), (1, 3)] {
            assert!(contour.contains(&corner));
        }
    }

    #[test]
    fn test_boundary_goes_clockwise() {
        let mask = mask_from_rows(&["###", "###"]);
        let contour = trace_outer_boundary(&mask, (0, 0));
        assert_eq!(contour[1], (1, 0));
        assert_eq!(contour[2], (2, 0));
    }

    #[test]
    fn test_rgba_alpha_threshold() {
        let rgba = [255, 255, 255, 200, 0, 0, 0, 128, 0, 0, 0, 129, 9, 9, 9, 0];
        let mask = BinaryMask::from_rgba_alpha(2, 2, &rgba, 128);
        assert!(mask.is_solid(0, 0));
        assert!(!mask.is_solid(1, 0));
        assert!(mask.is_solid(0, 1));
        assert!(!mask.is_solid(1, 1));
    }
}
