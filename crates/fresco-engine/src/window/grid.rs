use crate::coords::Rect;
use crate::error::{Error, Result};

/// Splits a window into `rows x cols` equally sized cells.
///
/// Cell size is `width / cols` by `height / rows` (integer division). The last
/// column and the last row absorb the remainder, so the cells always tile the
/// window exactly. Origins are top-left, +Y down.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GridLayout {
    width: u32,
    height: u32,
    rows: u32,
    cols: u32,
    cell_width: u32,
    cell_height: u32,
}

impl GridLayout {
    /// A 1x1 grid covering the whole window.
    pub fn new(width: u32, height: u32) -> Self {
        let mut layout = Self {
            width,
            height,
            rows: 1,
            cols: 1,
            cell_width: width,
            cell_height: height,
        };
        layout.recompute();
        layout
    }

    /// Changes the grid shape. Both dimensions must be at least 1.
    pub fn set_grid(&mut self, rows: u32, cols: u32) -> Result<()> {
        if rows < 1 || cols < 1 {
            return Err(Error::invalid_argument(format!(
                "grid must be at least 1x1, got {rows}x{cols}"
            )));
        }
        self.rows = rows;
        self.cols = cols;
        self.recompute();
        Ok(())
    }

    /// Updates the window size and recomputes cell sizes.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.recompute();
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Nominal cell size (all cells except the last column/row).
    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    /// The whole window.
    pub fn full(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Viewport of the cell at `(col, row)`.
    pub fn cell(&self, col: u32, row: u32) -> Result<Rect> {
        if col >= self.cols || row >= self.rows {
            return Err(Error::OutOfRange {
                col,
                row,
                cols: self.cols,
                rows: self.rows,
            });
        }

        let x = col * self.cell_width;
        let y = row * self.cell_height;
        let width = if col + 1 == self.cols {
            self.width - x
        } else {
            self.cell_width
        };
        let height = if row + 1 == self.rows {
            self.height - y
        } else {
            self.cell_height
        };
        Ok(Rect::new(x, y, width, height))
    }

    /// All cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, Rect)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).filter_map(move |col| self.cell(col, row).ok().map(|r| (col, row, r)))
        })
    }

    fn recompute(&mut self) {
        self.cell_width = self.width / self.cols;
        self.cell_height = self.height / self.rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32, rows: u32, cols: u32) -> GridLayout {
        let mut g = GridLayout::new(width, height);
        g.set_grid(rows, cols).unwrap();
        g
    }

    // ── cell geometry ─────────────────────────────────────────────────────

    #[test]
    fn two_by_two_origins() {
        let g = grid(800, 600, 2, 2);
        let origins: Vec<_> = g.cells().map(|(_, _, r)| (r.x, r.y)).collect();
        assert_eq!(origins, vec![(0, 0), (400, 0), (0, 300), (400, 300)]);
        assert_eq!(g.cell(1, 1).unwrap(), Rect::new(400, 300, 400, 300));
    }

    #[test]
    fn last_column_absorbs_remainder() {
        let g = grid(801, 600, 1, 2);
        assert_eq!(g.cell_size(), (400, 600));
        assert_eq!(g.cell(0, 0).unwrap().width, 400);
        assert_eq!(g.cell(1, 0).unwrap(), Rect::new(400, 0, 401, 600));
    }

    #[test]
    fn cells_tile_the_window() {
        for (w, h, rows, cols) in [(801, 601, 3, 7), (640, 480, 1, 1), (5, 5, 5, 5), (1023, 17, 4, 9)] {
            let g = grid(w, h, rows, cols);
            let cells: Vec<_> = g.cells().map(|(_, _, r)| r).collect();
            assert_eq!(cells.len() as u32, rows * cols);

            let area: u64 = cells.iter().map(|r| r.area()).sum();
            assert_eq!(area, g.full().area(), "{w}x{h} {rows}x{cols}");
            for (i, a) in cells.iter().enumerate() {
                assert!(a.right() <= w && a.bottom() <= h);
                for b in &cells[i + 1..] {
                    assert!(!a.overlaps(*b));
                }
            }
        }
    }

    #[test]
    fn resize_recomputes_cells() {
        let mut g = grid(800, 600, 2, 2);
        g.resize(1000, 500);
        assert_eq!(g.cell_size(), (500, 250));
        assert_eq!(g.cell(1, 1).unwrap(), Rect::new(500, 250, 500, 250));
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut g = GridLayout::new(800, 600);
        assert!(matches!(g.set_grid(0, 2), Err(Error::InvalidArgument(_))));
        assert!(matches!(g.set_grid(2, 0), Err(Error::InvalidArgument(_))));
        assert_eq!((g.rows(), g.cols()), (1, 1));
    }

    #[test]
    fn out_of_range_cells() {
        let g = grid(800, 600, 2, 3);
        assert!(g.cell(2, 1).is_ok());
        assert_eq!(
            g.cell(3, 0),
            Err(Error::OutOfRange { col: 3, row: 0, cols: 3, rows: 2 })
        );
        assert!(matches!(g.cell(0, 2), Err(Error::OutOfRange { .. })));
    }
}
