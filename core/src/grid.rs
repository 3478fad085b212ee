/// Fixed uniform lattice: `cols * rows` square cells of side `cell_size`,
/// centered on the world origin. The coordinate→slot mapping is total and
/// never changes after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub cols: u32,
    pub rows: u32,
    pub cell_size: f64,
}

impl GridGeometry {
    pub const fn new(cols: u32, rows: u32, cell_size: f64) -> Self {
        Self {
            cols,
            rows,
            cell_size,
        }
    }

    pub const fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub const fn contains(&self, col: u32, row: u32) -> bool {
        col < self.cols && row < self.rows
    }

    /// Linear instance index for an in-bounds coordinate.
    pub const fn slot(&self, col: u32, row: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    pub const fn coord_of_slot(&self, slot: usize) -> (u32, u32) {
        (
            (slot % self.cols as usize) as u32,
            (slot / self.cols as usize) as u32,
        )
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, col: u32, row: u32) -> (f64, f64) {
        let s = self.cell_size;
        (
            col as f64 * s - self.cols as f64 * s / 2.0 + s / 2.0,
            row as f64 * s - self.rows as f64 * s / 2.0 + s / 2.0,
        )
    }

    /// World-space extent `(min_x, min_y, max_x, max_y)` of the lattice.
    pub fn world_bounds(&self) -> (f64, f64, f64, f64) {
        let half_w = self.cols as f64 * self.cell_size / 2.0;
        let half_h = self.rows as f64 * self.cell_size / 2.0;
        (-half_w, -half_h, half_w, half_h)
    }

    /// Direct inverse of the layout: which cell contains a world point.
    /// `None` outside the lattice.
    pub fn cell_at_world(&self, wx: f64, wy: f64) -> Option<(u32, u32)> {
        let (min_x, min_y, max_x, max_y) = self.world_bounds();
        if wx < min_x || wx >= max_x || wy < min_y || wy >= max_y {
            return None;
        }
        let col = ((wx - min_x) / self.cell_size).floor() as u32;
        let row = ((wy - min_y) / self.cell_size).floor() as u32;
        // Guard against float edge rounding at the far borders.
        Some((col.min(self.cols - 1), row.min(self.rows - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::GridGeometry;

    fn grid() -> GridGeometry {
        GridGeometry::new(370, 270, 1.0)
    }

    #[test]
    fn slot_is_row_major() {
        let g = grid();
        assert_eq!(g.slot(0, 0), 0);
        assert_eq!(g.slot(5, 10), 10 * 370 + 5);
        assert_eq!(g.cell_count(), 370 * 270);
    }

    #[test]
    fn slot_roundtrips_through_coord() {
        let g = grid();
        for (col, row) in [(0, 0), (5, 10), (369, 269), (184, 135)] {
            assert_eq!(g.coord_of_slot(g.slot(col, row)), (col, row));
        }
    }

    #[test]
    fn cell_center_matches_original_layout() {
        let g = grid();
        // col*s - cols*s/2 + s/2, row*s - rows*s/2 + s/2
        assert_eq!(g.cell_center(0, 0), (-184.5, -134.5));
        assert_eq!(g.cell_center(369, 269), (184.5, 134.5));
    }

    #[test]
    fn cell_at_world_inverts_cell_center() {
        let g = grid();
        for (col, row) in [(0, 0), (5, 10), (369, 269), (200, 100)] {
            let (wx, wy) = g.cell_center(col, row);
            assert_eq!(g.cell_at_world(wx, wy), Some((col, row)));
        }
    }

    #[test]
    fn cell_at_world_outside_is_none() {
        let g = grid();
        assert_eq!(g.cell_at_world(-185.01, 0.0), None);
        assert_eq!(g.cell_at_world(185.0, 0.0), None);
        assert_eq!(g.cell_at_world(0.0, -135.01), None);
        assert_eq!(g.cell_at_world(0.0, 135.0), None);
    }

    #[test]
    fn cell_at_world_handles_border_rounding() {
        let g = grid();
        let hit = g.cell_at_world(184.999_999_999, 134.999_999_999);
        assert_eq!(hit, Some((369, 269)));
    }
}
