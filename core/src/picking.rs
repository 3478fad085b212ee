use crate::grid::GridGeometry;
use crate::viewport::Viewport;

/// Resolve which cell instance lies under a screen-space pointer position.
///
/// Unprojects through the viewport's inverse transform and computes the slot
/// directly from the world point — the lattice is uniform, so no scan over
/// cell instances is needed. Pointer positions outside the lattice (or over
/// UI chrome that maps outside it) are a valid no-hit, not an error.
pub fn pick(
    screen_x: f64,
    screen_y: f64,
    viewport: &Viewport,
    geometry: &GridGeometry,
) -> Option<usize> {
    let (wx, wy) = viewport.screen_to_world(screen_x, screen_y);
    let (col, row) = geometry.cell_at_world(wx, wy)?;
    Some(geometry.slot(col, row))
}

#[cfg(test)]
mod tests {
    use super::pick;
    use crate::grid::GridGeometry;
    use crate::viewport::Viewport;

    fn setup() -> (GridGeometry, Viewport) {
        let geometry = GridGeometry::new(370, 270, 1.0);
        let mut viewport = Viewport::default();
        viewport.fit_bounds(geometry.world_bounds(), 1480.0, 1080.0);
        (geometry, viewport)
    }

    #[test]
    fn pick_at_cell_center_returns_its_slot() {
        let (geometry, viewport) = setup();
        for (col, row) in [(0, 0), (5, 10), (369, 269), (123, 45)] {
            let (wx, wy) = geometry.cell_center(col, row);
            let (sx, sy) = viewport.world_to_screen(wx, wy);
            assert_eq!(
                pick(sx, sy, &viewport, &geometry),
                Some(geometry.slot(col, row)),
                "center of ({col}, {row})"
            );
        }
    }

    #[test]
    fn pick_is_deterministic() {
        let (geometry, viewport) = setup();
        let first = pick(412.7, 299.3, &viewport, &geometry);
        for _ in 0..10 {
            assert_eq!(pick(412.7, 299.3, &viewport, &geometry), first);
        }
    }

    #[test]
    fn pick_outside_lattice_is_no_hit() {
        // Scenario E: world x beyond ±cols*cell_size/2.
        let (geometry, viewport) = setup();
        let (sx, sy) = viewport.world_to_screen(-185.5, 0.0);
        assert_eq!(pick(sx, sy, &viewport, &geometry), None);
        let (sx, sy) = viewport.world_to_screen(200.0, 0.0);
        assert_eq!(pick(sx, sy, &viewport, &geometry), None);
        // Far off-canvas coordinates (e.g. over UI chrome).
        assert_eq!(pick(-4000.0, -4000.0, &viewport, &geometry), None);
    }

    #[test]
    fn pick_survives_pan_and_zoom() {
        let (geometry, mut viewport) = setup();
        let (wx, wy) = geometry.cell_center(42, 17);
        viewport.pan(33.0, -77.0);
        viewport.zoom_at(-500.0, 600.0, 400.0);
        let (sx, sy) = viewport.world_to_screen(wx, wy);
        assert_eq!(
            pick(sx, sy, &viewport, &geometry),
            Some(geometry.slot(42, 17))
        );
    }
}
