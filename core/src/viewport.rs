/// Pan/zoom transformation between world coordinates and screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

const MIN_SCALE: f64 = 0.5;
const MAX_SCALE: f64 = 64.0;
const ZOOM_SENSITIVITY: f64 = 0.001;
/// Fractional margin kept around the lattice on zoom-to-fit.
const FIT_PADDING: f64 = 0.05;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 2.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Zoom toward a focus point given in screen coordinates. The world point
    /// under the cursor stays fixed.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Frame the given world bounds inside a view of `view_w` × `view_h`
    /// pixels, centered, with padding. Aspect ratio is preserved.
    pub fn fit_bounds(
        &mut self,
        (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
        view_w: f64,
        view_h: f64,
    ) {
        let world_w = max_x - min_x;
        let world_h = max_y - min_y;
        if world_w <= 0.0 || world_h <= 0.0 || view_w <= 0.0 || view_h <= 0.0 {
            return;
        }

        let scale_x = view_w / (world_w * (1.0 + FIT_PADDING * 2.0));
        let scale_y = view_h / (world_h * (1.0 + FIT_PADDING * 2.0));
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        self.offset_x = view_w / 2.0 - center_x * self.scale;
        self.offset_y = view_h / 2.0 - center_y * self.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;

    #[test]
    fn screen_world_roundtrip() {
        let vp = Viewport {
            offset_x: 37.0,
            offset_y: -12.0,
            scale: 3.5,
        };
        let (sx, sy) = vp.world_to_screen(5.25, -9.75);
        let (wx, wy) = vp.screen_to_world(sx, sy);
        assert!((wx - 5.25).abs() < 1e-12);
        assert!((wy + 9.75).abs() < 1e-12);
    }

    #[test]
    fn zoom_at_keeps_focus_point_fixed() {
        let mut vp = Viewport::default();
        let focus = (321.0, 456.0);
        let before = vp.screen_to_world(focus.0, focus.1);
        vp.zoom_at(-240.0, focus.0, focus.1);
        let after = vp.screen_to_world(focus.0, focus.1);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
        assert!(vp.scale > Viewport::default().scale);
    }

    #[test]
    fn fit_bounds_centers_world_origin_for_symmetric_bounds() {
        let mut vp = Viewport::default();
        vp.fit_bounds((-185.0, -135.0, 185.0, 135.0), 1480.0, 1080.0);
        let (sx, sy) = vp.world_to_screen(0.0, 0.0);
        assert!((sx - 740.0).abs() < 1e-9);
        assert!((sy - 540.0).abs() < 1e-9);
        // Whole lattice fits inside the view.
        let (left, _) = vp.world_to_screen(-185.0, 0.0);
        let (right, _) = vp.world_to_screen(185.0, 0.0);
        assert!(left >= 0.0 && right <= 1480.0);
    }

    #[test]
    fn fit_bounds_ignores_degenerate_input() {
        let mut vp = Viewport::default();
        let before = vp.clone();
        vp.fit_bounds((0.0, 0.0, 0.0, 10.0), 800.0, 600.0);
        vp.fit_bounds((0.0, 0.0, 10.0, 10.0), 0.0, 600.0);
        assert_eq!(vp, before);
    }
}
