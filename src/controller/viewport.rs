//! Pan/zoom mapping between screen and image coordinates.
//!
//! `pan` is the screen position of the image's top-left corner, so
//! `image = (screen - pan) / zoom` and `screen = image * zoom + pan`.

use crate::geometry::{ImageSize, Point};

/// Uniform scale plus translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Point,
}

impl Viewport {
    pub fn new(zoom: f64, pan: Point) -> Self {
        Self { zoom, pan }
    }

    /// Zoom 1, no pan: screen and image coordinates coincide.
    pub fn identity() -> Self {
        Self::new(1.0, Point::default())
    }

    pub fn screen_to_image(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    pub fn image_to_screen(&self, image: Point) -> Point {
        image * self.zoom + self.pan
    }

    /// Change zoom while keeping the image point under `cursor` fixed.
    pub fn zoom_to_cursor(&self, new_zoom: f64, cursor: Point) -> Viewport {
        let under_cursor = self.screen_to_image(cursor);
        Viewport {
            zoom: new_zoom,
            pan: cursor - under_cursor * new_zoom,
        }
    }

    /// One wheel notch: scroll down zooms out, scroll up zooms in, by
    /// `sensitivity` of the current level, bounded to `[min, max]`.
    pub fn zoom_by_wheel(
        &self,
        cursor: Point,
        delta_y: f64,
        sensitivity: f64,
        min: f64,
        max: f64,
    ) -> Viewport {
        let step = if delta_y > 0.0 { -sensitivity } else { sensitivity };
        let new_zoom = (self.zoom * (1.0 + step)).clamp(min, max);
        self.zoom_to_cursor(new_zoom, cursor)
    }

    pub fn pan_by(&self, delta: Point) -> Viewport {
        Viewport {
            zoom: self.zoom,
            pan: self.pan + delta,
        }
    }

    /// Fit `image` into a `canvas_w` × `canvas_h` canvas at `margin` of
    /// the limiting side, centred. Degenerate sizes leave the view as is.
    pub fn fit(
        &self,
        image: ImageSize,
        canvas_w: f64,
        canvas_h: f64,
        margin: f64,
        min: f64,
        max: f64,
    ) -> Viewport {
        if image.width <= 0.0 || image.height <= 0.0 || canvas_w <= 0.0 || canvas_h <= 0.0 {
            return *self;
        }
        let canvas_aspect = canvas_w / canvas_h;
        let image_aspect = image.width / image.height;
        let zoom = if image_aspect > canvas_aspect {
            canvas_w / image.width
        } else {
            canvas_h / image.height
        };
        let zoom = (zoom * margin).min(max).max(min);

        Viewport {
            zoom,
            pan: Point::new(
                (canvas_w - image.width * zoom) / 2.0,
                (canvas_h - image.height * zoom) / 2.0,
            ),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_maps_one_to_one() {
        let v = Viewport::identity();
        assert_eq!(v.screen_to_image(Point::new(12.0, 34.0)), Point::new(12.0, 34.0));
    }

    #[test]
    fn test_round_trip_through_screen() {
        let v = Viewport::new(2.5, Point::new(-40.0, 15.0));
        let p = Point::new(123.0, 45.0);
        let back = v.screen_to_image(v.image_to_screen(p));
        assert!(approx_eq(back.x, p.x));
        assert!(approx_eq(back.y, p.y));
    }

    #[test]
    fn test_zoom_to_cursor_preserves_cursor_point() {
        let v = Viewport::new(1.0, Point::new(50.0, 30.0));
        let cursor = Point::new(150.0, 120.0);
        let before = v.screen_to_image(cursor);

        let zoomed = v.zoom_to_cursor(2.0, cursor);
        let after = zoomed.screen_to_image(cursor);

        assert_eq!(zoomed.zoom, 2.0);
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn test_wheel_direction_and_bounds() {
        let v = Viewport::identity();
        let cursor = Point::new(10.0, 10.0);
        assert!(approx_eq(v.zoom_by_wheel(cursor, 1.0, 0.1, 0.1, 10.0).zoom, 0.9));
        assert!(approx_eq(v.zoom_by_wheel(cursor, -1.0, 0.1, 0.1, 10.0).zoom, 1.1));

        let max = Viewport::new(10.0, Point::default());
        assert_eq!(max.zoom_by_wheel(cursor, -1.0, 0.1, 0.1, 10.0).zoom, 10.0);
        let min = Viewport::new(0.1, Point::default());
        assert_eq!(min.zoom_by_wheel(cursor, 1.0, 0.1, 0.1, 10.0).zoom, 0.1);
    }

    #[test]
    fn test_pan_by() {
        let v = Viewport::identity().pan_by(Point::new(5.0, -3.0));
        assert_eq!(v.pan, Point::new(5.0, -3.0));
        assert_eq!(v.screen_to_image(Point::new(5.0, -3.0)), Point::default());
    }

    #[test]
    fn test_fit_wide_image() {
        let v = Viewport::identity().fit(ImageSize::new(1000.0, 500.0), 800.0, 600.0, 0.95, 0.1, 10.0);
        // Width limits: 0.8 * 0.95
        assert!(approx_eq(v.zoom, 0.76));
        assert!(approx_eq(v.pan.x, (800.0 - 760.0) / 2.0));
        assert!(approx_eq(v.pan.y, (600.0 - 380.0) / 2.0));
    }

    #[test]
    fn test_fit_tiny_image_caps_zoom() {
        let v = Viewport::identity().fit(ImageSize::new(10.0, 10.0), 800.0, 600.0, 0.95, 0.1, 10.0);
        assert_eq!(v.zoom, 10.0);
        assert!(approx_eq(v.pan.x, 350.0));
    }

    #[test]
    fn test_fit_ignores_empty_canvas() {
        let v = Viewport::new(2.0, Point::new(1.0, 1.0));
        assert_eq!(v.fit(ImageSize::new(100.0, 100.0), 0.0, 600.0, 0.95, 0.1, 10.0), v);
    }
}
