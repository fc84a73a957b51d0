/// Zoom and pan state for the displayed image.
///
/// Positions are in logical pixels relative to the top-left corner of the
/// image area. The pan offset is applied after scaling around the center.
use cgmath::{Vector2, Zero};

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 5.0;
pub const DEFAULT_ZOOM_STEP: f32 = 0.15;

/// Zoom levels this close to a bound snap onto it, so repeated steps do not
/// leave the viewer stuck a rounding error above 1.
const SNAP_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Wheel away from the user: zoom in
    In,
    /// Wheel towards the user: zoom out
    Out,
}

/// An in-progress drag, alive from pointer-down to pointer-up
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragGesture {
    /// Pointer position minus pan at the moment the drag started
    origin: Vector2<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    zoom: f32,
    pan: Vector2<f32>,
    zoom_step: f32,
    drag: Option<DragGesture>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_STEP)
    }
}

impl ViewerState {
    pub fn new(zoom_step: f32) -> Self {
        Self {
            zoom: MIN_ZOOM,
            pan: Vector2::zero(),
            zoom_step,
            drag: None,
        }
    }

    /// Zoom by one step around `pointer` inside an area of size `area`.
    ///
    /// The point under the pointer stays put; returning to 1x re-centers.
    pub fn wheel(&mut self, direction: ScrollDirection, pointer: Vector2<f32>, area: Vector2<f32>) {
        if area.x <= 0.0 || area.y <= 0.0 {
            return;
        }

        let delta = match direction {
            ScrollDirection::In => self.zoom_step,
            ScrollDirection::Out => -self.zoom_step,
        };
        let new_zoom = snap(self.zoom + delta);

        if new_zoom == MIN_ZOOM {
            self.reset();
            return;
        }

        let zoom_diff = new_zoom - self.zoom;
        let fraction_x = pointer.x / area.x;
        let fraction_y = pointer.y / area.y;
        self.pan.x -= (fraction_x - 0.5) * zoom_diff * area.x;
        self.pan.y -= (fraction_y - 0.5) * zoom_diff * area.y;
        self.zoom = new_zoom;
    }

    /// Begin a drag. Only possible while zoomed in.
    pub fn press(&mut self, pointer: Vector2<f32>) -> bool {
        if self.zoom <= MIN_ZOOM {
            return false;
        }
        self.drag = Some(DragGesture {
            origin: pointer - self.pan,
        });
        true
    }

    /// Follow the pointer while a drag is active.
    pub fn drag_to(&mut self, pointer: Vector2<f32>) -> bool {
        match self.drag {
            Some(gesture) => {
                self.pan = pointer - gesture.origin;
                true
            }
            None => false,
        }
    }

    /// End the current drag, wherever the pointer is.
    pub fn release(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Back to 1x, centered, with no gesture in flight.
    pub fn reset(&mut self) {
        self.zoom = MIN_ZOOM;
        self.pan = Vector2::zero();
        self.drag = None;
    }

    pub fn set_zoom_step(&mut self, step: f32) {
        self.zoom_step = step;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vector2<f32> {
        self.pan
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

/// Whether a wheel event should be consumed by the viewer instead of the page
pub fn captures_scroll(pointer_over_image: bool, item_displayed: bool) -> bool {
    pointer_over_image && item_displayed
}

fn snap(zoom: f32) -> f32 {
    let clamped = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    if clamped - MIN_ZOOM < SNAP_EPSILON {
        MIN_ZOOM
    } else if MAX_ZOOM - clamped < SNAP_EPSILON {
        MAX_ZOOM
    } else {
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: Vector2<f32> = Vector2 { x: 800.0, y: 400.0 };
    const CENTER: Vector2<f32> = Vector2 { x: 400.0, y: 200.0 };

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_zoom_in_at_center_keeps_pan() {
        let mut viewer = ViewerState::default();
        for _ in 0..3 {
            viewer.wheel(ScrollDirection::In, CENTER, AREA);
        }

        assert!(approx(viewer.zoom(), 1.45));
        assert!(approx(viewer.pan().x, 0.0));
        assert!(approx(viewer.pan().y, 0.0));
    }

    #[test]
    fn test_zoom_out_clamps_to_one_and_recenters() {
        let mut viewer = ViewerState::default();
        for _ in 0..3 {
            viewer.wheel(ScrollDirection::In, Vector2::new(100.0, 50.0), AREA);
        }
        assert!(viewer.pan().x != 0.0);

        for _ in 0..5 {
            viewer.wheel(ScrollDirection::Out, CENTER, AREA);
        }

        assert_eq!(viewer.zoom(), MIN_ZOOM);
        assert_eq!(viewer.pan(), Vector2::zero());
    }

    #[test]
    fn test_zoom_never_exceeds_max() {
        let mut viewer = ViewerState::default();
        for _ in 0..100 {
            viewer.wheel(ScrollDirection::In, CENTER, AREA);
            assert!(viewer.zoom() >= MIN_ZOOM && viewer.zoom() <= MAX_ZOOM);
        }
        assert_eq!(viewer.zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_zoom_keeps_point_under_pointer() {
        let mut viewer = ViewerState::default();
        // Top-left quadrant: fractions 0.25 / 0.25
        viewer.wheel(ScrollDirection::In, Vector2::new(200.0, 100.0), AREA);

        assert!(approx(viewer.pan().x, -(0.25 - 0.5) * 0.15 * 800.0));
        assert!(approx(viewer.pan().y, -(0.25 - 0.5) * 0.15 * 400.0));
    }

    #[test]
    fn test_empty_area_is_ignored() {
        let mut viewer = ViewerState::default();
        viewer.wheel(ScrollDirection::In, CENTER, Vector2::new(0.0, 400.0));
        assert_eq!(viewer.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_drag_only_while_zoomed() {
        let mut viewer = ViewerState::default();
        assert!(!viewer.press(CENTER));
        assert!(!viewer.is_dragging());

        viewer.wheel(ScrollDirection::In, CENTER, AREA);
        assert!(viewer.press(Vector2::new(10.0, 10.0)));
        assert!(viewer.drag_to(Vector2::new(40.0, 30.0)));
        assert_eq!(viewer.pan(), Vector2::new(30.0, 20.0));

        assert!(viewer.release());
        assert!(!viewer.drag_to(Vector2::new(100.0, 100.0)));
        assert_eq!(viewer.pan(), Vector2::new(30.0, 20.0));
    }

    #[test]
    fn test_drag_resumes_from_current_pan() {
        let mut viewer = ViewerState::default();
        viewer.wheel(ScrollDirection::In, CENTER, AREA);

        viewer.press(Vector2::new(0.0, 0.0));
        viewer.drag_to(Vector2::new(10.0, 0.0));
        viewer.release();

        viewer.press(Vector2::new(50.0, 50.0));
        viewer.drag_to(Vector2::new(55.0, 50.0));
        assert_eq!(viewer.pan(), Vector2::new(15.0, 0.0));
    }

    #[test]
    fn test_release_outside_area_ends_gesture() {
        let mut viewer = ViewerState::default();
        viewer.wheel(ScrollDirection::In, CENTER, AREA);
        viewer.press(CENTER);

        // Release is position independent
        assert!(viewer.release());
        assert!(!viewer.is_dragging());
        assert!(!viewer.release());
    }

    #[test]
    fn test_reset_returns_to_identity() {
        let mut viewer = ViewerState::default();
        viewer.wheel(ScrollDirection::In, Vector2::new(10.0, 10.0), AREA);
        viewer.press(CENTER);

        viewer.reset();

        assert_eq!(viewer.zoom(), MIN_ZOOM);
        assert_eq!(viewer.pan(), Vector2::zero());
        assert!(!viewer.is_dragging());
    }

    #[test]
    fn test_captures_scroll_only_over_displayed_image() {
        assert!(captures_scroll(true, true));
        assert!(!captures_scroll(true, false));
        assert!(!captures_scroll(false, true));
    }
}
