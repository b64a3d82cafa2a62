//! Drag interaction: a two-state machine fed with pointer events.
//!
//! ```text
//!   Idle --Down(inside bbox)--> Dragging { offset = pointer - center }
//!   Dragging --Move(p)--> Dragging        (center = p - offset, clamped)
//!   any --Up / Cancel--> Idle
//! ```
//!
//! The controller does not care how events are delivered; the window layer
//! turns polled mouse state into [`PointerEvent`]s.

use crate::types::LensGeometry;
use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
    /// Pointer lost (window focus gone, device removed).
    Cancel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Pointer position minus lens center at grab time.
        offset: Vec2,
    },
}

impl DragState {
    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn pointer_offset(&self) -> Option<Vec2> {
        match self {
            DragState::Dragging { offset } => Some(*offset),
            DragState::Idle => None,
        }
    }
}

pub struct DragController {
    state: DragState,
    viewport: Vec2,
    min_visible: f32, // px of the lens box that must stay on screen
}

impl DragController {
    pub fn new(viewport: Vec2, min_visible: f32) -> Self {
        let min_visible = if min_visible.is_finite() { min_visible.max(1.0) } else { 1.0 };
        Self { state: DragState::Idle, viewport: viewport.max(Vec2::ZERO), min_visible }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport.max(Vec2::ZERO);
    }

    /// Back to Idle (unmount / reset).
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// Feed one event. Returns the moved geometry when the lens moved.
    pub fn handle(&mut self, event: PointerEvent, geom: &LensGeometry) -> Option<LensGeometry> {
        match (self.state, event) {
            (DragState::Idle, PointerEvent::Down(p)) => {
                if geom.bbox_contains(p) {
                    self.state = DragState::Dragging { offset: p - geom.center() };
                }
                None
            }
            (DragState::Dragging { offset }, PointerEvent::Move(p)) => {
                let center = self.clamp_center(p - offset, geom.size());
                if center == geom.center() {
                    return None;
                }
                Some(geom.with_center(center))
            }
            (_, PointerEvent::Up(_)) | (_, PointerEvent::Cancel) => {
                self.state = DragState::Idle;
                None
            }
            // Move while idle, or a second Down mid-drag: nothing to do.
            _ => None,
        }
    }

    /// Keep at least `min_visible` px of the lens box inside the viewport on
    /// each axis, so the lens can always be grabbed again.
    pub fn clamp_center(&self, center: Vec2, size: Vec2) -> Vec2 {
        let axis = |c: f32, extent: f32, view: f32| {
            let keep = self.min_visible.min(extent);
            let lo = keep - extent * 0.5;
            let hi = view - keep + extent * 0.5;
            if lo > hi { view * 0.5 } else { c.clamp(lo, hi) }
        };
        Vec2::new(
            axis(center.x, size.x, self.viewport.x),
            axis(center.y, size.y, self.viewport.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lens() -> LensGeometry {
        LensGeometry::new(Vec2::new(500.0, 400.0), 280.0, 180.0, 40.0)
    }

    fn ctl() -> DragController {
        DragController::new(Vec2::new(1280.0, 800.0), 24.0)
    }

    #[test]
    fn starts_idle() {
        assert_eq!(ctl().state(), DragState::Idle);
        assert!(!ctl().state().is_dragging());
    }

    #[test]
    fn grab_and_move_translates() {
        let mut c = ctl();
        let g = lens();
        assert!(c.handle(PointerEvent::Down(Vec2::new(510.0, 410.0)), &g).is_none());
        assert_eq!(c.state().pointer_offset(), Some(Vec2::new(10.0, 10.0)));

        let moved = c.handle(PointerEvent::Move(Vec2::new(600.0, 450.0)), &g).unwrap();
        assert_eq!(moved.center(), Vec2::new(590.0, 440.0));
        assert_eq!(moved.size(), g.size());
        assert_eq!(moved.corner_radius(), g.corner_radius());
    }

    #[test]
    fn moves_are_pure_translation() {
        let mut c = ctl();
        let mut g = lens();
        let p0 = Vec2::new(430.0, 350.0);
        c.handle(PointerEvent::Down(p0), &g);
        let c0 = g.center();
        for p1 in [Vec2::new(431.5, 352.0), Vec2::new(700.0, 100.0), Vec2::new(300.0, 600.0)] {
            g = c.handle(PointerEvent::Move(p1), &g).unwrap();
            let want = c0 + (p1 - p0);
            assert_abs_diff_eq!(g.center().x, want.x, epsilon = 1e-4);
            assert_abs_diff_eq!(g.center().y, want.y, epsilon = 1e-4);
        }
    }

    #[test]
    fn down_outside_stays_idle() {
        let mut c = ctl();
        c.handle(PointerEvent::Down(Vec2::new(10.0, 10.0)), &lens());
        assert_eq!(c.state(), DragState::Idle);
        assert!(c.handle(PointerEvent::Move(Vec2::new(20.0, 20.0)), &lens()).is_none());
    }

    #[test]
    fn release_anywhere_returns_to_idle() {
        let mut c = ctl();
        let g = lens();
        c.handle(PointerEvent::Down(Vec2::new(500.0, 400.0)), &g);
        // pointer wandered far outside the window before release
        c.handle(PointerEvent::Move(Vec2::new(-4000.0, 9000.0)), &g);
        c.handle(PointerEvent::Up(Vec2::new(-4000.0, 9000.0)), &g);
        assert_eq!(c.state(), DragState::Idle);

        c.handle(PointerEvent::Down(Vec2::new(500.0, 400.0)), &g);
        c.handle(PointerEvent::Cancel, &g);
        assert_eq!(c.state(), DragState::Idle);
        assert!(c.handle(PointerEvent::Move(Vec2::new(600.0, 400.0)), &g).is_none());
    }

    #[test]
    fn clamp_keeps_lens_reachable() {
        let mut c = ctl();
        let g = lens();
        c.handle(PointerEvent::Down(Vec2::new(500.0, 400.0)), &g);
        let moved = c.handle(PointerEvent::Move(Vec2::new(-4000.0, 9000.0)), &g).unwrap();
        // 24 px of the box still on screen at the left and bottom edges
        assert_abs_diff_eq!(moved.center().x, 24.0 - 140.0);
        assert_abs_diff_eq!(moved.center().y, 800.0 - 24.0 + 90.0);
        let (min, max) = moved.bounds();
        assert!(max.x > 0.0 && min.y < 800.0);
    }

    #[test]
    fn reset_drops_the_grab() {
        let mut c = ctl();
        c.handle(PointerEvent::Down(Vec2::new(500.0, 400.0)), &lens());
        c.reset();
        assert_eq!(c.state(), DragState::Idle);
    }

    #[test]
    fn tiny_viewport_still_clamps() {
        let c = DragController::new(Vec2::new(10.0, 10.0), 24.0);
        let center = c.clamp_center(Vec2::new(900.0, -900.0), Vec2::new(280.0, 180.0));
        // lo = 24 - 140 = -116, hi = 10 - 24 + 140 = 126: still a valid range
        assert_eq!(center, Vec2::new(126.0, -66.0));
    }
}
