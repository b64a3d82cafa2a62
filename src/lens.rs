//! The liquid-glass lens component.
//!
//! Owns the lens geometry, its drag state and its displacement map, and draws
//! itself over a screen frame given the backdrop it floats on. Data flows one
//! way per event:
//!
//! ```text
//! pointer event -> DragController -> LensGeometry -> Rasterizer (map) -> Compositor -> screen
//! ```
//!
//! Nothing is recomputed while the geometry stays put; the map is rebuilt in
//! full (never patched) whenever it moves.

use crate::config::LensConfig;
use crate::dmap::{DisplacementMap, Rasterizer};
use crate::drag::{DragController, DragState, PointerEvent};
use crate::error::Result;
use crate::filter::Compositor;
use crate::sheen::Sheen;
use crate::types::{FrameBuffer, LensGeometry, ShapeParams};
use glam::Vec2;
use tracing::{debug, info, warn};

pub struct LiquidGlass {
    initial: LensGeometry,
    geometry: LensGeometry,
    shape: ShapeParams,
    drag: DragController,
    rasterizer: Rasterizer,
    compositor: Compositor,
    sheen: Sheen,
    distortion: bool,
    degraded: bool, // last frame fell back to the static overlay
}

impl LiquidGlass {
    pub fn new(cfg: &LensConfig, min_visible: f32, viewport: (usize, usize)) -> Self {
        let view = Vec2::new(viewport.0 as f32, viewport.1 as f32);
        let drag = DragController::new(view, min_visible);

        let (cx, cy) = cfg.initial_center(view.x, view.y);
        let placed = LensGeometry::new(Vec2::new(cx, cy), cfg.width, cfg.height, cfg.corner_radius);
        let initial = placed.with_center(drag.clamp_center(placed.center(), placed.size()));
        info!(
            center = ?initial.center(),
            size = ?initial.size(),
            radius = initial.corner_radius(),
            "liquid glass mounted"
        );

        Self {
            initial,
            geometry: initial,
            shape: cfg.shape(),
            drag,
            rasterizer: Rasterizer::new(),
            compositor: Compositor::new(cfg.tint.0, cfg.tint_strength),
            sheen: Sheen { rim_strength: cfg.rim_strength, rim_width: cfg.rim_width, gloss: cfg.gloss },
            distortion: cfg.distortion,
            degraded: false,
        }
    }

    pub fn geometry(&self) -> &LensGeometry {
        &self.geometry
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Number of displacement maps generated so far.
    pub fn map_builds(&self) -> u64 {
        self.rasterizer.builds()
    }

    /// Feed a pointer event. True when the lens moved (a redraw is needed).
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match self.drag.handle(event, &self.geometry) {
            Some(moved) => {
                self.geometry = moved;
                true
            }
            None => false,
        }
    }

    /// The window (and backdrop) changed size: keep the lens reachable.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.drag.set_viewport(Vec2::new(width as f32, height as f32));
        let c = self.drag.clamp_center(self.geometry.center(), self.geometry.size());
        self.geometry = self.geometry.with_center(c);
    }

    /// Drop any grab and return to the mount-time placement.
    pub fn reset(&mut self) {
        self.drag.reset();
        self.geometry = self.initial;
        self.rasterizer.clear();
        debug!("liquid glass reset");
    }

    /// The displacement map for the current geometry (built if stale).
    pub fn displacement_map(&mut self) -> Result<&DisplacementMap> {
        self.rasterizer.update(&self.geometry, &self.shape)
    }

    /// Draw the lens into `screen`, sampling `backdrop`. Never fails: if the
    /// distortion layer cannot be produced the lens is drawn as a plain
    /// tinted overlay instead.
    pub fn render(&mut self, backdrop: &FrameBuffer, screen: &mut FrameBuffer) {
        let outcome = if self.distortion { self.render_distorted(backdrop, screen) } else { Ok(()) };

        match outcome {
            Ok(()) if self.distortion => {
                if self.degraded {
                    info!("liquid glass distortion restored");
                }
                self.degraded = false;
            }
            Ok(()) => self.compositor.overlay_static(&self.geometry, screen),
            Err(e) => {
                if !self.degraded {
                    warn!(error = %e, "liquid glass distortion unavailable, drawing static overlay");
                }
                self.degraded = true;
                self.compositor.overlay_static(&self.geometry, screen);
            }
        }

        self.sheen.render(&self.geometry, screen);
    }

    fn render_distorted(&mut self, backdrop: &FrameBuffer, screen: &mut FrameBuffer) -> Result<()> {
        let map = self.rasterizer.update(&self.geometry, &self.shape)?;
        self.compositor.composite(map, &self.geometry, backdrop, screen)
    }
}
