// Compositing: the only stage that writes visible pixels.
// Each screen pixel under the lens reads its offset from the displacement map,
// samples the *backdrop* (never the screen, so the lens never refracts itself)
// at the shifted position, and is blended over the screen by the lens coverage.
//
//   out(x, y) = mix(screen(x, y), tint(backdrop(x + dx, y + dy)), coverage(x, y))

use crate::dmap::DisplacementMap;
use crate::error::{Error, Result};
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, LensGeometry};
use glam::Vec3;

pub struct Compositor {
    lut: GammaLut,
    tint: Vec3,         // linear-light glass color
    tint_strength: f32, // 0 = clear glass, 1 = solid tint
}

impl Compositor {
    pub fn new(tint_rgb: u32, tint_strength: f32) -> Self {
        let lut = GammaLut::new();
        let tint = lut.unpack(tint_rgb);
        let tint_strength = if tint_strength.is_finite() { tint_strength.clamp(0.0, 1.0) } else { 0.0 };
        Self { lut, tint, tint_strength }
    }

    /// Remap the backdrop through `map` into the lens area of `screen`.
    pub fn composite(
        &self,
        map: &DisplacementMap,
        geom: &LensGeometry,
        backdrop: &FrameBuffer,
        screen: &mut FrameBuffer,
    ) -> Result<()> {
        if !backdrop.same_size(screen) {
            return Err(Error::Composite(format!(
                "backdrop {}x{} does not match screen {}x{}",
                backdrop.width, backdrop.height, screen.width, screen.height
            )));
        }
        if backdrop.width == 0 || backdrop.height == 0 {
            return Err(Error::Composite("empty backdrop".into()));
        }
        if backdrop.pixels.len() != backdrop.width * backdrop.height {
            return Err(Error::Composite("backdrop buffer length mismatch".into()));
        }

        let Some((xs, ys)) = clip_to_screen(geom, screen) else {
            return Ok(()); // lens fully off screen: nothing to draw
        };

        for y in ys {
            let row = y as usize * screen.width;
            for x in xs.clone() {
                let a = map.coverage_at(x, y);
                if a <= 0.0 {
                    continue;
                }
                let v = map.vector_at(x, y);
                let seen = self.sample_bilinear(backdrop, x as f32 + 0.5 + v.x, y as f32 + 0.5 + v.y);
                let glass = seen.lerp(self.tint, self.tint_strength);

                let idx = row + x as usize;
                let out = if a >= 1.0 { glass } else { self.lut.unpack(screen.pixels[idx]).lerp(glass, a) };
                screen.pixels[idx] = self.lut.pack(out);
            }
        }
        Ok(())
    }

    /// Degraded path: the lens outline tinted over the screen, no distortion.
    pub fn overlay_static(&self, geom: &LensGeometry, screen: &mut FrameBuffer) {
        let Some((xs, ys)) = clip_to_screen(geom, screen) else { return };
        let strength = self.tint_strength.max(0.15);
        for y in ys {
            let row = y as usize * screen.width;
            for x in xs.clone() {
                let d = geom.signed_distance(x as f32 + 0.5, y as f32 + 0.5);
                let a = (0.5 - d).clamp(0.0, 1.0) * strength;
                if a <= 0.0 {
                    continue;
                }
                let idx = row + x as usize;
                let base = self.lut.unpack(screen.pixels[idx]);
                screen.pixels[idx] = self.lut.pack(base.lerp(self.tint, a));
            }
        }
    }

    /// Bilinear sample at a continuous position (pixel i spans [i, i+1)),
    /// clamped into the backdrop so edges extend instead of reading garbage.
    fn sample_bilinear(&self, src: &FrameBuffer, x: f32, y: f32) -> Vec3 {
        let max_x = (src.width - 1) as f32;
        let max_y = (src.height - 1) as f32;
        let fx = if x.is_finite() { (x - 0.5).clamp(0.0, max_x) } else { 0.0 };
        let fy = if y.is_finite() { (y - 0.5).clamp(0.0, max_y) } else { 0.0 };

        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(src.width - 1);
        let y1 = (y0 + 1).min(src.height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let px = |xx: usize, yy: usize| self.lut.unpack(src.pixels[yy * src.width + xx]);
        let top = px(x0, y0).lerp(px(x1, y0), tx);
        let bottom = px(x0, y1).lerp(px(x1, y1), tx);
        top.lerp(bottom, ty)
    }
}

/// Integer pixel ranges of the lens bounding box that land on the screen.
fn clip_to_screen(geom: &LensGeometry, screen: &FrameBuffer) -> Option<(std::ops::Range<i32>, std::ops::Range<i32>)> {
    let (min, max) = geom.bounds();
    let x0 = min.x.floor().max(0.0);
    let y0 = min.y.floor().max(0.0);
    let x1 = max.x.ceil().min(screen.width as f32);
    let y1 = max.y.ceil().min(screen.height as f32);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as i32..x1 as i32, y0 as i32..y1 as i32))
}
