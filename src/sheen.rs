// Sheen: the light that sits *on* the glass, drawn after compositing with
// additive blending.
// - Rim: a bright line hugging the outline, strongest on the side facing the
//   light (top-left) and fading within `rim_width` px of the edge.
// - Gloss: a faint wash over the upper part of the lens.

use crate::field::smoothstep;
use crate::types::{FrameBuffer, LensGeometry};
use glam::Vec2;

/// Additive blend one RGB triplet at (x,y) with saturation to 255.
#[inline]
fn add_rgb_saturating(fb: &mut FrameBuffer, x: i32, y: i32, r: u8, g: u8, b: u8) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }

    let idx = y * fb.width + x;
    let old = fb.pixels[idx];

    let or = ((old >> 16) & 0xFF) as u16;
    let og = ((old >> 8) & 0xFF) as u16;
    let ob = (old & 0xFF) as u16;

    let nr = (or + r as u16).min(255) as u32;
    let ng = (og + g as u16).min(255) as u32;
    let nb = (ob + b as u16).min(255) as u32;

    fb.pixels[idx] = (nr << 16) | (ng << 8) | nb;
}

#[derive(Clone, Copy, Debug)]
pub struct Sheen {
    pub rim_strength: f32, // 0..1, brightness of the edge line
    pub rim_width: f32,    // px
    pub gloss: f32,        // 0..1, brightness of the upper wash
}

impl Sheen {
    const LIGHT: Vec2 = Vec2::new(-0.707_106_8, -0.707_106_8);
    const COLOR: [f32; 3] = [235.0, 244.0, 255.0]; // cool white

    pub fn render(&self, geom: &LensGeometry, fb: &mut FrameBuffer) {
        if self.rim_strength <= 0.0 && self.gloss <= 0.0 {
            return;
        }
        let rim_width = self.rim_width.max(0.5);
        let half = geom.half_extents();
        let center = geom.center();
        let (min, max) = geom.bounds();
        let x0 = min.x.floor().max(0.0) as i32;
        let y0 = min.y.floor().max(0.0) as i32;
        let x1 = max.x.ceil().min(fb.width as f32) as i32;
        let y1 = max.y.ceil().min(fb.height as f32) as i32;

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                let d = geom.signed_distance(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (0.5 - d).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }

                // facing: 1 toward the light, 0.3 on the far side
                let facing = 0.3 + 0.7 * (0.5 + 0.5 * p.normalize_or_zero().dot(Self::LIGHT));
                let rim = self.rim_strength * facing * (1.0 - smoothstep(0.0, rim_width, -d));
                let gloss = self.gloss * smoothstep(0.2, 1.0, -p.y / half.y);
                let w = ((rim + gloss) * coverage).clamp(0.0, 1.0);
                if w <= 0.0 {
                    continue;
                }

                let [r, g, b] = Self::COLOR.map(|c| (c * w).round() as u8);
                add_rgb_saturating(fb, x, y, r, g, b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::unpack_rgb;

    fn grey(w: usize, h: usize) -> FrameBuffer {
        FrameBuffer { width: w, height: h, pixels: vec![0x00_30_30_30; w * h] }
    }

    #[test]
    fn no_light_no_change() {
        let g = LensGeometry::new(Vec2::new(50.0, 50.0), 80.0, 60.0, 20.0);
        let mut fb = grey(100, 100);
        Sheen { rim_strength: 0.0, rim_width: 3.0, gloss: 0.0 }.render(&g, &mut fb);
        assert!(fb.pixels.iter().all(|&p| p == 0x00_30_30_30));
    }

    #[test]
    fn rim_is_brighter_than_center_and_top_left_brightest() {
        let g = LensGeometry::new(Vec2::new(50.0, 50.0), 80.0, 80.0, 40.0);
        let mut fb = grey(100, 100);
        Sheen { rim_strength: 0.6, rim_width: 4.0, gloss: 0.0 }.render(&g, &mut fb);

        let at = |x: usize, y: usize| unpack_rgb(fb.pixels[y * 100 + x]).0;
        // center untouched, edges lit
        assert_eq!(at(50, 50), 0x30);
        assert!(at(11, 50) > 0x30);
        // the top-left arc outshines the bottom-right arc
        assert!(at(22, 22) > at(77, 77));
    }

    #[test]
    fn stays_inside_the_outline() {
        let g = LensGeometry::new(Vec2::new(50.0, 50.0), 60.0, 60.0, 30.0);
        let mut fb = grey(100, 100);
        Sheen { rim_strength: 1.0, rim_width: 6.0, gloss: 1.0 }.render(&g, &mut fb);
        // bbox corner lies outside the circle
        assert_eq!(fb.pixels[21 * 100 + 21], 0x00_30_30_30);
        assert_eq!(fb.pixels[0], 0x00_30_30_30);
    }
}
