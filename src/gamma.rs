// sRGB <-> linear-light conversion through lookup tables.
// The compositor filters and blends in linear light (no dark fringes where the
// lens edge meets the backdrop); the tables keep powf out of the per-pixel loop.

use crate::types::{pack_rgb, unpack_rgb};
use glam::Vec3;

pub struct GammaLut {
    // sRGB byte -> linear 0..1
    to_linear: [f32; 256],
    // linear 0..1 quantized to 4096 steps -> sRGB byte
    to_srgb: [u8; 4096],
}

impl GammaLut {
    pub fn new() -> Self {
        let mut to_linear = [0.0f32; 256];
        for (v, slot) in to_linear.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut to_srgb = [0u8; 4096];
        for (i, slot) in to_srgb.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { to_linear, to_srgb }
    }

    #[inline]
    pub fn to_linear(&self, v: u8) -> f32 {
        self.to_linear[v as usize]
    }

    #[inline]
    pub fn to_srgb(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.to_srgb[idx]
    }

    /// Window pixel (0x00RRGGBB) to linear RGB.
    #[inline]
    pub fn unpack(&self, px: u32) -> Vec3 {
        let (r, g, b) = unpack_rgb(px);
        Vec3::new(self.to_linear(r), self.to_linear(g), self.to_linear(b))
    }

    /// Linear RGB back to a window pixel.
    #[inline]
    pub fn pack(&self, c: Vec3) -> u32 {
        pack_rgb(self.to_srgb(c.x), self.to_srgb(c.y), self.to_srgb(c.z))
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}
