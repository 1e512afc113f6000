// Lookup tables for blending stroke color into the raster in linear light.
// Soft brush edges stay free of dark fringes without a powf per pixel.

use crate::types::Color;

#[derive(Debug, Clone)]
pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1)
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255), index = (linear * 4095).round()
    linear_to_srgb: [u8; 4096],
}

impl GammaLut {
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Mix `color` over the 0x00RRGGBB pixel `dst` with weight `a` in [0,1].
    #[inline]
    pub fn mix_xrgb(&self, dst: u32, color: Color, a: f32) -> u32 {
        if a >= 1.0 {
            return color.to_xrgb();
        }
        let inv = 1.0 - a;
        let channel = |d: u8, s: u8| -> u32 {
            let l = a * self.srgb_u8_to_linear(s) + inv * self.srgb_u8_to_linear(d);
            self.linear_to_srgb_u8(l) as u32
        };
        let r = channel((dst >> 16) as u8, color.r);
        let g = channel((dst >> 8) as u8, color.g);
        let b = channel(dst as u8, color.b);
        (r << 16) | (g << 8) | b
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}
