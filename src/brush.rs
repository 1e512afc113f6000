// Round brush footprint and coverage masks.
// A stroke becomes a coverage mask built from stamps dabbed along its path;
// the stroke color is then mixed into the raster through that mask.
use crate::gamma::GammaLut;
use crate::stroke::MAX_BRUSH_WIDTH;
use crate::types::{Color, FrameBuffer, Mask, Point, Stamp};

/// Circular stamp with diameter `width`, capped at [`MAX_BRUSH_WIDTH`].
/// With anti-aliasing the edge ramps from full to zero coverage over one
/// pixel.
pub fn make_brush_stamp(width: f32, anti_alias: bool) -> Stamp {
    let r = (width.min(MAX_BRUSH_WIDTH) * 0.5).max(0.5);
    let radius = if anti_alias { (r + 0.5).ceil() } else { r.ceil() } as i32;
    let d = 2 * radius as usize + 1;
    let mut weights = Vec::with_capacity(d * d);

    for y in -radius..=radius {
        for x in -radius..=radius {
            let dist = ((x * x + y * y) as f32).sqrt();
            let w = if anti_alias {
                (r + 0.5 - dist).clamp(0.0, 1.0)
            } else if dist <= r {
                1.0
            } else {
                0.0
            };
            weights.push(w);
        }
    }

    Stamp { radius, weights }
}

/// Dab the stamp into the mask centered at raster pixel (cx, cy).
/// Overlapping dabs keep the larger coverage so a stroke never darkens
/// where it crosses itself.
pub fn dab_mask(mask: &mut Mask, cx: i32, cy: i32, stamp: &Stamp) {
    let w = mask.width as i32;
    let h = mask.height as i32;
    let r = stamp.radius;
    let d = 2 * r + 1;

    for ky in 0..d {
        for kx in 0..d {
            let mx = cx + kx - r - mask.left;
            let my = cy + ky - r - mask.top;
            if mx < 0 || my < 0 || mx >= w || my >= h { continue; }
            let idx = my as usize * mask.width + mx as usize;
            let kidx = ky as usize * d as usize + kx as usize;

            let a = stamp.weights[kidx];
            if a > mask.alpha[idx] {
                mask.alpha[idx] = a;
            }
        }
    }
}

/// Dab along the segment `from -> to`, one stamp per pixel of length.
pub fn dab_segment(mask: &mut Mask, from: Point, to: Point, stamp: &Stamp) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = (dx * dx + dy * dy).sqrt().ceil().max(1.0) as i32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = (from.x + dx * t).round() as i32;
        let y = (from.y + dy * t).round() as i32;
        dab_mask(mask, x, y, stamp);
    }
}

/// Mix `color` into `fb` wherever the mask has coverage, in linear light.
pub fn blend_mask_in_place(fb: &mut FrameBuffer, mask: &Mask, color: Color, lut: &GammaLut) {
    let opacity = color.a as f32 / 255.0;
    if opacity <= 0.0 { return; }

    for my in 0..mask.height {
        let y = mask.top + my as i32;
        if y < 0 || y >= fb.height as i32 { continue; }
        for mx in 0..mask.width {
            let x = mask.left + mx as i32;
            if x < 0 || x >= fb.width as i32 { continue; }

            let a = mask.alpha[my * mask.width + mx] * opacity;
            if a <= 0.0 { continue; }
            let idx = y as usize * fb.width + x as usize;
            fb.pixels[idx] = lut.mix_xrgb(fb.pixels[idx], color, a);
        }
    }
}
