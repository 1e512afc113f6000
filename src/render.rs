// Layer composition: background raster, then committed strokes in order,
// then the stroke being drawn. Later strokes paint over earlier ones.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::brush::{blend_mask_in_place, dab_mask, dab_segment, make_brush_stamp};
use crate::gamma::GammaLut;
use crate::stroke::{LineCap, LineJoin, Stroke, StrokeStyle};
use crate::types::{FrameBuffer, Mask, Point};

/// Rasterize a polyline with `style` onto `fb`.
pub fn paint_path(fb: &mut FrameBuffer, points: &[Point], style: &StrokeStyle, lut: &GammaLut) {
    let Some(first) = points.first() else { return };
    let stamp = match (style.cap, style.join) {
        (LineCap::Round, LineJoin::Round) => make_brush_stamp(style.width, style.anti_alias),
    };

    let Some(mut mask) = path_mask(fb, points, stamp.radius) else { return };
    dab_mask(&mut mask, first.x.round() as i32, first.y.round() as i32, &stamp);
    for pair in points.windows(2) {
        dab_segment(&mut mask, pair[0], pair[1], &stamp);
    }
    blend_mask_in_place(fb, &mask, style.color, lut);
}

pub fn paint_stroke(fb: &mut FrameBuffer, stroke: &Stroke, lut: &GammaLut) {
    paint_path(fb, stroke.points(), stroke.style(), lut);
}

/// Background with every stroke painted on top, oldest first.
pub fn flatten(background: &FrameBuffer, strokes: &[Stroke], lut: &GammaLut) -> FrameBuffer {
    let mut out = background.clone();
    for stroke in strokes {
        paint_stroke(&mut out, stroke, lut);
    }
    out
}

/// Resize to exactly `width`x`height` with bilinear filtering.
pub fn scale_to(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Empty mask over the path's bounding box grown by `margin`, clipped to
/// the raster. None when the path lies entirely outside.
fn path_mask(fb: &FrameBuffer, points: &[Point], margin: i32) -> Option<Mask> {
    let (mut x0, mut y0) = (f32::MAX, f32::MAX);
    let (mut x1, mut y1) = (f32::MIN, f32::MIN);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }

    let left = (x0.round() as i32 - margin).max(0);
    let top = (y0.round() as i32 - margin).max(0);
    let right = (x1.round() as i32 + margin).min(fb.width as i32 - 1);
    let bottom = (y1.round() as i32 + margin).min(fb.height as i32 - 1);
    if right < left || bottom < top {
        return None;
    }

    Some(Mask::new(
        left,
        top,
        (right - left + 1) as usize,
        (bottom - top + 1) as usize,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn solid(width: f32, color: Color) -> StrokeStyle {
        StrokeStyle {
            anti_alias: false,
            ..StrokeStyle::new(color, width)
        }
    }

    #[test]
    fn horizontal_line_has_the_brush_thickness() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(40, 20, Color::WHITE);
        let pts = [Point::new(5.0, 10.0), Point::new(35.0, 10.0)];
        paint_path(&mut fb, &pts, &solid(6.0, Color::BLACK), &lut);

        let column: Vec<bool> = (0..20).map(|y| fb.pixel(20, y) == 0).collect();
        let painted = column.iter().filter(|p| **p).count();
        assert_eq!(painted, 7); // rows 7..=13
        assert!(column[10]);
        assert!(!column[6] && !column[14]);
    }

    #[test]
    fn single_point_leaves_a_round_dot() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(20, 20, Color::WHITE);
        paint_path(&mut fb, &[Point::new(10.0, 10.0)], &solid(4.0, Color::RED), &lut);
        assert_eq!(fb.pixel(10, 10), 0x00ff0000);
        assert_eq!(fb.pixel(12, 10), 0x00ff0000);
        assert_eq!(fb.pixel(12, 12), 0x00ffffff);
    }

    #[test]
    fn later_strokes_paint_over_earlier_ones() {
        let lut = GammaLut::new();
        let bg = FrameBuffer::new(20, 20, Color::WHITE);
        let pts = vec![Point::new(2.0, 10.0), Point::new(18.0, 10.0)];
        let strokes = [
            Stroke::new(pts.clone(), solid(4.0, Color::RED)),
            Stroke::new(pts, solid(4.0, Color::BLUE)),
        ];
        let out = flatten(&bg, &strokes, &lut);
        assert_eq!(out.pixel(10, 10), 0x000000ff);
        assert_eq!(bg.pixel(10, 10), 0x00ffffff);
    }

    #[test]
    fn strokes_outside_the_raster_are_clipped() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(10, 10, Color::WHITE);
        let before = fb.clone();
        paint_path(&mut fb, &[Point::new(-50.0, -50.0), Point::new(-40.0, -45.0)], &solid(4.0, Color::BLACK), &lut);
        assert_eq!(fb, before);
        paint_path(&mut fb, &[Point::new(-5.0, 5.0), Point::new(15.0, 5.0)], &solid(2.0, Color::BLACK), &lut);
        assert_eq!(fb.pixel(0, 5), 0);
        assert_eq!(fb.pixel(9, 5), 0);
    }

    #[test]
    fn huge_width_paints_the_whole_raster() {
        let lut = GammaLut::new();
        let mut fb = FrameBuffer::new(30, 20, Color::WHITE);
        paint_path(&mut fb, &[Point::new(3.0, 4.0), Point::new(9.0, 4.0)], &solid(1e12, Color::BLACK), &lut);
        assert!(fb.pixels.iter().all(|p| *p == 0));
    }

    #[test]
    fn scale_keeps_same_size_images_untouched() {
        let img = RgbaImage::from_fn(4, 3, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        assert_eq!(scale_to(&img, 4, 3), img);
        assert_eq!(scale_to(&img, 8, 2).dimensions(), (8, 2));
    }
}
