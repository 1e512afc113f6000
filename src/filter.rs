// Whole-image filters handed the flattened drawing.
// The canvas only sees the `FilterGateway` trait; `ImageFilters` is the
// implementation the app wires in, built on the `image` crate.

use std::fmt::{self, Display};

use image::imageops;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::Error;
use crate::types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterId {
    Grayscale,
    Invert,
    Tint(Color),
    Sketch,
    Oil,
}

impl Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterId::Grayscale => write!(f, "grayscale"),
            FilterId::Invert => write!(f, "invert"),
            FilterId::Tint(c) => write!(f, "tint #{:02x}{:02x}{:02x}", c.r, c.g, c.b),
            FilterId::Sketch => write!(f, "sketch"),
            FilterId::Oil => write!(f, "oil"),
        }
    }
}

/// A pure image transform. Implementations must return an image with the
/// input's dimensions and must not touch anything else.
pub trait FilterGateway {
    fn apply(&self, filter: FilterId, image: &RgbaImage) -> Result<RgbaImage, Error>;
}

#[derive(Debug, Clone)]
pub struct ImageFilters {
    pub oil_radius: u32,
    pub oil_levels: usize,
    pub sketch_blur: f32,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            oil_radius: 3,
            oil_levels: 20,
            sketch_blur: 4.0,
        }
    }
}

impl FilterGateway for ImageFilters {
    fn apply(&self, filter: FilterId, image: &RgbaImage) -> Result<RgbaImage, Error> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(Error::Filter { filter, reason: format!("empty {w}x{h} input") });
        }
        if filter == FilterId::Oil && self.oil_levels < 2 {
            return Err(Error::Filter { filter, reason: "oil filter needs two or more levels".into() });
        }

        let out = match filter {
            FilterId::Grayscale => DynamicImage::ImageRgba8(image.clone()).grayscale().to_rgba8(),
            FilterId::Invert => {
                let mut out = image.clone();
                imageops::invert(&mut out);
                out
            }
            FilterId::Tint(color) => tint(image, color),
            FilterId::Sketch => sketch(image, self.sketch_blur),
            FilterId::Oil => oil_paint(image, self.oil_radius, self.oil_levels),
        };
        Ok(out)
    }
}

/// Multiply each color channel by the tint; alpha is kept.
fn tint(image: &RgbaImage, color: Color) -> RgbaImage {
    let scale = |c: u8, t: u8| ((c as u32 * t as u32 + 127) / 255) as u8;
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *px;
        *px = Rgba([scale(r, color.r), scale(g, color.g), scale(b, color.b), a]);
    }
    out
}

/// Pencil look: grayscale divided by its blurred negative (color dodge).
fn sketch(image: &RgbaImage, sigma: f32) -> RgbaImage {
    let gray = imageops::grayscale(image);
    let mut negative = gray.clone();
    imageops::invert(&mut negative);
    let blurred = imageops::blur(&negative, sigma);

    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let base = gray.get_pixel(x, y)[0] as u32;
        let top = blurred.get_pixel(x, y)[0] as u32;
        let v = if top >= 255 { 255 } else { (base * 255 / (255 - top)).min(255) };
        Rgba([v as u8, v as u8, v as u8, image.get_pixel(x, y)[3]])
    })
}

/// Each pixel takes the mean color of the most common intensity level in
/// its neighbourhood.
fn oil_paint(image: &RgbaImage, radius: u32, levels: usize) -> RgbaImage {
    let (w, h) = image.dimensions();
    let bins = levels as u32 - 1;
    let level: Vec<usize> = image
        .pixels()
        .map(|p| ((p[0] as u32 + p[1] as u32 + p[2] as u32) / 3 * bins / 255) as usize)
        .collect();

    let mut count = vec![0u32; levels];
    let mut sum = vec![[0u32; 3]; levels];
    let r = radius as i64;

    RgbaImage::from_fn(w, h, |x, y| {
        count.fill(0);
        sum.fill([0; 3]);

        let y0 = (y as i64 - r).max(0) as u32;
        let y1 = (y as i64 + r).min(h as i64 - 1) as u32;
        let x0 = (x as i64 - r).max(0) as u32;
        let x1 = (x as i64 + r).min(w as i64 - 1) as u32;
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let bin = level[(ny * w + nx) as usize];
                let p = image.get_pixel(nx, ny);
                count[bin] += 1;
                sum[bin][0] += p[0] as u32;
                sum[bin][1] += p[1] as u32;
                sum[bin][2] += p[2] as u32;
            }
        }

        let mut best = 0;
        for bin in 1..levels {
            if count[bin] > count[best] {
                best = bin;
            }
        }
        let n = count[best].max(1);
        let [sr, sg, sb] = sum[best];
        Rgba([(sr / n) as u8, (sg / n) as u8, (sb / n) as u8, image.get_pixel(x, y)[3]])
    })
}
