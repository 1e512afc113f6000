// Strokes and the brush style they are drawn with.

use crate::types::{Color, Point};

/// Widest brush accepted, in pixels. A disc this size already covers most
/// of any canvas the window can show.
pub const MAX_BRUSH_WIDTH: f32 = 2048.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Round,
}

/// Brush settings. A plain value: every stroke keeps its own copy taken
/// when the stroke began, so later brush changes never repaint history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub anti_alias: bool,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            cap: LineCap::Round,
            join: LineJoin::Round,
            anti_alias: true,
        }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(Color::BLACK, 10.0)
    }
}

/// A committed stroke. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    style: StrokeStyle,
}

impl Stroke {
    pub(crate) fn new(points: Vec<Point>, style: StrokeStyle) -> Self {
        Self { points, style }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }
}
