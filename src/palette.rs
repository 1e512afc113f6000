// Quick brush colors and sizes offered by the shell.

use serde::{Deserialize, Serialize};

use crate::types::Color;

pub const BRUSH_SMALL: f32 = 10.0;
pub const BRUSH_MEDIUM: f32 = 25.0;
pub const BRUSH_LARGE: f32 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub color: Color,
}

impl NamedColor {
    pub fn new(name: &str, argb: u32) -> Self {
        Self {
            name: name.to_owned(),
            color: Color::from_argb(argb),
        }
    }
}

pub fn default_colors() -> Vec<NamedColor> {
    vec![
        NamedColor::new("Custom", 0xff000000),
        NamedColor::new("Red", 0xffff0000),
        NamedColor::new("Orange", 0xffff8c00),
        NamedColor::new("Yellow", 0xffffff00),
        NamedColor::new("Green", 0xff00ff00),
        NamedColor::new("Blue", 0xff0000ff),
        NamedColor::new("Purple", 0xff551a8b),
        NamedColor::new("Brown", 0xffa0522d),
        NamedColor::new("White", 0xffffffff),
        NamedColor::new("Grey", 0xff666666),
        NamedColor::new("Black", 0xff000000),
    ]
}

pub fn default_brush_presets() -> Vec<f32> {
    vec![BRUSH_SMALL, BRUSH_MEDIUM, BRUSH_LARGE]
}

/// A cyclic cursor over the configured colors.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<NamedColor>,
    selected: usize,
}

impl Palette {
    /// An empty list falls back to the built-in colors.
    pub fn new(colors: Vec<NamedColor>) -> Self {
        let colors = if colors.is_empty() { default_colors() } else { colors };
        Self { colors, selected: 0 }
    }

    pub fn selected(&self) -> &NamedColor {
        &self.colors[self.selected]
    }

    pub fn next(&mut self) -> &NamedColor {
        self.selected = (self.selected + 1) % self.colors.len();
        self.selected()
    }

    pub fn previous(&mut self) -> &NamedColor {
        self.selected = (self.selected + self.colors.len() - 1) % self.colors.len();
        self.selected()
    }

    /// Point the cursor at the first entry with `color`, if any.
    pub fn select_color(&mut self, color: Color) {
        if let Some(i) = self.colors.iter().position(|c| c.color == color) {
            self.selected = i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_in_both_directions() {
        let mut p = Palette::new(default_colors());
        assert_eq!(p.selected().name, "Custom");
        assert_eq!(p.next().name, "Red");
        assert_eq!(p.previous().name, "Custom");
        assert_eq!(p.previous().name, "Black");
        assert_eq!(p.next().name, "Custom");
    }

    #[test]
    fn empty_configuration_uses_the_built_in_colors() {
        let p = Palette::new(Vec::new());
        assert_eq!(p.selected().color, Color::BLACK);
    }

    #[test]
    fn select_color_moves_the_cursor() {
        let mut p = Palette::new(default_colors());
        p.select_color(Color::rgb(0x55, 0x1a, 0x8b));
        assert_eq!(p.selected().name, "Purple");
        p.select_color(Color::rgb(1, 2, 3));
        assert_eq!(p.selected().name, "Purple");
    }
}
