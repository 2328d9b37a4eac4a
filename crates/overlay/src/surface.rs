//! Immediate-mode drawing surface contract

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA colour, alpha in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `0xRRGGBB`
    pub const fn hex(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow by `by` on every side
    pub fn inflate(&self, by: f32) -> Self {
        Self::new(
            self.x - by,
            self.y - by,
            self.width + by * 2.0,
            self.height + by * 2.0,
        )
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Outline style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    /// `[on, off]` lengths; `None` draws a solid line
    pub dash: Option<[f32; 2]>,
}

impl Stroke {
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }

    pub fn dashed(color: Color, width: f32, on: f32, off: f32) -> Self {
        Self {
            color,
            width,
            dash: Some([on, off]),
        }
    }
}

/// Text style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub size_px: f32,
    pub bold: bool,
}

impl Font {
    pub fn regular(size_px: f32) -> Self {
        Self {
            size_px,
            bold: false,
        }
    }

    pub fn bold(size_px: f32) -> Self {
        Self {
            size_px,
            bold: true,
        }
    }
}

/// 2D target the renderer paints onto
///
/// Text positions are the top-left corner of the text box.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset every pixel to transparent
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke);
    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: &Stroke);

    /// Linear gradient from `top` at the rect's top edge to `bottom` at its bottom edge
    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color);

    /// Advance width of `text` in pixels
    fn measure_text(&self, text: &str, font: Font) -> f32;
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: Font, color: Color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colour() {
        assert_eq!(Color::hex(0xFFA500), Color::rgb(255, 165, 0));
        assert_eq!(Color::hex(0x800080).with_alpha(2.0).a, 1.0);
    }

    #[test]
    fn test_rect_inflate() {
        let r = Rect::new(10.0, 10.0, 50.0, 100.0).inflate(5.0);
        assert_eq!(r, Rect::new(5.0, 5.0, 60.0, 110.0));
    }
}
