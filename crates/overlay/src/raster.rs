//! Pixel surface backed by an RGBA image

use crate::surface::{Color, Font, Rect, Stroke, Surface};
use crate::SurfaceError;
use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size, Blend};
use imageproc::rect::Rect as PixelRect;
use std::path::Path;
use tracing::{debug, info};
use vision_core::Frame;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
/// Fallback glyph advance when no font is loaded
const CHAR_ADVANCE: f32 = 0.6;

/// Alpha-blended raster target
///
/// Text is only rasterized when a font has been loaded; without one, text
/// calls still measure consistently so layout decisions are unchanged.
pub struct RasterSurface {
    canvas: Blend<RgbaImage>,
    font: Option<FontVec>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Blend(RgbaImage::from_pixel(width, height, TRANSPARENT)),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    /// Load a TTF/OTF font used for labels and captions
    pub fn load_font(&mut self, path: impl AsRef<Path>) -> Result<(), SurfaceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| SurfaceError::Font {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| SurfaceError::Font {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Loaded overlay font from {}", path.display());
        self.font = Some(font);
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas.0
    }

    /// Overlay composited over `background`, or the bare overlay
    pub fn composite(&self, background: Option<&Frame>) -> RgbaImage {
        match background.and_then(Frame::to_image) {
            Some(rgb) => {
                let mut base = image::DynamicImage::ImageRgb8(rgb).to_rgba8();
                imageops::overlay(&mut base, &self.canvas.0, 0, 0);
                base
            }
            None => self.canvas.0.clone(),
        }
    }

    /// Write the (optionally composited) overlay as PNG
    pub fn save_png(
        &self,
        path: impl AsRef<Path>,
        background: Option<&Frame>,
    ) -> Result<(), SurfaceError> {
        let path = path.as_ref();
        self.composite(background).save(path)?;
        debug!("Saved overlay snapshot to {}", path.display());
        Ok(())
    }

    fn fill_span(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let w = w.round() as i64;
        let h = h.round() as i64;
        if w <= 0 || h <= 0 {
            return;
        }
        let rect = PixelRect::at(x.round() as i32, y.round() as i32).of_size(w as u32, h as u32);
        draw_filled_rect_mut(&mut self.canvas, rect, color);
    }

    /// Thick solid segment; axis-aligned segments become filled spans
    fn draw_segment(&mut self, a: (f32, f32), b: (f32, f32), width: f32, color: Rgba<u8>) {
        let half = width / 2.0;
        if (a.1 - b.1).abs() < f32::EPSILON {
            let x0 = a.0.min(b.0);
            self.fill_span(x0 - half, a.1 - half, (a.0 - b.0).abs() + width, width, color);
        } else if (a.0 - b.0).abs() < f32::EPSILON {
            let y0 = a.1.min(b.1);
            self.fill_span(a.0 - half, y0 - half, width, (a.1 - b.1).abs() + width, color);
        } else {
            let (dx, dy) = (b.0 - a.0, b.1 - a.1);
            let len = (dx * dx + dy * dy).sqrt();
            let (nx, ny) = (-dy / len, dx / len);
            let passes = width.max(1.0).round() as i32;
            for i in 0..passes {
                let t = i as f32 - (passes - 1) as f32 / 2.0;
                draw_line_segment_mut(
                    &mut self.canvas,
                    (a.0 + nx * t, a.1 + ny * t),
                    (b.0 + nx * t, b.1 + ny * t),
                    color,
                );
            }
        }
    }
}

fn to_pixel(color: Color) -> Rgba<u8> {
    let alpha = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([color.r, color.g, color.b, alpha])
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.canvas.0.width()
    }

    fn height(&self) -> u32 {
        self.canvas.0.height()
    }

    fn clear(&mut self) {
        for pixel in self.canvas.0.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_span(rect.x, rect.y, rect.width, rect.height, to_pixel(color));
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        let (x0, y0) = (rect.x, rect.y);
        let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
        self.stroke_polyline(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)], stroke);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: &Stroke) {
        let color = to_pixel(stroke.color);
        let Some([on, off]) = stroke.dash.filter(|[on, off]| *on > 0.0 && *off >= 0.0) else {
            for pair in points.windows(2) {
                self.draw_segment(pair[0], pair[1], stroke.width, color);
            }
            return;
        };

        // dash phase carries over segment joints
        let period = on + off;
        let mut phase = 0.0f32;
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (dx, dy) = (b.0 - a.0, b.1 - a.1);
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let mut t = 0.0f32;
            while t < len {
                let in_dash = phase < on;
                let remaining = if in_dash { on - phase } else { period - phase };
                let step = remaining.min(len - t);
                if in_dash {
                    let s = (a.0 + dx * t / len, a.1 + dy * t / len);
                    let e = (a.0 + dx * (t + step) / len, a.1 + dy * (t + step) / len);
                    self.draw_segment(s, e, stroke.width, color);
                }
                t += step;
                phase = (phase + step) % period;
            }
        }
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, top: Color, bottom: Color) {
        let rows = rect.height.round() as i64;
        if rows <= 0 {
            return;
        }
        for row in 0..rows {
            let t = if rows > 1 {
                row as f32 / (rows - 1) as f32
            } else {
                0.0
            };
            let color = Color {
                r: lerp(top.r, bottom.r, t),
                g: lerp(top.g, bottom.g, t),
                b: lerp(top.b, bottom.b, t),
                a: top.a + (bottom.a - top.a) * t,
            };
            self.fill_span(rect.x, rect.y + row as f32, rect.width, 1.0, to_pixel(color));
        }
    }

    fn measure_text(&self, text: &str, font: Font) -> f32 {
        match &self.font {
            Some(face) => {
                let (w, _) = text_size(PxScale::from(font.size_px), face, text);
                w as f32 + if font.bold { 1.0 } else { 0.0 }
            }
            None => text.chars().count() as f32 * font.size_px * CHAR_ADVANCE,
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: Font, color: Color) {
        let Some(face) = &self.font else {
            return;
        };
        let scale = PxScale::from(font.size_px);
        let pixel = to_pixel(color);
        let (x, y) = (x.round() as i32, y.round() as i32);
        draw_text_mut(&mut self.canvas, pixel, x, y, scale, face, text);
        if font.bold {
            draw_text_mut(&mut self.canvas, pixel, x + 1, y, scale, face, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_clear() {
        let mut surface = RasterSurface::new(20, 10);
        surface.fill_rect(Rect::new(2.0, 2.0, 4.0, 4.0), Color::rgb(255, 0, 0));

        assert_eq!(surface.image().get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.image().get_pixel(10, 3), &TRANSPARENT);

        surface.clear();
        assert!(surface.image().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::rgb(0, 0, 255));
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::rgba(255, 0, 0, 0.5));

        let p = surface.image().get_pixel(1, 1);
        assert!(p[0] > 100 && p[2] > 100);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_out_of_bounds_draws_are_clipped() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_rect(Rect::new(-50.0, -50.0, 20.0, 20.0), Color::WHITE);
        surface.stroke_rect(Rect::new(5.0, 5.0, 100.0, 100.0), &Stroke::solid(Color::WHITE, 3.0));
        surface.fill_rect(Rect::new(0.0, 0.0, 0.0, 5.0), Color::WHITE);
        assert_eq!(surface.image().get_pixel(0, 0), &TRANSPARENT);
        assert_eq!(surface.image().get_pixel(5, 7)[3], 255);
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut surface = RasterSurface::new(40, 5);
        surface.stroke_polyline(
            &[(0.0, 2.0), (40.0, 2.0)],
            &Stroke::dashed(Color::WHITE, 1.0, 10.0, 5.0),
        );
        assert_eq!(surface.image().get_pixel(4, 2)[3], 255);
        assert_eq!(surface.image().get_pixel(12, 2)[3], 0);
        assert_eq!(surface.image().get_pixel(17, 2)[3], 255);
    }

    #[test]
    fn test_text_without_font_measures_but_skips() {
        let mut surface = RasterSurface::new(50, 20);
        assert_eq!(surface.measure_text("ab", Font::regular(10.0)), 12.0);
        surface.fill_text("ab", 0.0, 0.0, Font::regular(10.0), Color::WHITE);
        assert!(surface.image().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_missing_font_file() {
        let mut surface = RasterSurface::new(1, 1);
        assert!(matches!(
            surface.load_font("/definitely/not/a/font.ttf"),
            Err(SurfaceError::Font { .. })
        ));
    }
}
