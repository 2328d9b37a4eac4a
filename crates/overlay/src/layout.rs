//! Surface-size adaptive layout constants

use serde::Serialize;

/// Surfaces whose smaller side is below this use the compact layout
pub const COMPACT_THRESHOLD: u32 = 600;

/// Layout derived from the surface size on every paint
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderConfig {
    pub is_compact: bool,
    pub font_size_px: f32,
    pub person_line_width: f32,
    pub line_width: f32,
    pub shadow_alpha: f32,
    pub person_fill_opacity: f32,
    pub label_padding: f32,
    pub label_border_width: f32,
    pub bar_max_width: f32,
    pub bar_height: f32,
    pub bar_inset: f32,
    pub badge_size: f32,
    pub badge_font_px: f32,
    pub badge_text_inset: f32,
    pub border_offset: f32,
    pub border_dash: [f32; 2],
    pub corner_size: f32,
    pub corner_offset: f32,
    pub corner_width: f32,
    pub caption_font_px: f32,
    pub caption_rise: f32,
    pub caption_height: f32,
    pub caption_text_inset: f32,
    pub caption_border_width: f32,
}

impl RenderConfig {
    pub fn for_surface(width: u32, height: u32) -> Self {
        let min_dim = width.min(height);
        if min_dim < COMPACT_THRESHOLD {
            Self::compact(min_dim)
        } else {
            Self::full(min_dim)
        }
    }

    fn compact(min_dim: u32) -> Self {
        Self {
            is_compact: true,
            font_size_px: (min_dim as f32 / 30.0).clamp(10.0, 24.0),
            person_line_width: 3.0,
            line_width: 2.0,
            shadow_alpha: 0.2,
            person_fill_opacity: 0.15,
            label_padding: 4.0,
            label_border_width: 0.5,
            bar_max_width: 60.0,
            bar_height: 3.0,
            bar_inset: 3.0,
            badge_size: 18.0,
            badge_font_px: 10.0,
            badge_text_inset: 4.0,
            border_offset: 5.0,
            border_dash: [10.0, 5.0],
            corner_size: 15.0,
            corner_offset: 3.0,
            corner_width: 3.0,
            caption_font_px: 14.0,
            caption_rise: 30.0,
            caption_height: 20.0,
            caption_text_inset: 3.0,
            caption_border_width: 1.0,
        }
    }

    fn full(min_dim: u32) -> Self {
        Self {
            is_compact: false,
            font_size_px: (min_dim as f32 / 50.0).clamp(10.0, 24.0),
            person_line_width: 4.0,
            line_width: 3.0,
            shadow_alpha: 0.3,
            person_fill_opacity: 0.3,
            label_padding: 6.0,
            label_border_width: 1.0,
            bar_max_width: 100.0,
            bar_height: 4.0,
            bar_inset: 5.0,
            badge_size: 25.0,
            badge_font_px: 12.0,
            badge_text_inset: 5.0,
            border_offset: 10.0,
            border_dash: [15.0, 10.0],
            corner_size: 20.0,
            corner_offset: 5.0,
            corner_width: 4.0,
            caption_font_px: 18.0,
            caption_rise: 45.0,
            caption_height: 25.0,
            caption_text_inset: 5.0,
            caption_border_width: 2.0,
        }
    }

    /// Alert border width for pulse phase `p` in [0, 1]
    pub fn border_width(&self, pulse: f32) -> f32 {
        if self.is_compact {
            4.0 + pulse * 2.0
        } else {
            8.0 + pulse * 4.0
        }
    }

    pub fn show_confidence_text(&self, box_width: f32) -> bool {
        !self.is_compact || box_width > 80.0
    }

    pub fn show_confidence_bar(&self, box_width: f32) -> bool {
        !self.is_compact || box_width > 60.0
    }

    /// Badges are limited to the first three detections in compact mode
    pub fn show_badge(&self, index: usize) -> bool {
        !self.is_compact || index < 3
    }

    pub fn show_corners(&self, box_width: f32) -> bool {
        !self.is_compact || box_width > 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_below_threshold() {
        let cfg = RenderConfig::for_surface(500, 900);
        assert!(cfg.is_compact);
        assert_eq!(cfg.font_size_px, 500.0 / 30.0);
        assert_eq!(cfg.line_width, 2.0);
    }

    #[test]
    fn test_full_at_800() {
        let cfg = RenderConfig::for_surface(800, 800);
        assert!(!cfg.is_compact);
        assert_eq!(cfg.font_size_px, 16.0);
        assert_eq!(cfg.badge_size, 25.0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!RenderConfig::for_surface(600, 600).is_compact);
        assert!(RenderConfig::for_surface(599, 1080).is_compact);
    }

    #[test]
    fn test_font_size_clamped() {
        assert_eq!(RenderConfig::for_surface(100, 100).font_size_px, 10.0);
        assert_eq!(RenderConfig::for_surface(4000, 3000).font_size_px, 24.0);
    }

    #[test]
    fn test_visibility_rules() {
        let compact = RenderConfig::for_surface(320, 240);
        assert!(!compact.show_confidence_text(80.0));
        assert!(compact.show_confidence_text(81.0));
        assert!(!compact.show_badge(3));
        assert!(!compact.show_corners(100.0));

        let full = RenderConfig::for_surface(1280, 720);
        assert!(full.show_confidence_bar(10.0));
        assert!(full.show_badge(10));
        assert_eq!(full.border_width(1.0), 12.0);
    }
}
