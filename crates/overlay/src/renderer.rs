//! Detection overlay renderer

use crate::layout::RenderConfig;
use crate::palette::{class_color, confidence_color, ALERT_RED};
use crate::stats::draw_stats_panel;
use crate::surface::{Color, Font, Rect, Stroke, Surface};
use alerting::AlertSink;
use prediction_filter::DetectionSet;
use std::sync::Arc;
use tracing::trace;
use vision_core::{Clock, Detection};

/// Pulse phase in [0, 1] at `now_ms`, period 2π/4 seconds
pub fn pulse_at(now_ms: u64) -> f32 {
    let t = now_ms as f64 / 1000.0;
    ((t * 4.0).sin() * 0.5 + 0.5) as f32
}

/// Paints detection sets and raises per-detection alerts in the same pass
pub struct Renderer {
    clock: Arc<dyn Clock>,
}

impl Renderer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Clear `surface` and redraw `set` in full
    ///
    /// For each detection, person classes raise `person_detected`, vehicle
    /// classes raise `vehicle_detected`, and alert-allowlist classes are
    /// announced with their count in this set.
    pub fn paint(
        &self,
        surface: &mut dyn Surface,
        set: &DetectionSet,
        alerts: &mut dyn AlertSink,
    ) -> RenderConfig {
        surface.clear();
        let config = RenderConfig::for_surface(surface.width(), surface.height());
        if set.is_empty() {
            return config;
        }

        let pulse = pulse_at(self.clock.now_ms());
        trace!(
            "Painting {} detections (compact: {}, pulse {:.2})",
            set.len(),
            config.is_compact,
            pulse
        );

        for (index, detection) in set.iter().enumerate() {
            let is_person = detection.class.is_person();
            self.draw_box(surface, detection, &config);
            self.draw_label(surface, detection, &config);
            self.draw_confidence_bar(surface, detection, &config);

            if is_person {
                alerts.person_detected();
                self.draw_person_alert(surface, detection, index, pulse, &config);
            } else if detection.class.is_vehicle() {
                alerts.vehicle_detected(&detection.class);
            }

            if detection.class.is_alert_class() {
                alerts.announce(&detection.class, set.count_of(&detection.class));
            }

            if config.show_badge(index) {
                self.draw_badge(surface, detection, index, &config);
            }
        }

        draw_stats_panel(surface, set.detections(), &config);
        config
    }

    fn draw_box(&self, surface: &mut dyn Surface, det: &Detection, config: &RenderConfig) {
        let bbox = rect_of(det);
        let is_person = det.class.is_person();
        let width = if is_person {
            config.person_line_width
        } else {
            config.line_width
        };

        surface.stroke_rect(
            bbox.offset(1.0, 1.0),
            &Stroke::solid(Color::BLACK.with_alpha(config.shadow_alpha), width + 1.0),
        );
        surface.stroke_rect(bbox, &Stroke::solid(class_color(&det.class), width));

        if is_person {
            let opacity = config.person_fill_opacity;
            surface.fill_vertical_gradient(
                bbox,
                ALERT_RED.with_alpha(opacity),
                ALERT_RED.with_alpha(opacity * 0.3),
            );
        }
    }

    fn draw_label(&self, surface: &mut dyn Surface, det: &Detection, config: &RenderConfig) {
        let bbox = rect_of(det);
        let text = if config.show_confidence_text(bbox.width) {
            format!("{} ({:.0}%)", det.class, det.score * 100.0)
        } else {
            det.class.to_string()
        };

        let font = Font::bold(config.font_size_px);
        let text_width = surface.measure_text(&text, font);
        let pad = config.label_padding;
        let label_height = config.font_size_px + pad * 2.0;
        let fits = bbox.y - label_height > 0.0
            && text_width + pad * 2.0 < surface.width() as f32 - bbox.x;
        if !fits {
            return;
        }

        let label = Rect::new(bbox.x, bbox.y - label_height, text_width + pad * 2.0, label_height);
        surface.fill_rect(label, class_color(&det.class));
        surface.stroke_rect(
            label,
            &Stroke::solid(Color::WHITE.with_alpha(0.8), config.label_border_width),
        );
        surface.fill_text(&text, bbox.x + pad, label.y + pad, font, Color::WHITE);
    }

    fn draw_confidence_bar(&self, surface: &mut dyn Surface, det: &Detection, config: &RenderConfig) {
        let bbox = rect_of(det);
        if !config.show_confidence_bar(bbox.width) {
            return;
        }
        let bar_width = (bbox.width * 0.8).min(config.bar_max_width);
        let bar_y = bbox.y + bbox.height - config.bar_height - config.bar_inset;

        surface.fill_rect(
            Rect::new(bbox.x, bar_y, bar_width, config.bar_height),
            Color::BLACK.with_alpha(0.3),
        );
        surface.fill_rect(
            Rect::new(bbox.x, bar_y, bar_width * det.score, config.bar_height),
            confidence_color(det.score),
        );
    }

    fn draw_person_alert(
        &self,
        surface: &mut dyn Surface,
        det: &Detection,
        index: usize,
        pulse: f32,
        config: &RenderConfig,
    ) {
        let bbox = rect_of(det);
        let [on, off] = config.border_dash;
        surface.stroke_rect(
            bbox.inflate(config.border_offset),
            &Stroke::dashed(
                ALERT_RED.with_alpha(0.7 + pulse * 0.3),
                config.border_width(pulse),
                on,
                off,
            ),
        );

        if config.show_corners(bbox.width) {
            let stroke = Stroke::solid(ALERT_RED, config.corner_width);
            let size = config.corner_size;
            let (l, t) = (bbox.x - config.corner_offset, bbox.y - config.corner_offset);
            let (r, b) = (
                bbox.x + bbox.width + config.corner_offset,
                bbox.y + bbox.height + config.corner_offset,
            );
            surface.stroke_polyline(&[(l, t + size), (l, t), (l + size, t)], &stroke);
            surface.stroke_polyline(&[(r - size, t), (r, t), (r, t + size)], &stroke);
            surface.stroke_polyline(&[(l, b - size), (l, b), (l + size, b)], &stroke);
            surface.stroke_polyline(&[(r - size, b), (r, b), (r, b - size)], &stroke);
        }

        let caption = if config.is_compact {
            format!("⚠ PERSON #{}", index + 1)
        } else {
            format!("⚠ PERSON DETECTED #{}", index + 1)
        };
        let font = Font::bold(config.caption_font_px);
        let text_width = surface.measure_text(&caption, font);
        let caption_y = bbox.y - config.caption_rise;
        if caption_y <= 0.0 || text_width + 16.0 >= surface.width() as f32 - bbox.x {
            return;
        }

        let background = Rect::new(bbox.x, caption_y, text_width + 16.0, config.caption_height);
        surface.fill_rect(background, ALERT_RED.with_alpha(0.8 + pulse * 0.2));
        surface.stroke_rect(
            background,
            &Stroke::solid(Color::WHITE, config.caption_border_width),
        );
        surface.fill_text(
            &caption,
            bbox.x + 8.0,
            caption_y + config.caption_text_inset,
            font,
            Color::WHITE,
        );
    }

    fn draw_badge(&self, surface: &mut dyn Surface, det: &Detection, index: usize, config: &RenderConfig) {
        let bbox = rect_of(det);
        let size = config.badge_size;
        let left = bbox.x + bbox.width - size;
        surface.fill_rect(Rect::new(left, bbox.y, size, size), Color::BLACK.with_alpha(0.7));
        surface.fill_text(
            &(index + 1).to_string(),
            left + config.badge_text_inset,
            bbox.y + 2.0,
            Font::bold(config.badge_font_px),
            Color::WHITE,
        );
    }
}

fn rect_of(det: &Detection) -> Rect {
    Rect::new(det.bbox.x, det.bbox.y, det.bbox.width, det.bbox.height)
}
