//! Per-class summary panel

use crate::layout::RenderConfig;
use crate::palette::class_color;
use crate::surface::{Color, Font, Rect, Stroke, Surface};
use prediction_filter::{class_counts, group_by_class};
use vision_core::{Detection, ObjectClass};

struct PanelStyle {
    origin: f32,
    width: f32,
    row_height: f32,
    header_height: f32,
    background_alpha: f32,
    border_width: f32,
    title: &'static str,
    title_font: Font,
    title_pos: (f32, f32),
    row_font: Font,
    first_row_y: f32,
    swatch_size: f32,
    swatch_x: f32,
    swatch_rise: f32,
    text_x: f32,
}

const FULL: PanelStyle = PanelStyle {
    origin: 10.0,
    width: 220.0,
    row_height: 25.0,
    header_height: 40.0,
    background_alpha: 0.7,
    border_width: 2.0,
    title: "Detection Summary",
    title_font: Font {
        size_px: 16.0,
        bold: true,
    },
    title_pos: (20.0, 30.0),
    row_font: Font {
        size_px: 14.0,
        bold: false,
    },
    first_row_y: 55.0,
    swatch_size: 15.0,
    swatch_x: 20.0,
    swatch_rise: 10.0,
    text_x: 45.0,
};

const COMPACT: PanelStyle = PanelStyle {
    origin: 8.0,
    width: 140.0,
    row_height: 18.0,
    header_height: 25.0,
    background_alpha: 0.6,
    border_width: 1.0,
    title: "Detected:",
    title_font: Font {
        size_px: 12.0,
        bold: true,
    },
    title_pos: (14.0, 22.0),
    row_font: Font {
        size_px: 11.0,
        bold: false,
    },
    first_row_y: 38.0,
    swatch_size: 10.0,
    swatch_x: 14.0,
    swatch_rise: 8.0,
    text_x: 30.0,
};

/// Classes listed in the compact panel
pub const COMPACT_TOP_CLASSES: usize = 3;

/// Per-class counts in first-encountered order, busiest classes first when compact
fn panel_rows(detections: &[Detection], compact: bool) -> Vec<(ObjectClass, usize)> {
    if compact {
        return class_counts(detections).top(COMPACT_TOP_CLASSES);
    }
    group_by_class(detections)
        .into_iter()
        .map(|(class, members)| (class, members.len()))
        .collect()
}

/// Draw the summary panel; full layout lists every class, compact only the top three
pub fn draw_stats_panel(
    surface: &mut dyn Surface,
    detections: &[Detection],
    config: &RenderConfig,
) {
    if detections.is_empty() {
        return;
    }

    let style = if config.is_compact { &COMPACT } else { &FULL };
    let rows = panel_rows(detections, config.is_compact);

    let panel = Rect::new(
        style.origin,
        style.origin,
        style.width,
        rows.len() as f32 * style.row_height + style.header_height,
    );
    surface.fill_rect(panel, Color::BLACK.with_alpha(style.background_alpha));
    surface.stroke_rect(panel, &Stroke::solid(Color::WHITE, style.border_width));
    surface.fill_text(
        style.title,
        style.title_pos.0,
        style.title_pos.1,
        style.title_font,
        Color::WHITE,
    );

    let mut y = style.first_row_y;
    for (class, count) in rows {
        surface.fill_rect(
            Rect::new(
                style.swatch_x,
                y - style.swatch_rise,
                style.swatch_size,
                style.swatch_size,
            ),
            class_color(&class),
        );
        surface.fill_text(
            &format!("{}: {}", class, count),
            style.text_x,
            y,
            style.row_font,
            Color::WHITE,
        );
        y += style.row_height;
    }
}
