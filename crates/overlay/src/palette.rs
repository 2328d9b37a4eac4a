//! Class colours and confidence bands

use crate::surface::Color;
use vision_core::ObjectClass;

pub const DEFAULT_COLOR: Color = Color::hex(0xFFFFFF);
pub const ALERT_RED: Color = Color::hex(0xFF0000);

/// Box, label, and swatch colour for a class
pub fn class_color(class: &ObjectClass) -> Color {
    match class {
        ObjectClass::Person => Color::hex(0xFF0000),
        ObjectClass::Car => Color::hex(0x00FF00),
        ObjectClass::Truck => Color::hex(0x0000FF),
        ObjectClass::Bicycle => Color::hex(0xFFFF00),
        ObjectClass::Motorcycle => Color::hex(0xFF00FF),
        ObjectClass::Bus => Color::hex(0x00FFFF),
        ObjectClass::Cat => Color::hex(0xFFA500),
        ObjectClass::Dog => Color::hex(0x800080),
        ObjectClass::Bird => Color::hex(0xFFC0CB),
        _ => DEFAULT_COLOR,
    }
}

/// Confidence bar fill: green above 0.8, yellow above 0.6, orange otherwise
pub fn confidence_color(score: f32) -> Color {
    if score > 0.8 {
        Color::hex(0x00FF00)
    } else if score > 0.6 {
        Color::hex(0xFFFF00)
    } else {
        Color::hex(0xFF8800)
    }
}
