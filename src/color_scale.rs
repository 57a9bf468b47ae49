//! Activation-strength color mapping for heatmap and profile cells.

use eframe::egui::Color32;

const BACKGROUND: Color32 = Color32::from_rgb(248, 248, 248);
const HIGHLIGHT: Color32 = Color32::from_rgb(198, 12, 48);

/// Linear interpolation from the panel background toward the highlight
/// color, clamped to [0, 1]. A non-positive maximum maps everything to the
/// background.
pub fn activation_color(value: f64, max_value: f64) -> Color32 {
    if max_value <= 0.0 {
        return BACKGROUND;
    }
    let t = (value / max_value).clamp(0.0, 1.0) as f32;
    let lerp = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
    Color32::from_rgb(
        lerp(BACKGROUND.r(), HIGHLIGHT.r()),
        lerp(BACKGROUND.g(), HIGHLIGHT.g()),
        lerp(BACKGROUND.b(), HIGHLIGHT.b()),
    )
}
