use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Metric;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Marker colour for the selected year on the trend chart.
pub const HIGHLIGHT: Color32 = Color32::RED;

/// Warning text for "no data" conditions.
pub const WARNING: Color32 = Color32::from_rgb(230, 160, 20);

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // Start at blue so a lone series keeps the usual chart colour.
            let hue = (210.0 + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Series colours: metric → Color32
// ---------------------------------------------------------------------------

/// Pair each plotted metric with a distinct colour.
pub fn series_colors(metrics: &[Metric]) -> Vec<(Metric, Color32)> {
    metrics
        .iter()
        .copied()
        .zip(generate_palette(metrics.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(3);
        assert_eq!(colors.len(), 3);
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn every_metric_gets_a_colour() {
        let metrics = [Metric::TransformationIndex, Metric::TechnologyDimension];
        let pairs = series_colors(&metrics);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, Metric::TransformationIndex);
        assert!(!pairs.iter().any(|(_, c)| *c == HIGHLIGHT));
    }
}
