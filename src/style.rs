// style.rs

use plotters::prelude::RGBColor;

use crate::feeds::Earthquake;

/// Lower bounds of the depth intervals shown in the legend, in km.
pub const DEPTH_BREAKS: [f64; 6] = [-10.0, 10.0, 30.0, 50.0, 70.0, 90.0];

/// One colour per depth interval, shallow to deep.
pub const DEPTH_COLORS: [RGBColor; 6] = [
    RGBColor(0x98, 0xee, 0x00),
    RGBColor(0xd4, 0xee, 0x00),
    RGBColor(0xee, 0xcc, 0x00),
    RGBColor(0xee, 0x9c, 0x00),
    RGBColor(0xea, 0x82, 0x2c),
    RGBColor(0xea, 0x2c, 0x2c),
];

pub const UNKNOWN_DEPTH_COLOR: RGBColor = RGBColor(0, 0, 0);
pub const PLATE_COLOR: RGBColor = RGBColor(255, 165, 0); // Orange

// Marker radius in pixels per unit of magnitude
const RADIUS_SCALE: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct MarkerStyle {
    pub color: RGBColor,
    pub radius: f64, // pixels
}

#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub color: RGBColor,
    pub label: String,
}

/// Picks the marker colour for an earthquake depth in km.
pub fn depth_color(depth: Option<f64>) -> RGBColor {
    let Some(depth) = depth else {
        return UNKNOWN_DEPTH_COLOR;
    };
    if (-10.0..=10.0).contains(&depth) {
        DEPTH_COLORS[0]
    } else if depth > 10.0 && depth <= 30.0 {
        DEPTH_COLORS[1]
    } else if depth > 30.0 && depth <= 50.0 {
        DEPTH_COLORS[2]
    } else if depth > 50.0 && depth <= 70.0 {
        DEPTH_COLORS[3]
    } else if depth > 70.0 && depth <= 90.0 {
        DEPTH_COLORS[4]
    } else if depth > 90.0 {
        DEPTH_COLORS[5]
    } else {
        // Shallower than -10 km, or NaN
        UNKNOWN_DEPTH_COLOR
    }
}

/// Marker radius in pixels for a magnitude.
pub fn magnitude_radius(magnitude: Option<f64>) -> f64 {
    match magnitude {
        Some(m) if m == 0.0 => 0.0,
        Some(m) if m.is_finite() => (m * RADIUS_SCALE).max(0.0),
        _ => 0.0,
    }
}

pub fn style_info(quake: &Earthquake) -> MarkerStyle {
    MarkerStyle {
        color: depth_color(quake.depth),
        radius: magnitude_radius(quake.magnitude),
    }
}

/// Builds the depth legend, one swatch per interval.
pub fn legend() -> Vec<LegendEntry> {
    DEPTH_BREAKS
        .iter()
        .enumerate()
        .map(|(i, lower)| {
            let label = match DEPTH_BREAKS.get(i + 1) {
                Some(upper) => format!("{}–{}", lower, upper),
                None => format!("{}+", lower),
            };
            LegendEntry {
                color: DEPTH_COLORS[i],
                label,
            }
        })
        .collect()
}

pub fn to_tui_color(color: RGBColor) -> ratatui::style::Color {
    ratatui::style::Color::Rgb(color.0, color.1, color.2)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Formats a colour as `#rrggbb`.
    pub(crate) fn hex(color: RGBColor) -> String {
        format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
    }

    #[test]
    fn depth_bands_follow_interval_edges() {
        assert_eq!(hex(depth_color(Some(-10.0))), "#98ee00");
        assert_eq!(hex(depth_color(Some(10.0))), "#98ee00");
        assert_eq!(hex(depth_color(Some(10.5))), "#d4ee00");
        assert_eq!(hex(depth_color(Some(30.0))), "#d4ee00");
        assert_eq!(hex(depth_color(Some(45.0))), "#eecc00");
        assert_eq!(hex(depth_color(Some(70.0))), "#ee9c00");
        assert_eq!(hex(depth_color(Some(89.9))), "#ea822c");
        assert_eq!(hex(depth_color(Some(90.1))), "#ea2c2c");
        assert_eq!(hex(depth_color(Some(650.0))), "#ea2c2c");
    }

    #[test]
    fn out_of_range_depths_are_black() {
        assert_eq!(hex(depth_color(Some(-10.01))), "#000000");
        assert_eq!(hex(depth_color(Some(f64::NAN))), "#000000");
        assert_eq!(hex(depth_color(None)), "#000000");
    }

    #[test]
    fn radius_scales_with_magnitude() {
        assert_relative_eq!(magnitude_radius(Some(0.0)), 0.0);
        assert_relative_eq!(magnitude_radius(Some(1.2)), 6.0);
        assert_relative_eq!(magnitude_radius(Some(4.5)), 22.5);
        assert_relative_eq!(magnitude_radius(Some(-0.8)), 0.0);
        assert_relative_eq!(magnitude_radius(None), 0.0);
    }

    #[test]
    fn legend_labels_pair_consecutive_breaks() {
        let labels: Vec<String> = legend().into_iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec!["-10–10", "10–30", "30–50", "50–70", "70–90", "90+"]
        );
    }

    #[test]
    fn legend_colors_match_depth_colors() {
        for entry in legend() {
            let lower: f64 = entry
                .label
                .trim_end_matches('+')
                .split('–')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap();
            // A point just inside each interval gets the swatch colour
            let probe = if lower == -10.0 { lower } else { lower + 0.5 };
            assert_eq!(hex(depth_color(Some(probe))), hex(entry.color));
        }
    }
}
