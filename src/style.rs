//! Colors, markers and line metrics shared by every chart.

use plotters::style::RGBColor;
use serde::Serialize;
use std::fmt;

/// Opacity applied to lines and markers
pub const SERIES_ALPHA: f64 = 0.7;
/// Marker diameter (pt)
pub const MARKER_SIZE_PT: f64 = 6.0;
/// Series line width (pt)
pub const LINE_WIDTH_PT: f64 = 2.0;
/// Axis description font (pt)
pub const LABEL_FONT_PT: f64 = 12.0;
/// Chart title font (pt)
pub const TITLE_FONT_PT: f64 = 14.0;
/// Tick labels and legend entries (pt)
pub const TICK_FONT_PT: f64 = 10.0;
pub const LEGEND_FONT_PT: f64 = 10.0;
/// Grid line width (pt)
pub const GRID_WIDTH_PT: f64 = 0.8;
pub const GRID_ALPHA: f64 = 0.3;
pub const GRID_COLOR: RGBColor = RGBColor(0xb0, 0xb0, 0xb0);
pub const LEGEND_EDGE: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);

/// Convert a typographic size in points to pixels at `dpi`.
pub fn points_to_px(points: f64, dpi: u32) -> u32 {
    (points * dpi as f64 / 72.0).round().max(1.0) as u32
}

/// Series colors, one per input file of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Blue,
    Green,
    Red,
    Purple,
}

impl NamedColor {
    /// RGB value, matching the usual web/matplotlib named colors
    pub fn rgb(self) -> RGBColor {
        match self {
            NamedColor::Blue => RGBColor(0x00, 0x00, 0xff),
            NamedColor::Green => RGBColor(0x00, 0x80, 0x00),
            NamedColor::Red => RGBColor(0xff, 0x00, 0x00),
            NamedColor::Purple => RGBColor(0x80, 0x00, 0x80),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NamedColor::Blue => "blue",
            NamedColor::Green => "green",
            NamedColor::Red => "red",
            NamedColor::Purple => "purple",
        }
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Point marker, one per trial index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Circle,
    Square,
    Triangle,
}

impl Marker {
    pub const CYCLE: [Marker; 3] = [Marker::Circle, Marker::Square, Marker::Triangle];

    /// Marker for the `index`-th trial column (0-based). Wraps around after
    /// the third trial.
    pub fn for_trial(index: usize) -> Marker {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_three_trials_get_distinct_markers() {
        assert_eq!(Marker::for_trial(0), Marker::Circle);
        assert_eq!(Marker::for_trial(1), Marker::Square);
        assert_eq!(Marker::for_trial(2), Marker::Triangle);
        assert_eq!(Marker::for_trial(3), Marker::Circle);
    }

    #[test]
    fn named_colors_match_web_palette() {
        assert_eq!(NamedColor::Blue.rgb(), RGBColor(0, 0, 255));
        assert_eq!(NamedColor::Green.rgb(), RGBColor(0, 128, 0));
        assert_eq!(NamedColor::Red.rgb(), RGBColor(255, 0, 0));
        assert_eq!(NamedColor::Purple.rgb(), RGBColor(128, 0, 128));
        assert_eq!(NamedColor::Purple.to_string(), "purple");
    }

    #[test]
    fn points_scale_with_dpi() {
        assert_eq!(points_to_px(72.0, 300), 300);
        assert_eq!(points_to_px(12.0, 300), 50);
        assert_eq!(points_to_px(6.0, 72), 6);
        // never collapses to zero
        assert_eq!(points_to_px(0.1, 72), 1);
    }
}
