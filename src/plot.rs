//! Chart rendering for trial comparison reports.

use crate::report::ReportSpec;
use crate::style::{
    points_to_px, Marker, NamedColor, GRID_ALPHA, GRID_COLOR, GRID_WIDTH_PT, LABEL_FONT_PT,
    LEGEND_EDGE, LEGEND_FONT_PT, LINE_WIDTH_PT, MARKER_SIZE_PT, SERIES_ALPHA, TICK_FONT_PT,
    TITLE_FONT_PT,
};
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Family name every text element is drawn with
const FONT_FAMILY: &str = "sans-serif";
/// Bundled so rendering never depends on fonts installed on the host
static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Fraction of the data span added on each side of an axis
const AXIS_MARGIN: f64 = 0.05;
/// Horizontal gap between axes and legend, as a fraction of the axes width
const LEGEND_OFFSET: f64 = 0.05;

/// Image format of the saved chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    /// `path` with its extension replaced to match this format
    pub fn apply(self, path: &Path) -> PathBuf {
        path.with_extension(self.extension())
    }
}

/// Physical size of the axes area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Default for Figure {
    fn default() -> Self {
        Self {
            width_in: 12.0,
            height_in: 8.0,
            dpi: 300,
        }
    }
}

impl Figure {
    fn px(&self, points: f64) -> u32 {
        points_to_px(points, self.dpi)
    }

    /// Pixel size of the axes area (title, labels and plot, no legend)
    pub fn axes_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round() as u32,
            (self.height_in * self.dpi as f64).round() as u32,
        )
    }

    fn legend_gap(&self) -> u32 {
        (self.axes_size().0 as f64 * LEGEND_OFFSET).round() as u32
    }

    /// Size of the legend box for `series`
    pub fn legend_size(&self, series: &[PlotSeries]) -> (u32, u32) {
        let font = self.px(LEGEND_FONT_PT);
        let pad = font / 2;
        let handle = font * 2;
        // rough advance width of a sans-serif glyph
        let longest = series.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
        let text = (longest as f64 * font as f64 * 0.6).ceil() as u32;
        let width = pad * 3 + handle + text;
        let height = pad * 2 + series.len() as u32 * self.legend_row(font);
        (width, height)
    }

    fn legend_row(&self, font: u32) -> u32 {
        (font as f64 * 1.4).round() as u32
    }

    /// Total image size: axes plus the legend to their right, cropped to
    /// what is drawn.
    pub fn canvas_size(&self, series: &[PlotSeries]) -> (u32, u32) {
        let (axes_w, axes_h) = self.axes_size();
        if series.is_empty() {
            return (axes_w, axes_h);
        }
        let (legend_w, legend_h) = self.legend_size(series);
        let legend_bottom = self.legend_top() + legend_h + self.px(LEGEND_FONT_PT);
        (
            axes_w + self.legend_gap() + legend_w,
            axes_h.max(legend_bottom),
        )
    }

    fn margin(&self) -> u32 {
        self.px(6.0)
    }

    fn caption_height(&self) -> u32 {
        // plotters reserves the font size plus a small gap for the caption
        let title = self.px(TITLE_FONT_PT);
        title + title / 2
    }

    /// Top of the plotting area, where the legend is anchored
    fn legend_top(&self) -> u32 {
        self.margin() + self.caption_height()
    }
}

/// One trial line ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    /// Legend text, e.g. `P14 - Trial 2`
    pub label: String,
    pub color: NamedColor,
    pub marker: Marker,
    pub points: Vec<(f64, Option<f64>)>,
}

impl PlotSeries {
    /// Points that can be shown on a log-scaled y-axis
    pub fn drawable_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|&(x, y)| y.filter(|v| is_drawable(x, *v)).map(|y| (x, y)))
            .collect()
    }

    /// Connected runs of drawable points. A gap or non-positive value
    /// breaks the line.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for &(x, y) in &self.points {
            match y {
                Some(y) if is_drawable(x, y) => current.push((x, y)),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

fn is_drawable(x: f64, y: f64) -> bool {
    x.is_finite() && y.is_finite() && y > 0.0
}

/// Linear x range over all drawable points, padded on both sides
pub fn x_range(series: &[PlotSeries]) -> Range<f64> {
    let (lo, hi) = bounds(series.iter().flat_map(|s| s.drawable_points()).map(|(x, _)| x));
    match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => {
            let pad = (hi - lo) * AXIS_MARGIN;
            (lo - pad)..(hi + pad)
        }
        (Some(v), Some(_)) => (v - 1.0)..(v + 1.0),
        _ => 0.0..1.0,
    }
}

/// Positive y range over all drawable points, padded in log space
pub fn y_log_range(series: &[PlotSeries]) -> Range<f64> {
    let (lo, hi) = bounds(series.iter().flat_map(|s| s.drawable_points()).map(|(_, y)| y));
    match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => {
            let (log_lo, log_hi) = (lo.log10(), hi.log10());
            let pad = (log_hi - log_lo) * AXIS_MARGIN;
            10f64.powf(log_lo - pad)..10f64.powf(log_hi + pad)
        }
        (Some(v), Some(_)) => (v / 10.0)..(v * 10.0),
        _ => 1.0..10.0,
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (Option<f64>, Option<f64>) {
    values.fold((None, None), |(lo, hi), v| {
        (
            Some(lo.map_or(v, |l: f64| l.min(v))),
            Some(hi.map_or(v, |h: f64| h.max(v))),
        )
    })
}

/// Register the bundled font under `FONT_FAMILY`, once per process.
fn register_fonts() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).is_ok());
    if ok {
        Ok(())
    } else {
        Err(anyhow!("Bundled font is not a valid TrueType file"))
    }
}

/// Tick label for the log axis
fn log_tick_label(value: f64) -> String {
    format!("{:e}", value)
}

/// Render `series` for `spec` into `path`. Parent directories are created.
pub fn render(
    spec: &ReportSpec,
    series: &[PlotSeries],
    path: &Path,
    format: OutputFormat,
    figure: &Figure,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    register_fonts()?;

    let size = figure.canvas_size(series);
    match format {
        OutputFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_figure(&root, spec, series, figure)?;
            root.present()
                .with_context(|| format!("Failed to write chart: {}", path.display()))?;
        }
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_figure(&root, spec, series, figure)?;
            root.present()
                .with_context(|| format!("Failed to write chart: {}", path.display()))?;
        }
    }
    Ok(())
}

fn draw_figure<DB>(
    root: &DrawingArea<DB, Shift>,
    spec: &ReportSpec,
    series: &[PlotSeries],
    figure: &Figure,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (axes_w, _) = figure.axes_size();
    let (axes_area, legend_area) = root.split_horizontally(axes_w);

    let title_px = figure.px(TITLE_FONT_PT) as f64;
    let label_px = figure.px(LABEL_FONT_PT) as f64;
    let tick_px = figure.px(TICK_FONT_PT) as f64;
    let grid = GRID_COLOR
        .mix(GRID_ALPHA)
        .stroke_width(figure.px(GRID_WIDTH_PT));

    let mut chart = ChartBuilder::on(&axes_area)
        .caption(&spec.title, (FONT_FAMILY, title_px))
        .margin(figure.margin())
        .x_label_area_size(figure.px(40.0))
        .y_label_area_size(figure.px(60.0))
        .build_cartesian_2d(x_range(series), y_log_range(series).log_scale())?;

    chart
        .configure_mesh()
        .x_desc(&spec.x_label)
        .y_desc(&spec.y_label)
        .axis_desc_style((FONT_FAMILY, label_px))
        .label_style((FONT_FAMILY, tick_px))
        .bold_line_style(grid)
        .light_line_style(grid)
        // minor lines only on the log y-axis
        .x_max_light_lines(0)
        .axis_style(BLACK.stroke_width(figure.px(GRID_WIDTH_PT)))
        .y_label_formatter(&|v| log_tick_label(*v))
        .draw()?;

    let line_px = figure.px(LINE_WIDTH_PT);
    let radius = (figure.px(MARKER_SIZE_PT) / 2).max(1) as i32;

    for s in series {
        let color = s.color.rgb().mix(SERIES_ALPHA);
        for segment in s.segments() {
            chart.draw_series(LineSeries::new(segment, color.stroke_width(line_px)))?;
        }

        let fill = color.filled();
        let points = s.drawable_points();
        match s.marker {
            Marker::Circle => {
                chart.draw_series(points.iter().map(|&p| Circle::new(p, radius, fill)))?;
            }
            Marker::Square => {
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p) + Rectangle::new([(-radius, -radius), (radius, radius)], fill)
                }))?;
            }
            Marker::Triangle => {
                chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, radius, fill)))?;
            }
        }
    }

    if !series.is_empty() {
        draw_legend(&legend_area, series, figure)?;
    }
    Ok(())
}

/// Legend outside the axes, anchored at its upper-left corner
fn draw_legend<DB>(area: &DrawingArea<DB, Shift>, series: &[PlotSeries], figure: &Figure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let font = figure.px(LEGEND_FONT_PT) as i32;
    let pad = font / 2;
    let handle = font * 2;
    let row = figure.legend_row(font as u32) as i32;
    let radius = (figure.px(MARKER_SIZE_PT) / 2).max(1) as i32;
    let line_px = figure.px(LINE_WIDTH_PT);

    let (w, h) = figure.legend_size(series);
    let x0 = figure.legend_gap() as i32;
    let y0 = figure.legend_top() as i32;
    let frame = [(x0, y0), (x0 + w as i32, y0 + h as i32)];

    area.draw(&Rectangle::new(frame, WHITE.mix(0.8).filled()))?;
    area.draw(&Rectangle::new(frame, LEGEND_EDGE.stroke_width(figure.px(GRID_WIDTH_PT))))?;

    let text_style = TextStyle::from((FONT_FAMILY, font as f64)).pos(Pos::new(HPos::Left, VPos::Center));

    for (i, s) in series.iter().enumerate() {
        let y = y0 + pad + i as i32 * row + row / 2;
        let hx = x0 + pad;
        let color = s.color.rgb().mix(SERIES_ALPHA);

        area.draw(&PathElement::new(
            vec![(hx, y), (hx + handle, y)],
            color.stroke_width(line_px),
        ))?;

        let center = (hx + handle / 2, y);
        let fill = color.filled();
        match s.marker {
            Marker::Circle => area.draw(&Circle::new(center, radius, fill))?,
            Marker::Square => area.draw(&Rectangle::new(
                [
                    (center.0 - radius, center.1 - radius),
                    (center.0 + radius, center.1 + radius),
                ],
                fill,
            ))?,
            Marker::Triangle => area.draw(&TriangleMarker::new(center, radius, fill))?,
        }

        area.draw(&Text::new(
            s.label.as_str(),
            (hx + handle + pad, y),
            text_style.clone(),
        ))?;
    }
    Ok(())
}
