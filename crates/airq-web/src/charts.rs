//! Server-side charts drawn with plotters' SVG backend. Every function returns
//! a self-contained `<svg>` string.

use std::ops::Range;

use airq_data::dataset::format_number;
use airq_data::eda::ViolinShape;
use airq_data::profile::Distribution;
use airq_data::stats::BoxStats;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::warn;

use crate::handlers::layout::html_escape;

const SIZE: (u32, u32) = (640, 320);
const FONT: &str = "sans-serif";
const NO_VALUES: &str = "No values to plot";

const INK: RGBColor = RGBColor(55, 65, 81);
const MISSING_CELL: RGBColor = RGBColor(229, 231, 235);
const BAR_FILL: RGBColor = RGBColor(147, 197, 253);
const DENSITY_LINE: RGBColor = RGBColor(29, 78, 216);

/// Series colours, cycled.
pub const PALETTE: [&str; 12] = [
    "#2563eb", "#dc2626", "#16a34a", "#d97706", "#7c3aed", "#0891b2",
    "#db2777", "#65a30d", "#475569", "#ea580c", "#0d9488", "#9333ea",
];

pub fn series_color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

/// `#rrggbb` or one of the named bucket colours; anything else draws grey.
fn rgb(color: &str) -> RGBColor {
    match color {
        "green" => return RGBColor(0, 128, 0),
        "lime" => return RGBColor(0, 255, 0),
        "yellow" => return RGBColor(255, 255, 0),
        "orange" => return RGBColor(255, 165, 0),
        "red" => return RGBColor(255, 0, 0),
        "darkred" => return RGBColor(139, 0, 0),
        _ => {}
    }
    let hex = color.trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok());
    match (hex.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
        _ => RGBColor(156, 163, 175),
    }
}

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type DrawError = DrawingAreaErrorKind<std::io::Error>;
type DrawResult<T = ()> = Result<T, DrawError>;
type CategoryChart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Draws on a white canvas. A failed drawing is logged and replaced by a note.
fn render(title: &str, draw: impl FnOnce(&Area<'_>) -> DrawResult) -> String {
    let mut svg = String::new();
    let outcome = {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)
            .and_then(|_| draw(&root))
            .and_then(|_| root.present())
    };
    match outcome {
        Ok(()) => svg,
        Err(e) => {
            warn!(chart = title, error = %e, "Chart rendering failed");
            format!(r#"<p class="placeholder">Chart unavailable: {}</p>"#, html_escape(title))
        }
    }
}

fn text_style(size: i32, h: HPos, v: VPos) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).color(&INK).pos(Pos::new(h, v))
}

fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Value range with 5% headroom; a single value gets ±1.
fn padded((lo, hi): (f64, f64)) -> Range<f64> {
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn tick_label(v: f64) -> String {
    format_number((v * 100.0).round() / 100.0)
}

/// Label of the category at integer position `x`; blank between categories.
fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// Categories centred on 0, 1, 2, ... along x; values on y.
fn category_chart<'a, 'b>(
    root: &'a Area<'b>,
    title: &str,
    labels: &[String],
    y: Range<f64>,
) -> DrawResult<CategoryChart<'a, 'b>> {
    let n = labels.len().max(1);
    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 16))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), y)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| category_label(labels, *x))
        .y_label_formatter(&|y| tick_label(*y))
        .label_style((FONT, 11))
        .draw()?;
    Ok(chart)
}

/// Shown instead of a chart when there is nothing to draw.
pub fn empty_chart(title: &str, message: &str) -> String {
    render(title, |root| {
        let body = root.titled(title, (FONT, 16))?;
        let (w, h) = body.dim_in_pixel();
        body.draw(&Text::new(
            message.to_string(),
            (w as i32 / 2, h as i32 / 2),
            text_style(13, HPos::Center, VPos::Center),
        ))?;
        Ok(())
    })
}

// ── line ─────────────────────────────────────────────────────────────────────

pub struct Trace {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Unbroken stretches of present values as `(x, y)` points.
fn runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
    for (i, v) in values.iter().enumerate() {
        match v.filter(|v| v.is_finite()) {
            Some(v) => {
                if let Some(run) = out.last_mut() {
                    run.push((i as f64, v));
                }
            }
            None => out.push(Vec::new()),
        }
    }
    out.retain(|run| !run.is_empty());
    out
}

/// Traces share the category axis `x_labels`. A missing value breaks the line.
pub fn line_chart(title: &str, x_labels: &[String], traces: &[Trace]) -> String {
    let Some(range) = extent(traces.iter().flat_map(|t| t.values.iter().flatten().copied())) else {
        return empty_chart(title, NO_VALUES);
    };
    render(title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 16))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(56)
            .build_cartesian_2d(0.0..(x_labels.len().saturating_sub(1).max(1) as f64), padded(range))?;
        chart
            .configure_mesh()
            .x_labels(x_labels.len().clamp(1, 8))
            .x_label_formatter(&|x| category_label(x_labels, *x))
            .y_label_formatter(&|y| tick_label(*y))
            .label_style((FONT, 11))
            .draw()?;

        for (i, trace) in traces.iter().enumerate() {
            let color = rgb(series_color(i));
            let segments = runs(&trace.values);
            for run in &segments {
                chart.draw_series(LineSeries::new(run.iter().copied(), color.stroke_width(2)))?;
            }
            chart
                .draw_series(segments.iter().flatten().map(|p| Circle::new(*p, 3, color.filled())))?
                .label(trace.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
        }
        if traces.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(INK)
                .label_font((FONT, 11))
                .draw()?;
        }
        Ok(())
    })
}

// ── bar ──────────────────────────────────────────────────────────────────────

pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
    pub color: String,
    /// Text drawn above the bar
    pub annotation: String,
}

pub fn bar_chart(title: &str, bars: &[Bar]) -> String {
    if bars.is_empty() {
        return empty_chart(title, NO_VALUES);
    }
    let top = extent(bars.iter().filter_map(|b| b.value)).map(|(_, hi)| hi).unwrap_or(0.0).max(1.0) * 1.15;
    let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
    let heights = || {
        bars.iter()
            .enumerate()
            .filter_map(|(i, b)| b.value.filter(|v| v.is_finite()).map(|v| (i as f64, v.max(0.0), b)))
    };
    render(title, |root| {
        let mut chart = category_chart(root, title, &labels, 0.0..top)?;
        chart.draw_series(
            heights().map(|(x, v, b)| Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v)], rgb(&b.color).filled())),
        )?;
        chart.draw_series(heights().map(|(x, v, b)| {
            Text::new(b.annotation.clone(), (x, v), text_style(11, HPos::Center, VPos::Bottom))
        }))?;
        Ok(())
    })
}

// ── histogram + density ──────────────────────────────────────────────────────

pub fn histogram_chart(title: &str, dist: &Distribution) -> String {
    let h = &dist.histogram;
    let (Some(lo), Some(hi)) = (h.edges.first().copied(), h.edges.last().copied()) else {
        return empty_chart(title, NO_VALUES);
    };
    let density_max = extent(dist.density.iter().map(|(_, d)| *d)).map(|(_, hi)| hi).unwrap_or(0.0);
    let top = (h.max_count() as f64).max(density_max).max(1.0) * 1.1;
    render(title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 16))
            .margin(10)
            .x_label_area_size(32)
            .y_label_area_size(48)
            .build_cartesian_2d(lo..hi, 0.0..top)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(5)
            .x_label_formatter(&|x| tick_label(*x))
            .y_label_formatter(&|y| tick_label(*y))
            .label_style((FONT, 11))
            .draw()?;
        chart.draw_series(h.counts.iter().zip(h.edges.windows(2)).map(|(count, edge)| {
            Rectangle::new([(edge[0], 0.0), (edge[1], *count as f64)], BAR_FILL.filled())
        }))?;
        if !dist.density.is_empty() {
            chart.draw_series(LineSeries::new(dist.density.iter().copied(), DENSITY_LINE.stroke_width(2)))?;
        }
        Ok(())
    })
}

// ── heatmap ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatScale {
    /// Low values light, high values dark, over the given range.
    Sequential(f64, f64),
    /// Blue through white to red over -1..=1.
    Diverging,
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t.clamp(0.0, 1.0)).round() as u8
}

fn heat_color(v: f64, scale: HeatScale) -> RGBColor {
    match scale {
        HeatScale::Sequential(lo, hi) => {
            let t = if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };
            RGBColor(lerp(255, 180, t), lerp(247, 30, t), lerp(236, 30, t))
        }
        HeatScale::Diverging if v < 0.0 => RGBColor(lerp(255, 33, -v), lerp(255, 102, -v), lerp(255, 172, -v)),
        HeatScale::Diverging => RGBColor(lerp(255, 178, v), lerp(255, 24, v), lerp(255, 43, v)),
    }
}

/// `cells[row][col]`, first row on top; `None` cells are drawn grey. With
/// `annotate`, each cell carries its value with 2 decimals.
pub fn heatmap(
    title: &str,
    rows: &[String],
    cols: &[String],
    cells: &[Vec<Option<f64>>],
    scale: HeatScale,
    annotate: bool,
) -> String {
    if rows.is_empty() || cols.is_empty() {
        return empty_chart(title, NO_VALUES);
    }
    let (nr, nc) = (rows.len() as f64, cols.len() as f64);
    // row r spans y in [nr - r - 1, nr - r]
    let filled = || {
        cells.iter().enumerate().flat_map(move |(r, row)| {
            row.iter().enumerate().map(move |(c, v)| (c as f64, nr - r as f64 - 1.0, v.filter(|v| v.is_finite())))
        })
    };
    render(title, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 16))
            .margin(10)
            .margin_left(110)
            .margin_bottom(70)
            .build_cartesian_2d(0.0..nc, 0.0..nr)?;
        chart.draw_series(filled().map(|(x, y, v)| {
            let fill = v.map(|v| heat_color(v, scale)).unwrap_or(MISSING_CELL);
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], fill.filled())
        }))?;
        if annotate {
            chart.draw_series(filled().filter_map(|(x, y, v)| {
                let v = v?;
                Some(Text::new(format!("{:.2}", v), (x + 0.5, y + 0.5), text_style(10, HPos::Center, VPos::Center)))
            }))?;
        }

        let row_step = rows.len().div_ceil(20).max(1);
        for (r, label) in rows.iter().enumerate().step_by(row_step) {
            let (px, py) = chart.backend_coord(&(0.0, nr - r as f64 - 0.5));
            root.draw(&Text::new(label.clone(), (px - 6, py), text_style(10, HPos::Right, VPos::Center)))?;
        }
        let col_step = cols.len().div_ceil(24).max(1);
        let col_style = if cols.len() > 6 {
            TextStyle::from((FONT, 10).into_font().transform(FontTransform::Rotate90)).color(&INK)
        } else {
            text_style(10, HPos::Center, VPos::Top)
        };
        for (c, label) in cols.iter().enumerate().step_by(col_step) {
            let (px, py) = chart.backend_coord(&(c as f64 + 0.5, 0.0));
            root.draw(&Text::new(label.clone(), (px, py + 6), col_style.clone()))?;
        }
        Ok(())
    })
}

// ── box ──────────────────────────────────────────────────────────────────────

pub fn box_chart(title: &str, groups: &[(String, Option<BoxStats>)]) -> String {
    let range = extent(groups.iter().filter_map(|(_, b)| b.as_ref()).flat_map(|b| {
        let mut v = vec![b.whisker_low, b.whisker_high];
        v.extend(&b.outliers);
        v
    }));
    let Some(range) = range else {
        return empty_chart(title, NO_VALUES);
    };
    let labels: Vec<String> = groups.iter().map(|(n, _)| n.clone()).collect();
    render(title, |root| {
        let mut chart = category_chart(root, title, &labels, padded(range))?;
        for (i, (_, stats)) in groups.iter().enumerate() {
            let Some(b) = stats else { continue };
            let x = i as f64;
            let color = rgb(series_color(i));
            chart.draw_series([
                PathElement::new(vec![(x, b.whisker_low), (x, b.q1)], INK),
                PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], INK),
                PathElement::new(vec![(x - 0.15, b.whisker_low), (x + 0.15, b.whisker_low)], INK),
                PathElement::new(vec![(x - 0.15, b.whisker_high), (x + 0.15, b.whisker_high)], INK),
            ])?;
            chart.draw_series([
                Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], color.mix(0.6).filled()),
                Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], INK),
            ])?;
            chart.draw_series([PathElement::new(vec![(x - 0.3, b.median), (x + 0.3, b.median)], INK.stroke_width(2))])?;
            chart.draw_series(b.outliers.iter().map(|o| Circle::new((x, *o), 3, INK)))?;
        }
        Ok(())
    })
}

// ── violin ───────────────────────────────────────────────────────────────────

pub fn violin_chart(title: &str, groups: &[(String, Option<ViolinShape>)]) -> String {
    let shapes = || groups.iter().filter_map(|(_, s)| s.as_ref());
    let range = extent(shapes().flat_map(|s| {
        let mut v = vec![s.min, s.max];
        v.extend(s.outline.iter().map(|(y, _)| *y));
        v
    }));
    let Some(range) = range else {
        return empty_chart(title, NO_VALUES);
    };
    let density_max = extent(shapes().flat_map(|s| s.outline.iter().map(|(_, d)| *d)))
        .map(|(_, hi)| hi)
        .unwrap_or(0.0);
    let labels: Vec<String> = groups.iter().map(|(n, _)| n.clone()).collect();
    render(title, |root| {
        let mut chart = category_chart(root, title, &labels, padded(range))?;
        for (i, (_, shape)) in groups.iter().enumerate() {
            let Some(s) = shape else { continue };
            let x = i as f64;
            let color = rgb(series_color(i));
            if !s.outline.is_empty() && density_max > 0.0 {
                let k = 0.45 / density_max;
                let right = s.outline.iter().map(|(y, d)| (x + d * k, *y));
                let left = s.outline.iter().rev().map(|(y, d)| (x - d * k, *y));
                let outline: Vec<(f64, f64)> = right.chain(left).collect();
                chart.draw_series([Polygon::new(outline.clone(), color.mix(0.5).filled())])?;
                chart.draw_series([PathElement::new(outline, color)])?;
            } else {
                // single distinct value: a flat mark at the value
                chart.draw_series([PathElement::new(vec![(x - 0.3, s.median), (x + 0.3, s.median)], color.stroke_width(3))])?;
            }
            chart.draw_series([
                Circle::new((x, s.median), 3, WHITE.filled()),
                Circle::new((x, s.median), 3, INK),
            ])?;
        }
        Ok(())
    })
}

// ── pie ──────────────────────────────────────────────────────────────────────

pub struct Slice {
    pub label: String,
    pub count: usize,
    pub color: String,
}

pub fn pie_chart(title: &str, slices: &[Slice]) -> String {
    let shown: Vec<&Slice> = slices.iter().filter(|s| s.count > 0).collect();
    let total: usize = shown.iter().map(|s| s.count).sum();
    if total == 0 {
        return empty_chart(title, NO_VALUES);
    }
    let sizes: Vec<f64> = shown.iter().map(|s| s.count as f64).collect();
    let colors: Vec<RGBColor> = shown.iter().map(|s| rgb(&s.color)).collect();
    let blank: Vec<String> = vec![String::new(); shown.len()];
    let legend: Vec<String> = shown
        .iter()
        .map(|s| format!("{} ({:.1}%)", s.label, s.count as f64 / total as f64 * 100.0))
        .collect();
    render(title, |root| {
        let body = root.titled(title, (FONT, 16))?;
        let (w, h) = body.dim_in_pixel();
        let center = ((w as i32 - 170) / 2, h as i32 / 2);
        let radius = (h.min(w) as f64 / 2.0 - 16.0).max(10.0);
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &blank);
        pie.start_angle(-90.0);
        body.draw(&pie)?;

        let left = w as i32 - 170;
        for (i, (label, color)) in legend.iter().zip(&colors).enumerate() {
            let y = 20 + i as i32 * 18;
            body.draw(&Rectangle::new([(left, y - 5), (left + 10, y + 5)], color.filled()))?;
            body.draw(&Text::new(label.clone(), (left + 16, y), text_style(11, HPos::Left, VPos::Center)))?;
        }
        Ok(())
    })
}
