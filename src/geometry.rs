//! Chart geometry: maps aggregated series onto a bounded 2D canvas.
//!
//! Screen coordinates: origin top-left, y grows downward. Every function here
//! is total over its input; degenerate series (one point, flat values) map to
//! fixed positions instead of dividing by zero.

use serde::Serialize;

use crate::aggregate::{CumulativePoint, SkillScore};

/// Ticks on the value axis of the line chart.
pub const LINE_TICK_COUNT: usize = 5;
/// Horizontal grid divisions of the bar chart (six lines, 100 down to 0).
pub const BAR_GRID_DIVISIONS: usize = 5;
/// Ceiling of the normalized skill scale.
pub const BAR_MAX_SCALE: f64 = 100.0;
pub const BAR_GUTTER: f64 = 5.0;
pub const MIN_MARKER_RADIUS: f64 = 4.0;
pub const MAX_MARKER_RADIUS: f64 = 15.0;
/// Radius factor applied while a marker is hovered.
pub const HOVER_SCALE: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub margin: Margins,
}

impl Canvas {
    /// Experience timeline.
    pub fn line_default() -> Self {
        Self {
            width: 550.0,
            height: 300.0,
            margin: Margins { top: 40.0, right: 50.0, bottom: 40.0, left: 50.0 },
        }
    }

    /// Skills bars.
    pub fn bar_default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            margin: Margins { top: 20.0, right: 30.0, bottom: 40.0, left: 50.0 },
        }
    }

    pub fn chart_width(&self) -> f64 {
        (self.width - self.margin.left - self.margin.right).max(0.0)
    }

    pub fn chart_height(&self) -> f64 {
        (self.height - self.margin.top - self.margin.bottom).max(0.0)
    }

    /// Bottom edge of the plot area.
    pub fn baseline(&self) -> f64 {
        self.height - self.margin.bottom
    }

    pub fn right_edge(&self) -> f64 {
        self.width - self.margin.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A labelled position along the value axis (y for both chart types).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub position: f64,
    pub label: String,
}

/// Shape drawn at one geometry position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mark {
    /// Circle centred on the position.
    Marker { radius: f64 },
    /// Rectangle whose top-left corner is the position.
    Bar { width: f64, height: f64, label: String },
}

/// Layout of one chart. Rebuilt on every render, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartGeometry {
    pub canvas: Canvas,
    pub positions: Vec<Point>,
    pub value_range: (f64, f64),
    pub axis_ticks: Vec<AxisTick>,
    pub marks: Vec<Mark>,
}

impl ChartGeometry {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// How skill categories are shortened for bar labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRule {
    Prefix,
    PrefixAndSuffix,
}

impl LabelRule {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "prefix" => Some(LabelRule::Prefix),
            "prefix_suffix" | "prefix-suffix" => Some(LabelRule::PrefixAndSuffix),
            _ => None,
        }
    }

    pub fn apply(self, category: &str) -> String {
        match self {
            LabelRule::Prefix => strip_category_prefix(category).to_string(),
            LabelRule::PrefixAndSuffix => strip_category_prefix_and_suffix(category).to_string(),
        }
    }
}

/// Drops everything up to and including the first `_`.
/// Categories without `_` are returned whole.
pub fn strip_category_prefix(category: &str) -> &str {
    match category.find('_') {
        Some(idx) => &category[idx + 1..],
        None => category,
    }
}

/// Prefix strip, then drops the last `-` and everything after it.
pub fn strip_category_prefix_and_suffix(category: &str) -> &str {
    let rest = strip_category_prefix(category);
    match rest.rfind('-') {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}

/// Marker radius: square root of the magnitude, scaled down and clamped.
pub fn point_radius(amount: i64) -> f64 {
    let raw = (amount.unsigned_abs() as f64).sqrt() / 50.0;
    raw.clamp(MIN_MARKER_RADIUS, MAX_MARKER_RADIUS)
}

fn lerp(t: f64, from: f64, to: f64) -> f64 {
    from + t * (to - from)
}

/// Lays out a cumulative series as a line with bubble markers.
pub fn compute_line_geometry(points: &[CumulativePoint], canvas: &Canvas) -> ChartGeometry {
    if points.is_empty() {
        return ChartGeometry {
            canvas: *canvas,
            positions: Vec::new(),
            value_range: (0.0, 0.0),
            axis_ticks: Vec::new(),
            marks: Vec::new(),
        };
    }

    let min = points.iter().map(|p| p.running_total).min().unwrap_or(0) as f64;
    let max = points.iter().map(|p| p.running_total).max().unwrap_or(0) as f64;
    let flat = max == min;
    let left = canvas.margin.left;
    let right = canvas.right_edge();
    let bottom = canvas.baseline();
    let top = canvas.margin.top;
    let center = top + canvas.chart_height() / 2.0;
    let span = points.len().saturating_sub(1);

    let y_for = |value: f64| -> f64 {
        if flat {
            center
        } else {
            lerp((value - min) / (max - min), bottom, top)
        }
    };

    let positions = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = if span == 0 { left } else { lerp(i as f64 / span as f64, left, right) };
            Point::new(x, y_for(p.running_total as f64))
        })
        .collect();

    let axis_ticks = (0..LINE_TICK_COUNT)
        .map(|i| {
            let value = lerp(i as f64 / (LINE_TICK_COUNT - 1) as f64, min, max);
            AxisTick { position: y_for(value), label: format!("{}", value.round() as i64) }
        })
        .collect();

    let marks = points.iter().map(|p| Mark::Marker { radius: point_radius(p.amount) }).collect();

    ChartGeometry { canvas: *canvas, positions, value_range: (min, max), axis_ticks, marks }
}

/// Lays out skill scores as bars on a fixed 0..100 scale.
pub fn compute_bar_geometry(scores: &[SkillScore], canvas: &Canvas, rule: LabelRule) -> ChartGeometry {
    let chart_height = canvas.chart_height();
    let top = canvas.margin.top;

    let axis_ticks = (0..=BAR_GRID_DIVISIONS)
        .map(|i| {
            let frac = i as f64 / BAR_GRID_DIVISIONS as f64;
            AxisTick {
                position: top + frac * chart_height,
                label: format!("{}", (BAR_MAX_SCALE * (1.0 - frac)).round() as i64),
            }
        })
        .collect();

    if scores.is_empty() {
        return ChartGeometry {
            canvas: *canvas,
            positions: Vec::new(),
            value_range: (0.0, BAR_MAX_SCALE),
            axis_ticks,
            marks: Vec::new(),
        };
    }

    let slot = canvas.chart_width() / scores.len() as f64;
    let mut positions = Vec::with_capacity(scores.len());
    let mut marks = Vec::with_capacity(scores.len());
    for (i, score) in scores.iter().enumerate() {
        let height = (score.best_amount as f64 / BAR_MAX_SCALE) * chart_height;
        positions.push(Point::new(canvas.margin.left + i as f64 * slot, top + chart_height - height));
        marks.push(Mark::Bar {
            width: (slot - BAR_GUTTER).max(0.0),
            height,
            label: rule.apply(&score.category),
        });
    }

    ChartGeometry { canvas: *canvas, positions, value_range: (0.0, BAR_MAX_SCALE), axis_ticks, marks }
}
