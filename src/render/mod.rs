//! Chart rendering onto an abstract drawing surface.
//!
//! Renderers walk a [`ChartGeometry`] and emit primitives through [`Surface`].
//! Each call fully replaces what the surface held before.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{CumulativePoint, SkillScore};
use crate::geometry::{ChartGeometry, Mark, Point, BAR_MAX_SCALE, HOVER_SCALE};
use crate::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};

pub mod recording;
pub mod svg;

pub const LINE_PLACEHOLDER: &str = "No XP data available";
pub const BAR_PLACEHOLDER: &str = "No skills data available";
pub const LINE_X_CAPTION: &str = "Projects Timeline";
pub const LINE_Y_CAPTION: &str = "Cumulative XP";
pub const BAR_X_CAPTION: &str = "Skills";
pub const BAR_Y_CAPTION: &str = "XP Amount";

const CAPTION_SIZE: f64 = 12.0;
const TICK_SIZE: f64 = 10.0;

/// Handle to a drawn element, used to attach interaction.
pub type ElementId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Anchor {
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Grid,
    Axis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelRole {
    Caption,
    Tick,
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub at: Point,
    pub anchor: Anchor,
    pub size: f64,
    /// Rotation in degrees around `at`.
    pub rotate: Option<f64>,
    pub role: LabelRole,
}

/// Data surfaced while the pointer is over an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Tooltip {
    Experience {
        subject_name: String,
        amount: i64,
        running_total: i64,
        occurred_at: Option<DateTime<Utc>>,
    },
    Skill {
        category: String,
        percentage_of_max: i64,
    },
}

fn kilo(amount: i64) -> String {
    format!("{:.1}K", amount as f64 / 1024.0)
}

impl Tooltip {
    pub fn title(&self) -> &str {
        match self {
            Tooltip::Experience { subject_name, .. } => subject_name,
            Tooltip::Skill { category, .. } => category,
        }
    }

    /// Display lines, title first.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Tooltip::Experience { subject_name, amount, running_total, occurred_at } => {
                let sign = if *amount >= 0 { "+" } else { "" };
                let mut lines = vec![
                    subject_name.clone(),
                    format!("XP: {}{}", sign, kilo(*amount)),
                    format!("Total: {}", kilo(*running_total)),
                ];
                if let Some(ts) = occurred_at {
                    lines.push(ts.format("%Y-%m-%d").to_string());
                }
                lines
            }
            Tooltip::Skill { category, percentage_of_max } => {
                vec![category.clone(), format!("{}% of max", percentage_of_max)]
            }
        }
    }
}

/// Hover contract for one element: tooltip on enter, revert on leave.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverEffect {
    pub tooltip: Tooltip,
    /// (resting, hovered) radius for markers.
    pub radius: Option<(f64, f64)>,
}

/// The single tooltip a chart page can show.
#[derive(Debug, Clone, Default)]
pub struct TooltipSlot {
    current: Option<Tooltip>,
}

impl TooltipSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was showing.
    pub fn show(&mut self, tooltip: Tooltip) {
        self.current = Some(tooltip);
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Tooltip> {
        self.current.as_ref()
    }
}

/// Drawing target owned by one chart.
pub trait Surface {
    /// Drops all prior content, including any placeholder.
    fn clear(&mut self);
    /// Shows a message instead of a chart. No drawing area is created.
    fn placeholder(&mut self, message: &str);
    /// Creates the drawing area.
    fn begin(&mut self, width: f64, height: f64);
    fn draw_path(&mut self, points: &[Point]);
    fn draw_point(&mut self, center: Point, radius: f64) -> ElementId;
    fn draw_bar(&mut self, origin: Point, width: f64, height: f64) -> ElementId;
    fn draw_line(&mut self, from: Point, to: Point, kind: LineKind);
    fn draw_label(&mut self, label: Label);
    fn attach_hover(&mut self, element: ElementId, hover: HoverEffect);
}

fn caption(text: &str, at: Point, rotate: Option<f64>) -> Label {
    Label { text: text.to_string(), at, anchor: Anchor::Middle, size: CAPTION_SIZE, rotate, role: LabelRole::Caption }
}

fn draw_captions<S: Surface + ?Sized>(surface: &mut S, geometry: &ChartGeometry, x_text: &str, y_text: &str) {
    let canvas = &geometry.canvas;
    surface.draw_label(caption(x_text, Point::new(canvas.width / 2.0, canvas.height - 10.0), None));
    surface.draw_label(caption(y_text, Point::new(15.0, canvas.height / 2.0), Some(-90.0)));
}

fn draw_value_ticks<S: Surface + ?Sized>(surface: &mut S, geometry: &ChartGeometry) {
    let x = geometry.canvas.margin.left - 10.0;
    for tick in &geometry.axis_ticks {
        surface.draw_label(Label {
            text: tick.label.clone(),
            at: Point::new(x, tick.position + 5.0),
            anchor: Anchor::End,
            size: TICK_SIZE,
            rotate: None,
            role: LabelRole::Tick,
        });
    }
}

/// Draws the cumulative experience timeline.
///
/// `points` must be the series the geometry was computed from; extra entries
/// on either side are ignored.
pub fn render_line_chart<S: Surface + ?Sized>(surface: &mut S, geometry: &ChartGeometry, points: &[CumulativePoint]) {
    let _scope = ProfileScope::new("render_line_chart");
    surface.clear();
    if points.is_empty() || geometry.is_empty() {
        surface.placeholder(LINE_PLACEHOLDER);
        log(Level::Debug, Domain::Render, "line_placeholder", obj(&[]));
        return;
    }

    let canvas = &geometry.canvas;
    surface.begin(canvas.width, canvas.height);
    surface.draw_path(&geometry.positions);

    let mut drawn = 0usize;
    for ((pos, mark), point) in geometry.positions.iter().zip(&geometry.marks).zip(points) {
        let Mark::Marker { radius } = mark else { continue };
        let id = surface.draw_point(*pos, *radius);
        surface.attach_hover(
            id,
            HoverEffect {
                tooltip: Tooltip::Experience {
                    subject_name: point.subject_name().unwrap_or("Unknown Project").to_string(),
                    amount: point.amount,
                    running_total: point.running_total,
                    occurred_at: point.occurred_at,
                },
                radius: Some((*radius, radius * HOVER_SCALE)),
            },
        );
        drawn += 1;
    }

    draw_value_ticks(surface, geometry);
    draw_captions(surface, geometry, LINE_X_CAPTION, LINE_Y_CAPTION);
    log(
        Level::Debug,
        Domain::Render,
        "line_rendered",
        obj(&[("markers", v_num(drawn as f64)), ("max_total", v_num(geometry.value_range.1))]),
    );
}

/// Draws the best-per-skill bar chart with its fixed 0..100 grid.
pub fn render_bar_chart<S: Surface + ?Sized>(surface: &mut S, geometry: &ChartGeometry, scores: &[SkillScore]) {
    let _scope = ProfileScope::new("render_bar_chart");
    surface.clear();
    if scores.is_empty() || geometry.is_empty() {
        surface.placeholder(BAR_PLACEHOLDER);
        log(Level::Debug, Domain::Render, "bar_placeholder", obj(&[]));
        return;
    }

    let canvas = &geometry.canvas;
    surface.begin(canvas.width, canvas.height);

    let slot = canvas.chart_width() / scores.len() as f64;
    for ((pos, mark), score) in geometry.positions.iter().zip(&geometry.marks).zip(scores) {
        let Mark::Bar { width, height, label } = mark else { continue };
        let id = surface.draw_bar(*pos, *width, *height);
        surface.attach_hover(
            id,
            HoverEffect {
                tooltip: Tooltip::Skill {
                    category: score.category.clone(),
                    percentage_of_max: ((score.best_amount as f64 / BAR_MAX_SCALE) * 100.0).round() as i64,
                },
                radius: None,
            },
        );
        surface.draw_label(Label {
            text: label.clone(),
            at: Point::new(pos.x + slot / 2.0, canvas.height - 20.0),
            anchor: Anchor::Middle,
            size: TICK_SIZE,
            rotate: None,
            role: LabelRole::Category,
        });
    }

    let left = canvas.margin.left;
    let right = canvas.right_edge();
    for tick in &geometry.axis_ticks {
        surface.draw_line(Point::new(left, tick.position), Point::new(right, tick.position), LineKind::Grid);
    }
    draw_value_ticks(surface, geometry);

    let baseline = canvas.baseline();
    surface.draw_line(Point::new(left, baseline), Point::new(right, baseline), LineKind::Axis);
    surface.draw_line(Point::new(left, canvas.margin.top), Point::new(left, baseline), LineKind::Axis);
    draw_captions(surface, geometry, BAR_X_CAPTION, BAR_Y_CAPTION);
    log(
        Level::Debug,
        Domain::Render,
        "bar_rendered",
        obj(&[("bars", v_num(scores.len() as f64)), ("top", v_str(&scores[0].category))]),
    );
}
