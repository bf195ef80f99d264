//! Headless surface that records primitives and simulates pointer hover.

use std::collections::HashMap;

use super::{ElementId, HoverEffect, Label, LabelRole, LineKind, Surface, Tooltip, TooltipSlot};
use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Path(Vec<Point>),
    Point { id: ElementId, center: Point, radius: f64 },
    Bar { id: ElementId, origin: Point, width: f64, height: f64 },
    Line { from: Point, to: Point, kind: LineKind },
    Label(Label),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    size: Option<(f64, f64)>,
    placeholder: Option<String>,
    primitives: Vec<Primitive>,
    hovers: HashMap<ElementId, HoverEffect>,
    hovered: Option<ElementId>,
    tooltip: TooltipSlot,
    next_id: ElementId,
    clears: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_canvas(&self) -> bool {
        self.size.is_some()
    }

    pub fn size(&self) -> Option<(f64, f64)> {
        self.size
    }

    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Times the surface was wiped.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn paths(&self) -> Vec<&[Point]> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Path(points) => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// (id, center, current radius)
    pub fn points(&self) -> Vec<(ElementId, Point, f64)> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Point { id, center, radius } => Some((*id, *center, *radius)),
                _ => None,
            })
            .collect()
    }

    /// (id, origin, width, height)
    pub fn bars(&self) -> Vec<(ElementId, Point, f64, f64)> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Bar { id, origin, width, height } => Some((*id, *origin, *width, *height)),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self, kind: LineKind) -> Vec<(Point, Point)> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Line { from, to, kind: k } if *k == kind => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn label_texts(&self, role: LabelRole) -> Vec<&str> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Label(label) if label.role == role => Some(label.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn radius_of(&self, element: ElementId) -> Option<f64> {
        self.primitives.iter().find_map(|p| match p {
            Primitive::Point { id, radius, .. } if *id == element => Some(*radius),
            _ => None,
        })
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.current()
    }

    fn set_radius(&mut self, element: ElementId, value: f64) {
        for p in &mut self.primitives {
            if let Primitive::Point { id, radius, .. } = p {
                if *id == element {
                    *radius = value;
                }
            }
        }
    }

    /// Pointer moves onto an element. Entering a new element leaves the previous one.
    pub fn pointer_enter(&mut self, element: ElementId) {
        if let Some(prev) = self.hovered {
            if prev != element {
                self.pointer_leave(prev);
            }
        }
        let Some(hover) = self.hovers.get(&element).cloned() else { return };
        if let Some((_, enlarged)) = hover.radius {
            self.set_radius(element, enlarged);
        }
        self.tooltip.show(hover.tooltip);
        self.hovered = Some(element);
    }

    pub fn pointer_leave(&mut self, element: ElementId) {
        if self.hovered != Some(element) {
            return;
        }
        if let Some((rest, _)) = self.hovers.get(&element).and_then(|h| h.radius) {
            self.set_radius(element, rest);
        }
        self.tooltip.hide();
        self.hovered = None;
    }

    fn next(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.size = None;
        self.placeholder = None;
        self.primitives.clear();
        self.hovers.clear();
        self.hovered = None;
        self.tooltip.hide();
        self.clears += 1;
    }

    fn placeholder(&mut self, message: &str) {
        self.placeholder = Some(message.to_string());
    }

    fn begin(&mut self, width: f64, height: f64) {
        self.size = Some((width, height));
    }

    fn draw_path(&mut self, points: &[Point]) {
        self.primitives.push(Primitive::Path(points.to_vec()));
    }

    fn draw_point(&mut self, center: Point, radius: f64) -> ElementId {
        let id = self.next();
        self.primitives.push(Primitive::Point { id, center, radius });
        id
    }

    fn draw_bar(&mut self, origin: Point, width: f64, height: f64) -> ElementId {
        let id = self.next();
        self.primitives.push(Primitive::Bar { id, origin, width, height });
        id
    }

    fn draw_line(&mut self, from: Point, to: Point, kind: LineKind) {
        self.primitives.push(Primitive::Line { from, to, kind });
    }

    fn draw_label(&mut self, label: Label) {
        self.primitives.push(Primitive::Label(label));
    }

    fn attach_hover(&mut self, element: ElementId, hover: HoverEffect) {
        self.hovers.insert(element, hover);
    }
}
