//! Standalone SVG documents.
//!
//! Tooltips become native `<title>` children, so the viewer shows at most one
//! at a time; marker enlargement is a CSS `:hover` rule driven by a per-marker
//! custom property.

use std::io;
use std::path::Path;

use super::{Anchor, ElementId, HoverEffect, Label, LineKind, Surface};
use crate::geometry::Point;

const ACCENT: &str = "#764ba2";
const MUTED: &str = "#666";
const GRID: &str = "#ddd";

#[derive(Debug, Clone)]
struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    text: Option<String>,
    title: Option<String>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self { tag, attrs: Vec::new(), text: None, title: None }
    }

    fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for (k, v) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", k, escape(v)));
        }
        match (&self.text, &self.title) {
            (None, None) => out.push_str("/>"),
            (text, title) => {
                out.push('>');
                if let Some(title) = title {
                    out.push_str(&format!("<title>{}</title>", escape(title)));
                }
                if let Some(text) = text {
                    out.push_str(&escape(text));
                }
                out.push_str(&format!("</{}>", self.tag));
            }
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Two decimals, no trailing zeros, no negative zero.
fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        "0".to_string()
    } else {
        format!("{}", r)
    }
}

#[derive(Debug, Default)]
pub struct SvgSurface {
    size: Option<(f64, f64)>,
    placeholder: Option<String>,
    elements: Vec<Element>,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder_text(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// The SVG document, or `None` when only a placeholder was drawn.
    pub fn document(&self) -> Option<String> {
        let (width, height) = self.size?;
        let mut out = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = num(width),
            h = num(height)
        );
        out.push_str(
            "<style>.marker,.bar{opacity:.8;cursor:pointer}.marker:hover{opacity:1;r:var(--hover-r)}.bar:hover{opacity:1}</style>",
        );
        for el in &self.elements {
            el.write(&mut out);
        }
        out.push_str("</svg>");
        Some(out)
    }

    /// Writes the document to `path`. A placeholder-only surface removes any
    /// stale file instead; returns whether a document was written.
    pub fn save(&self, path: &Path) -> io::Result<bool> {
        match self.document() {
            Some(doc) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, doc)?;
                Ok(true)
            }
            None => match std::fs::remove_file(path) {
                Ok(()) => Ok(false),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(err) => Err(err),
            },
        }
    }
}

impl Surface for SvgSurface {
    fn clear(&mut self) {
        self.size = None;
        self.placeholder = None;
        self.elements.clear();
    }

    fn placeholder(&mut self, message: &str) {
        self.placeholder = Some(message.to_string());
    }

    fn begin(&mut self, width: f64, height: f64) {
        self.size = Some((width, height));
    }

    fn draw_path(&mut self, points: &[Point]) {
        let d = points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {} {}", if i == 0 { "M" } else { "L" }, num(p.x), num(p.y)))
            .collect::<Vec<_>>()
            .join(" ");
        self.elements.push(
            Element::new("path")
                .attr("d", d)
                .attr("fill", "none")
                .attr("stroke", ACCENT)
                .attr("stroke-width", "3"),
        );
    }

    fn draw_point(&mut self, center: Point, radius: f64) -> ElementId {
        self.elements.push(
            Element::new("circle")
                .attr("class", "marker")
                .attr("cx", num(center.x))
                .attr("cy", num(center.y))
                .attr("r", num(radius))
                .attr("fill", ACCENT)
                .attr("stroke", "white")
                .attr("stroke-width", "2"),
        );
        self.elements.len() - 1
    }

    fn draw_bar(&mut self, origin: Point, width: f64, height: f64) -> ElementId {
        self.elements.push(
            Element::new("rect")
                .attr("class", "bar")
                .attr("x", num(origin.x))
                .attr("y", num(origin.y))
                .attr("width", num(width))
                .attr("height", num(height))
                .attr("fill", ACCENT),
        );
        self.elements.len() - 1
    }

    fn draw_line(&mut self, from: Point, to: Point, kind: LineKind) {
        let (stroke, width) = match kind {
            LineKind::Grid => (GRID, "1"),
            LineKind::Axis => (MUTED, "2"),
        };
        self.elements.push(
            Element::new("line")
                .attr("x1", num(from.x))
                .attr("y1", num(from.y))
                .attr("x2", num(to.x))
                .attr("y2", num(to.y))
                .attr("stroke", stroke)
                .attr("stroke-width", width),
        );
    }

    fn draw_label(&mut self, label: Label) {
        let anchor = match label.anchor {
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let mut el = Element::new("text")
            .attr("x", num(label.at.x))
            .attr("y", num(label.at.y))
            .attr("text-anchor", anchor)
            .attr("fill", MUTED)
            .attr("font-size", format!("{}px", num(label.size)));
        if let Some(deg) = label.rotate {
            el = el.attr("transform", format!("rotate({}, {}, {})", num(deg), num(label.at.x), num(label.at.y)));
        }
        el.text = Some(label.text);
        self.elements.push(el);
    }

    fn attach_hover(&mut self, element: ElementId, hover: HoverEffect) {
        let Some(el) = self.elements.get_mut(element) else { return };
        if let Some((_, enlarged)) = hover.radius {
            el.attrs.push(("style", format!("--hover-r:{}px", num(enlarged))));
        }
        el.title = Some(hover.tooltip.lines().join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_best_by_category, aggregate_cumulative};
    use crate::geometry::{compute_bar_geometry, compute_line_geometry, Canvas, LabelRule};
    use crate::ledger::LedgerRecord;
    use crate::render::{render_bar_chart, render_line_chart, BAR_PLACEHOLDER};

    #[test]
    fn test_line_document() {
        let recs = vec![
            LedgerRecord::new(100).for_subject("go-reloaded"),
            LedgerRecord::new(-30),
            LedgerRecord::new(50).for_subject("a < b & c"),
        ];
        let points = aggregate_cumulative(&recs);
        let geo = compute_line_geometry(&points, &Canvas::line_default());
        let mut svg = SvgSurface::new();
        render_line_chart(&mut svg, &geo, &points);

        let doc = svg.document().unwrap();
        assert!(doc.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"550\" height=\"300\""));
        assert!(doc.ends_with("</svg>"));
        assert_eq!(doc.matches("<circle").count(), 3);
        assert_eq!(doc.matches("<path").count(), 1);
        assert!(doc.contains("d=\"M 50 128 L 275 260 L 500 40\""));
        assert!(doc.contains("a &lt; b &amp; c"));
        assert!(doc.contains("--hover-r:5.2px"));
        assert!(doc.contains("Projects Timeline"));
    }

    #[test]
    fn test_bar_document() {
        let recs = vec![LedgerRecord::new(50).of_kind("skill_go")];
        let scores = aggregate_best_by_category(&recs);
        let geo = compute_bar_geometry(&scores, &Canvas::bar_default(), LabelRule::Prefix);
        let mut svg = SvgSurface::new();
        render_bar_chart(&mut svg, &geo, &scores);

        let doc = svg.document().unwrap();
        assert_eq!(doc.matches("<rect").count(), 1);
        assert_eq!(doc.matches("<line").count(), 8);
        assert!(doc.contains("<title>skill_go\n50% of max</title>"));
        assert!(doc.contains(">go</text>"));
    }

    #[test]
    fn test_placeholder_has_no_document() {
        let geo = compute_bar_geometry(&[], &Canvas::bar_default(), LabelRule::Prefix);
        let mut svg = SvgSurface::new();
        render_bar_chart(&mut svg, &geo, &[]);
        assert!(svg.document().is_none());
        assert_eq!(svg.placeholder_text(), Some(BAR_PLACEHOLDER));
    }

    #[test]
    fn test_save_writes_or_removes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("charts/skills.svg");
        let recs = vec![LedgerRecord::new(50).of_kind("skill_go")];
        let scores = aggregate_best_by_category(&recs);
        let geo = compute_bar_geometry(&scores, &Canvas::bar_default(), LabelRule::Prefix);
        let mut svg = SvgSurface::new();
        render_bar_chart(&mut svg, &geo, &scores);
        assert!(svg.save(&path).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<svg"));

        let empty = compute_bar_geometry(&[], &Canvas::bar_default(), LabelRule::Prefix);
        render_bar_chart(&mut svg, &empty, &[]);
        assert!(!svg.save(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(50.0), "50");
        assert_eq!(num(143.99999999999997), "144");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(5.2), "5.2");
    }
}
