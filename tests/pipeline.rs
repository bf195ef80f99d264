//! Records through aggregation, geometry and rendering without any transport.

use xpboard::aggregate::{aggregate_best_by_category, aggregate_cumulative, MAX_SKILLS};
use xpboard::geometry::{compute_bar_geometry, compute_line_geometry, Canvas, LabelRule, Mark};
use xpboard::ledger::LedgerRecord;
use xpboard::queries::{SkillsData, TransactionData};
use xpboard::render::recording::RecordingSurface;
use xpboard::render::svg::SvgSurface;
use xpboard::render::{render_bar_chart, render_line_chart, LabelRole, LineKind, Tooltip};

fn experience() -> TransactionData {
    serde_json::from_str(
        r#"{"transaction": [
            {"amount": 100, "createdAt": "2024-01-01T00:00:00Z", "object": {"name": "alpha"}},
            {"amount": -30, "createdAt": "2024-01-02T00:00:00Z"},
            {"amount": 50, "createdAt": "2024-01-03T00:00:00Z", "object": {"name": "gamma"}}
        ]}"#,
    )
    .unwrap()
}

#[test]
fn test_decoded_ledger_to_line_chart() {
    let data = experience();
    let points = aggregate_cumulative(&data.transaction);
    let totals: Vec<i64> = points.iter().map(|p| p.running_total).collect();
    assert_eq!(totals, vec![100, 70, 120]);

    let geometry = compute_line_geometry(&points, &Canvas::line_default());
    assert_eq!(geometry.positions.len(), 3);
    assert_eq!(geometry.value_range, (70.0, 120.0));

    let mut surface = RecordingSurface::new();
    render_line_chart(&mut surface, &geometry, &points);
    let markers = surface.points();
    assert_eq!(markers.len(), 3);

    surface.pointer_enter(markers[1].0);
    match surface.tooltip() {
        Some(Tooltip::Experience { subject_name, amount, .. }) => {
            assert_eq!(subject_name, "Unknown Project");
            assert_eq!(*amount, -30);
        }
        other => panic!("unexpected tooltip {:?}", other),
    }
    let lines = surface.tooltip().unwrap().lines();
    assert_eq!(lines[2], "Total: 0.1K");
    assert_eq!(lines[3], "2024-01-02");

    surface.pointer_leave(markers[1].0);
    assert!(surface.tooltip().is_none());
    assert_eq!(surface.radius_of(markers[1].0), Some(markers[1].2));
}

#[test]
fn test_skill_ranking_through_bar_chart() {
    let data: SkillsData = serde_json::from_str(
        r#"{"user": [{"transactions": [
            {"type": "skill_go", "amount": 30},
            {"type": "skill_js", "amount": 70},
            {"type": "skill_go", "amount": 55},
            {"type": "skill_front-end", "amount": 55},
            {"type": "skill_c", "amount": -5}
        ]}]}"#,
    )
    .unwrap();
    let scores = aggregate_best_by_category(&data.into_records());
    let order: Vec<&str> = scores.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(order, vec!["skill_js", "skill_go", "skill_front-end"]);

    let geometry = compute_bar_geometry(&scores, &Canvas::bar_default(), LabelRule::PrefixAndSuffix);
    let heights: Vec<f64> = geometry
        .marks
        .iter()
        .map(|m| match m {
            Mark::Bar { height, .. } => *height,
            other => panic!("unexpected mark {:?}", other),
        })
        .collect();
    assert!((heights[0] - 168.0).abs() < 1e-9);
    assert!((heights[1] - 132.0).abs() < 1e-9);

    let mut surface = RecordingSurface::new();
    render_bar_chart(&mut surface, &geometry, &scores);
    assert_eq!(surface.label_texts(LabelRole::Category), vec!["js", "go", "front"]);
    assert_eq!(surface.lines(LineKind::Grid).len(), 6);
    assert_eq!(surface.lines(LineKind::Axis).len(), 2);
}

#[test]
fn test_skill_cap_holds_through_svg() {
    let records: Vec<LedgerRecord> = (1..=12).map(|i| LedgerRecord::new(i * 5).of_kind(&format!("skill_s{}", i))).collect();
    let scores = aggregate_best_by_category(&records);
    assert_eq!(scores.len(), MAX_SKILLS);
    assert_eq!(scores[0].best_amount, 60);

    let geometry = compute_bar_geometry(&scores, &Canvas::bar_default(), LabelRule::Prefix);
    let mut svg = SvgSurface::new();
    render_bar_chart(&mut svg, &geometry, &scores);
    let doc = svg.document().unwrap();
    assert_eq!(doc.matches("<rect").count(), MAX_SKILLS);
}
