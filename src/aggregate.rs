//! Series aggregation over ledger records.
//!
//! Pure functions: no I/O, no clock, no reordering of the input.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::{LedgerRecord, Subject};

/// Skill categories kept after ranking.
pub const MAX_SKILLS: usize = 8;

/// One step of a running total. Index order is the input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub amount: i64,
    pub running_total: i64,
    pub occurred_at: Option<DateTime<Utc>>,
    pub subject: Option<Subject>,
}

impl CumulativePoint {
    pub fn subject_name(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Best observed amount for one skill category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillScore {
    pub category: String,
    pub best_amount: i64,
}

/// Running total over records already ordered by time.
///
/// `running_total[0] == amount[0]` and each later total adds exactly the
/// record's own amount. Ordering is the caller's contract and is not checked.
pub fn aggregate_cumulative(records: &[LedgerRecord]) -> Vec<CumulativePoint> {
    let mut running = 0i64;
    records
        .iter()
        .map(|rec| {
            running = running.saturating_add(rec.amount);
            CumulativePoint {
                amount: rec.amount,
                running_total: running,
                occurred_at: rec.occurred_at,
                subject: rec.subject.clone(),
            }
        })
        .collect()
}

/// Keeps the best amount per category, drops non-positive bests, ranks
/// descending and truncates to [`MAX_SKILLS`].
///
/// Records without a category are ignored. Ties in the ranking keep
/// first-seen order.
pub fn aggregate_best_by_category(records: &[LedgerRecord]) -> Vec<SkillScore> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut scores: Vec<SkillScore> = Vec::new();

    for rec in records {
        let Some(category) = rec.kind.as_deref() else { continue };
        match index.get(category) {
            Some(&slot) => {
                if rec.amount > scores[slot].best_amount {
                    scores[slot].best_amount = rec.amount;
                }
            }
            None => {
                index.insert(category, scores.len());
                scores.push(SkillScore { category: category.to_string(), best_amount: rec.amount });
            }
        }
    }

    scores.retain(|s| s.best_amount > 0);
    // sort_by is stable, so equal bests stay in first-seen order
    scores.sort_by(|a, b| b.best_amount.cmp(&a.best_amount));
    scores.truncate(MAX_SKILLS);
    scores
}

/// Plain sum of amounts; zero for an empty ledger.
pub fn total_amount(records: &[LedgerRecord]) -> i64 {
    records.iter().fold(0i64, |acc, rec| acc.saturating_add(rec.amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(kind: &str, amount: i64) -> LedgerRecord {
        LedgerRecord::new(amount).of_kind(kind)
    }

    #[test]
    fn test_cumulative_scenario() {
        let recs = vec![LedgerRecord::new(100), LedgerRecord::new(-30), LedgerRecord::new(50)];
        let totals: Vec<i64> = aggregate_cumulative(&recs).iter().map(|p| p.running_total).collect();
        assert_eq!(totals, vec![100, 70, 120]);
    }

    #[test]
    fn test_cumulative_empty() {
        assert!(aggregate_cumulative(&[]).is_empty());
    }

    #[test]
    fn test_cumulative_step_equals_amount() {
        let amounts = [7, 0, -3, 12, 400, -1, 9];
        let recs: Vec<LedgerRecord> = amounts.iter().map(|a| LedgerRecord::new(*a)).collect();
        let points = aggregate_cumulative(&recs);
        assert_eq!(points.len(), recs.len());
        assert_eq!(points[0].running_total, amounts[0]);
        for i in 1..points.len() {
            assert_eq!(points[i].running_total - points[i - 1].running_total, amounts[i]);
        }
    }

    #[test]
    fn test_cumulative_monotone_for_gains() {
        let recs: Vec<LedgerRecord> = (0..20).map(|i| LedgerRecord::new(i * 3)).collect();
        let points = aggregate_cumulative(&recs);
        assert!(points.windows(2).all(|w| w[1].running_total >= w[0].running_total));
    }

    #[test]
    fn test_cumulative_keeps_input_order() {
        let early = chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let late = chrono::DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let recs = vec![
            LedgerRecord::new(1).at(late).for_subject("b"),
            LedgerRecord::new(2).at(early).for_subject("a"),
        ];
        let points = aggregate_cumulative(&recs);
        assert_eq!(points[0].subject_name(), Some("b"));
        assert_eq!(points[1].occurred_at, Some(early));
    }

    #[test]
    fn test_best_by_category_scenario() {
        let recs = vec![skill("skill_go", 40), skill("skill_go", 25), skill("skill_js", 60)];
        let best = aggregate_best_by_category(&recs);
        assert_eq!(
            best,
            vec![
                SkillScore { category: "skill_js".into(), best_amount: 60 },
                SkillScore { category: "skill_go".into(), best_amount: 40 },
            ]
        );
    }

    #[test]
    fn test_best_is_max_not_sum() {
        let recs = vec![skill("skill_algo", 10), skill("skill_algo", 35), skill("skill_algo", 20)];
        assert_eq!(aggregate_best_by_category(&recs)[0].best_amount, 35);
    }

    #[test]
    fn test_best_drops_non_positive_and_uncategorized() {
        let recs = vec![
            skill("skill_a", 0),
            skill("skill_b", -5),
            skill("skill_c", 1),
            LedgerRecord::new(90),
        ];
        let best = aggregate_best_by_category(&recs);
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].category, "skill_c");
    }

    #[test]
    fn test_best_truncates_to_eight() {
        let recs: Vec<LedgerRecord> = (1..=12).map(|i| skill(&format!("skill_{i}"), i * 5)).collect();
        let best = aggregate_best_by_category(&recs);
        assert_eq!(best.len(), MAX_SKILLS);
        assert_eq!(best[0].best_amount, 60);
        assert_eq!(best[7].best_amount, 25);
        assert!(best.iter().all(|s| s.best_amount > 0));
    }

    #[test]
    fn test_best_is_idempotent() {
        let recs = vec![
            skill("skill_go", 40),
            skill("skill_js", 60),
            skill("skill_go", 55),
            skill("skill_sql", 55),
            skill("skill_docker", 10),
        ];
        let once = aggregate_best_by_category(&recs);
        let twice = aggregate_best_by_category(&recs);
        assert_eq!(once, twice);

        let replayed: Vec<LedgerRecord> =
            once.iter().map(|s| skill(&s.category, s.best_amount)).collect();
        assert_eq!(aggregate_best_by_category(&replayed), once);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let recs = vec![skill("skill_b", 50), skill("skill_a", 50), skill("skill_c", 70)];
        let names: Vec<String> = aggregate_best_by_category(&recs).into_iter().map(|s| s.category).collect();
        assert_eq!(names, vec!["skill_c", "skill_b", "skill_a"]);
    }

    #[test]
    fn test_total_amount() {
        assert_eq!(total_amount(&[]), 0);
        assert_eq!(total_amount(&[LedgerRecord::new(100), LedgerRecord::new(-30)]), 70);
    }
}
