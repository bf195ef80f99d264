//! Ledger records as returned by the data-query endpoint.
//!
//! Records are read-only once decoded; every chart and summary value is a
//! view derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::LedgerError;

/// Object a transaction was granted for (project, exercise, module).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// One experience- or skill-granting transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(default, deserialize_with = "integer_amount")]
    pub amount: i64,
    #[serde(default, rename = "createdAt", deserialize_with = "rfc3339_timestamp")]
    pub occurred_at: Option<DateTime<Utc>>,
    /// Transaction type; the category for skill records (`skill_go`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "object")]
    pub subject: Option<Subject>,
}

impl LedgerRecord {
    pub fn new(amount: i64) -> Self {
        Self { amount, occurred_at: None, kind: None, subject: None }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    pub fn of_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn for_subject(mut self, name: &str) -> Self {
        self.subject = Some(Subject { name: name.to_string(), kind: None });
        self
    }

    pub fn subject_name(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Reads a JSON amount as a signed integer.
///
/// Whole-valued floats are accepted (`5120.0`); fractional numbers and
/// non-numeric values are rejected. A missing or null amount counts as zero.
pub fn parse_amount(value: &Value) -> Result<i64, LedgerError> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(LedgerError::NonIntegerAmount(n.to_string())),
            }
        }
        other => Err(LedgerError::NonIntegerAmount(other.to_string())),
    }
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| LedgerError::Timestamp(raw.to_string()))
}

fn integer_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    parse_amount(&raw).map_err(serde::de::Error::custom)
}

fn rfc3339_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_timestamp(&s))
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_experience_row() {
        let raw = json!({
            "amount": 5120,
            "createdAt": "2025-03-01T10:00:00.123456+00:00",
            "object": { "name": "graphql", "type": "project" }
        });
        let rec: LedgerRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(rec.amount, 5120);
        assert_eq!(rec.subject_name(), Some("graphql"));
        assert_eq!(rec.subject.unwrap().kind.as_deref(), Some("project"));
        assert!(rec.occurred_at.is_some());
    }

    #[test]
    fn test_decodes_skill_row_without_timestamp() {
        let rec: LedgerRecord = serde_json::from_value(json!({"type": "skill_go", "amount": 40})).unwrap();
        assert_eq!(rec.kind.as_deref(), Some("skill_go"));
        assert_eq!(rec.occurred_at, None);
        assert_eq!(rec.subject_name(), None);
    }

    #[test]
    fn test_whole_float_amount_accepted() {
        assert_eq!(parse_amount(&json!(1.0e3)).unwrap(), 1000);
        assert_eq!(parse_amount(&json!(-30)).unwrap(), -30);
        assert_eq!(parse_amount(&Value::Null).unwrap(), 0);
    }

    #[test]
    fn test_malformed_amount_rejected() {
        assert!(matches!(parse_amount(&json!(12.5)), Err(LedgerError::NonIntegerAmount(_))));
        assert!(matches!(parse_amount(&json!("100")), Err(LedgerError::NonIntegerAmount(_))));
        let res: Result<LedgerRecord, _> = serde_json::from_value(json!({"amount": "lots"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let res: Result<LedgerRecord, _> =
            serde_json::from_value(json!({"amount": 1, "createdAt": "yesterday"}));
        assert!(res.is_err());
        assert!(parse_timestamp("2025-01-01T00:00:00Z").is_ok());
    }

    #[test]
    fn test_null_subject_has_no_name() {
        let rec: LedgerRecord = serde_json::from_value(json!({"amount": 3, "object": null})).unwrap();
        assert_eq!(rec.subject, None);
    }
}
