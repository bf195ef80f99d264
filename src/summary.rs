//! Scalar summary fields shown above the charts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::total_amount;
use crate::ledger::LedgerRecord;
use crate::queries::{AuditData, CountAggregate, ProfileData, TransactionData};

pub const PENDING_TEXT: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub display_name: String,
    pub level: i64,
    pub audit_ratio: f64,
    pub passed_audit_count: u64,
    pub failed_audit_count: u64,
    pub total_experience: i64,
}

impl Summary {
    /// Derives every field independently; a default input yields the
    /// zero/placeholder value for that field only.
    pub fn derive(profile: &ProfileData, audits: &AuditData, level: &TransactionData, experience: &[LedgerRecord]) -> Self {
        let user = profile.user.first();
        let first = user.and_then(|u| u.first_name.as_deref()).unwrap_or("");
        let last = user.and_then(|u| u.last_name.as_deref()).unwrap_or("");
        let full = format!("{} {}", first, last).trim().to_string();

        let audit = audits.user.first();
        Self {
            display_name: if full.is_empty() { "User".to_string() } else { full },
            level: level.transaction.first().map(|t| t.amount).unwrap_or(0),
            audit_ratio: audit.and_then(|a| a.audit_ratio).unwrap_or(0.0),
            passed_audit_count: audit.map(|a| CountAggregate::count(&a.audits_aggregate)).unwrap_or(0),
            failed_audit_count: audit.map(|a| CountAggregate::count(&a.failed_audits)).unwrap_or(0),
            total_experience: total_amount(experience),
        }
    }

    /// Interim state shown while the queries are in flight.
    pub fn write_pending<F: DisplayFields + ?Sized>(fields: &mut F) {
        fields.set_field(SummaryField::DisplayName, PENDING_TEXT);
        fields.set_field(SummaryField::Level, PENDING_TEXT);
    }

    /// Writes each field once, formatted for display.
    pub fn write_to<F: DisplayFields + ?Sized>(&self, fields: &mut F) {
        fields.set_field(SummaryField::DisplayName, &self.display_name);
        fields.set_field(SummaryField::Level, &format!("Level: {}", self.level));
        fields.set_field(SummaryField::AuditRatio, &format!("{:.1}", self.audit_ratio));
        fields.set_field(SummaryField::PassedAudits, &self.passed_audit_count.to_string());
        fields.set_field(SummaryField::FailedAudits, &self.failed_audit_count.to_string());
        fields.set_field(SummaryField::TotalExperience, &group_thousands(self.total_experience));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SummaryField {
    DisplayName,
    Level,
    AuditRatio,
    PassedAudits,
    FailedAudits,
    TotalExperience,
}

impl SummaryField {
    pub fn caption(&self) -> &'static str {
        match self {
            SummaryField::DisplayName => "Name",
            SummaryField::Level => "Level",
            SummaryField::AuditRatio => "Audit Ratio",
            SummaryField::PassedAudits => "Passed Audits",
            SummaryField::FailedAudits => "Failed Audits",
            SummaryField::TotalExperience => "Total XP",
        }
    }
}

/// Where summary text is written.
pub trait DisplayFields {
    fn set_field(&mut self, field: SummaryField, text: &str);
}

/// In-memory display fields, ordered by field.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    fields: BTreeMap<SummaryField, String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: SummaryField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SummaryField, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl DisplayFields for FieldMap {
    fn set_field(&mut self, field: SummaryField, text: &str) {
        self.fields.insert(field, text.to_string());
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
