//! The five fixed queries the dashboard issues, and the shapes they return.
//!
//! Every response shape is `Default`: that default is what a failed query
//! contributes, so a missing result reads as "no data" downstream.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::ledger::LedgerRecord;

pub const PROFILE_QUERY: &str = r#"{
  user {
    firstName
    lastName
  }
}"#;

pub const AUDITS_QUERY: &str = r#"{
  user {
    auditRatio
    audits_aggregate(where: {closureType: {_eq: succeeded}}) {
      aggregate {
        count
      }
    }
    failed_audits: audits_aggregate(where: {closureType: {_eq: failed}}) {
      aggregate {
        count
      }
    }
  }
}"#;

pub const LEVEL_QUERY: &str = r#"{
  transaction(
    where: {_and: [{type: {_eq: "level"}}, {event: {object: {name: {_eq: "Module"}}}}]}
    order_by: {amount: desc}
    limit: 1
  ) {
    amount
  }
}"#;

pub const EXPERIENCE_QUERY: &str = r#"{
  transaction(
    where: {type: {_eq: "xp"}}
    order_by: {createdAt: asc}
  ) {
    amount
    createdAt
    object {
      name
      type
    }
  }
}"#;

pub const EXPERIENCE_BY_EVENT_QUERY: &str = r#"query ($eventId: Int!) {
  transaction(
    where: {type: {_eq: "xp"}, eventId: {_eq: $eventId}, path: {_nilike: "%checkpoint%"}}
    order_by: {createdAt: asc}
  ) {
    amount
    createdAt
    object {
      name
      type
    }
  }
}"#;

pub const SKILLS_QUERY: &str = r#"{
  user {
    transactions(where: {type: {_nin: ["xp", "level", "up", "down"]}}) {
      type
      amount
    }
  }
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Profile,
    Audits,
    Level,
    Experience,
    Skills,
}

impl QueryKind {
    pub const ALL: [QueryKind; 5] = [
        QueryKind::Profile,
        QueryKind::Audits,
        QueryKind::Level,
        QueryKind::Experience,
        QueryKind::Skills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Profile => "profile",
            QueryKind::Audits => "audits",
            QueryKind::Level => "level",
            QueryKind::Experience => "experience",
            QueryKind::Skills => "skills",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub kind: QueryKind,
    pub query: &'static str,
    pub variables: Value,
}

impl QueryRequest {
    pub fn profile() -> Self {
        Self { kind: QueryKind::Profile, query: PROFILE_QUERY, variables: json!({}) }
    }

    pub fn audits() -> Self {
        Self { kind: QueryKind::Audits, query: AUDITS_QUERY, variables: json!({}) }
    }

    pub fn level() -> Self {
        Self { kind: QueryKind::Level, query: LEVEL_QUERY, variables: json!({}) }
    }

    pub fn experience(event_id: Option<i64>) -> Self {
        match event_id {
            Some(id) => Self {
                kind: QueryKind::Experience,
                query: EXPERIENCE_BY_EVENT_QUERY,
                variables: json!({ "eventId": id }),
            },
            None => Self { kind: QueryKind::Experience, query: EXPERIENCE_QUERY, variables: json!({}) },
        }
    }

    pub fn skills() -> Self {
        Self { kind: QueryKind::Skills, query: SKILLS_QUERY, variables: json!({}) }
    }

    /// JSON body posted to the data endpoint.
    pub fn body(&self) -> Value {
        json!({ "query": self.query, "variables": self.variables })
    }
}

// =============================================================================
// Response shapes
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub user: Vec<ProfileUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditData {
    #[serde(default)]
    pub user: Vec<AuditUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditUser {
    #[serde(rename = "auditRatio")]
    pub audit_ratio: Option<f64>,
    pub audits_aggregate: Option<CountAggregate>,
    pub failed_audits: Option<CountAggregate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountAggregate {
    pub aggregate: Option<Count>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Count {
    #[serde(default)]
    pub count: Option<u64>,
}

impl CountAggregate {
    pub fn count(agg: &Option<CountAggregate>) -> u64 {
        agg.as_ref().and_then(|a| a.aggregate.as_ref()).and_then(|c| c.count).unwrap_or(0)
    }
}

/// Level rows and experience rows share the `transaction` root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub transaction: Vec<LedgerRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillsData {
    #[serde(default)]
    pub user: Vec<SkillsUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillsUser {
    #[serde(default)]
    pub transactions: Vec<LedgerRecord>,
}

impl SkillsData {
    pub fn into_records(self) -> Vec<LedgerRecord> {
        self.user.into_iter().next().map(|u| u.transactions).unwrap_or_default()
    }
}
