//! Offline data source answering from a JSON document.
//!
//! The document maps query names (`profile`, `audits`, `level`, `experience`,
//! `skills`) to the `data` payload each query would have returned.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::DataSource;
use crate::error::{DashboardError, QueryError};
use crate::queries::{QueryKind, QueryRequest};

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    payloads: HashMap<QueryKind, Value>,
    failures: HashMap<QueryKind, QueryError>,
    accepted: Option<HashSet<String>>,
    delay: Option<Duration>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(doc: &Value) -> Self {
        let mut source = Self::new();
        for kind in QueryKind::ALL {
            if let Some(payload) = doc.get(kind.as_str()) {
                source.payloads.insert(kind, payload.clone());
            }
        }
        source
    }

    pub fn from_file(path: &Path) -> Result<Self, DashboardError> {
        let raw = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&raw)
            .map_err(|e| DashboardError::Config(format!("fixture {}: {}", path.display(), e)))?;
        Ok(Self::from_value(&doc))
    }

    pub fn with_payload(mut self, kind: QueryKind, payload: Value) -> Self {
        self.payloads.insert(kind, payload);
        self
    }

    pub fn failing(mut self, kind: QueryKind, error: QueryError) -> Self {
        self.failures.insert(kind, error);
        self
    }

    /// Only these credentials are accepted; others are rejected.
    pub fn accepting(mut self, credential: &str) -> Self {
        self.accepted.get_or_insert_with(HashSet::new).insert(credential.to_string());
        self
    }

    /// Every answer is held back this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn query(&self, credential: &str, request: &QueryRequest) -> Result<Value, QueryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if credential.is_empty() {
            return Err(QueryError::MissingCredential);
        }
        if let Some(accepted) = &self.accepted {
            if !accepted.contains(credential) {
                return Err(QueryError::Rejected("status 401".to_string()));
            }
        }
        if let Some(err) = self.failures.get(&request.kind) {
            return Err(err.clone());
        }
        self.payloads
            .get(&request.kind)
            .cloned()
            .ok_or_else(|| QueryError::Transport { message: format!("no fixture for {}", request.kind.as_str()), retryable: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_answers_by_kind() {
        let source = FixtureSource::from_value(&json!({"level": {"transaction": [{"amount": 12}]}}));
        let data = source.query("tok", &QueryRequest::level()).await.unwrap();
        assert_eq!(data["transaction"][0]["amount"], 12);
        assert!(source.query("tok", &QueryRequest::profile()).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_unknown_credential() {
        let source = FixtureSource::new()
            .with_payload(QueryKind::Profile, json!({"user": []}))
            .accepting("good");
        assert!(source.query("good", &QueryRequest::profile()).await.is_ok());
        let err = source.query("bad", &QueryRequest::profile()).await.unwrap_err();
        assert!(err.is_session_rejection());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = FixtureSource::new()
            .with_payload(QueryKind::Audits, json!({"user": []}))
            .failing(QueryKind::Audits, QueryError::Status(500));
        assert!(matches!(source.query("t", &QueryRequest::audits()).await, Err(QueryError::Status(500))));
    }
}
