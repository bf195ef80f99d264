use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::client::retry::RetryConfig;
use crate::error::DashboardError;
use crate::geometry::{Canvas, LabelRule};

pub const DEFAULT_AUTH_URL: &str = "https://learn.zone01oujda.ma/api/auth/signin";
pub const DEFAULT_GRAPHQL_URL: &str = "https://learn.zone01oujda.ma/api/graphql-engine/v1/graphql";

#[derive(Clone, Debug)]
pub struct Config {
    pub auth_url: String,
    pub graphql_url: String,
    pub credential_path: PathBuf,
    pub output_dir: PathBuf,
    pub query_timeout: Duration,
    pub http_timeout: Duration,
    pub retry: RetryConfig,
    pub label_rule: LabelRule,
    /// Restricts the experience ledger to one event, excluding checkpoints.
    pub xp_event_id: Option<i64>,
    pub line_canvas: Canvas,
    pub bar_canvas: Canvas,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            credential_path: PathBuf::from("./.xpboard-credential.json"),
            output_dir: PathBuf::from("./out"),
            query_timeout: Duration::from_secs(15),
            http_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            label_rule: LabelRule::PrefixAndSuffix,
            xp_event_id: None,
            line_canvas: Canvas::line_default(),
            bar_canvas: Canvas::bar_default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            auth_url: std::env::var("AUTH_URL").unwrap_or(d.auth_url),
            graphql_url: std::env::var("GRAPHQL_URL").unwrap_or(d.graphql_url),
            credential_path: std::env::var("CREDENTIAL_PATH").map(PathBuf::from).unwrap_or(d.credential_path),
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(d.output_dir),
            query_timeout: std::env::var("QUERY_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).map(Duration::from_secs).unwrap_or(d.query_timeout),
            http_timeout: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).map(Duration::from_secs).unwrap_or(d.http_timeout),
            retry: RetryConfig {
                max_retries: std::env::var("RETRY_MAX").ok().and_then(|v| v.parse().ok()).unwrap_or(d.retry.max_retries),
                base_delay_ms: std::env::var("RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.retry.base_delay_ms),
                ..d.retry
            },
            label_rule: std::env::var("LABEL_RULE").ok().and_then(|v| LabelRule::parse(&v)).unwrap_or(d.label_rule),
            xp_event_id: std::env::var("XP_EVENT_ID").ok().and_then(|v| v.parse().ok()),
            line_canvas: d.line_canvas,
            bar_canvas: d.bar_canvas,
        }
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        for (name, raw) in [("AUTH_URL", &self.auth_url), ("GRAPHQL_URL", &self.graphql_url)] {
            let url = Url::parse(raw).map_err(|e| DashboardError::Config(format!("{}: {}", name, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(DashboardError::Config(format!("{}: unsupported scheme {}", name, url.scheme())));
            }
        }
        if self.query_timeout.is_zero() || self.http_timeout.is_zero() {
            return Err(DashboardError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn experience_chart_path(&self) -> PathBuf {
        self.output_dir.join("experience.svg")
    }

    pub fn skills_chart_path(&self) -> PathBuf {
        self.output_dir.join("skills.svg")
    }
}
