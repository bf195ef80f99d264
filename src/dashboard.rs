//! Dashboard orchestration: five concurrent queries, one summary, two charts.
//!
//! Each query is bounded by the configured timeout and fails on its own; a
//! failed query contributes its default shape. The one failure that aborts a
//! load is a rejected credential, which tears the session down.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;

use crate::aggregate::{aggregate_best_by_category, aggregate_cumulative};
use crate::client::{fetch, Authenticator, DataSource};
use crate::config::Config;
use crate::error::{DashboardError, QueryError};
use crate::geometry::{compute_bar_geometry, compute_line_geometry};
use crate::logging::{credential_fingerprint, log, log_load_summary, log_query_fallback, obj, v_str, Domain, Level, ProfileScope};
use crate::queries::{AuditData, ProfileData, QueryKind, QueryRequest, SkillsData, TransactionData};
use crate::render::{render_bar_chart, render_line_chart, Surface};
use crate::session::SessionContext;
use crate::summary::{DisplayFields, Summary};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub summary: Summary,
    /// Queries that fell back to their default shape.
    pub failures: Vec<(QueryKind, QueryError)>,
    pub experience_points: usize,
    pub skills: usize,
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Completed(LoadReport),
    /// Another load was already running; nothing was touched.
    Skipped,
    /// The session was replaced or ended while the queries ran. Results
    /// were discarded and the current session was left as it is.
    Stale,
}

/// Clears the in-flight flag however the load ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Dashboard<D> {
    source: D,
    session: SessionContext,
    config: Config,
    in_flight: AtomicBool,
}

impl<D: DataSource> Dashboard<D> {
    pub fn new(source: D, session: SessionContext, config: Config) -> Self {
        Self { source, session, config, in_flight: AtomicBool::new(false) }
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exchanges user credentials and stores the resulting session.
    pub async fn sign_in<A>(&self, auth: &A, username: &str, password: &str) -> Result<(), DashboardError>
    where
        A: Authenticator + ?Sized,
    {
        match auth.sign_in(username, password).await {
            Ok(token) => self.session.set_credential(&token),
            Err(err) => {
                log(Level::Warn, Domain::Auth, "sign_in_failed", obj(&[("error", v_str(&err.to_string()))]));
                Err(err)
            }
        }
    }

    pub fn logout(&self) -> Result<(), DashboardError> {
        self.session.clear_credential()
    }

    async fn bounded<T: DeserializeOwned>(&self, credential: &str, request: QueryRequest) -> Result<T, QueryError> {
        let limit = self.config.query_timeout;
        match tokio::time::timeout(limit, fetch(&self.source, credential, &request)).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Timeout(limit)),
        }
    }

    /// Loads everything and redraws both charts.
    ///
    /// Returns `SessionInvalid` (after clearing the credential) when there is
    /// no credential or the data endpoint rejects it; surfaces are left
    /// untouched in that case. A sign-in or logout that lands while the
    /// queries run turns the load into `Stale`.
    pub async fn load_and_render<F, X, K>(
        &self,
        fields: &mut F,
        experience_surface: &mut X,
        skills_surface: &mut K,
    ) -> Result<LoadOutcome, DashboardError>
    where
        F: DisplayFields + ?Sized,
        X: Surface + ?Sized,
        K: Surface + ?Sized,
    {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            log(Level::Info, Domain::System, "load_skipped", obj(&[("msg", v_str("load already in flight"))]));
            return Ok(LoadOutcome::Skipped);
        };
        let Some(credential) = self.session.credential() else {
            return Err(DashboardError::SessionInvalid("no credential".to_string()));
        };
        let session_id = credential_fingerprint(&credential);
        let _scope = ProfileScope::with_context("load_and_render", &[("session", v_str(&session_id))]);
        Summary::write_pending(fields);

        let (profile, audits, level, experience, skills) = tokio::join!(
            self.bounded::<ProfileData>(&credential, QueryRequest::profile()),
            self.bounded::<AuditData>(&credential, QueryRequest::audits()),
            self.bounded::<TransactionData>(&credential, QueryRequest::level()),
            self.bounded::<TransactionData>(&credential, QueryRequest::experience(self.config.xp_event_id)),
            self.bounded::<SkillsData>(&credential, QueryRequest::skills()),
        );

        let mut failures = Vec::new();
        let profile = settle(QueryKind::Profile, profile, &mut failures);
        let audits = settle(QueryKind::Audits, audits, &mut failures);
        let level = settle(QueryKind::Level, level, &mut failures);
        let experience = settle(QueryKind::Experience, experience, &mut failures);
        let skills = settle(QueryKind::Skills, skills, &mut failures);

        if let Some((kind, err)) = failures.iter().find(|(_, e)| e.is_session_rejection()) {
            let reason = format!("{} query: {}", kind.as_str(), err);
            log(Level::Warn, Domain::Session, "rejected", obj(&[("session", v_str(&session_id)), ("reason", v_str(&reason))]));
            if !self.session.clear_if_current(&credential)? {
                return Ok(discard_stale(&session_id));
            }
            return Err(DashboardError::SessionInvalid(reason));
        }
        if !self.session.is_current(&credential) {
            return Ok(discard_stale(&session_id));
        }

        let summary = Summary::derive(&profile, &audits, &level, &experience.transaction);
        summary.write_to(fields);

        let points = aggregate_cumulative(&experience.transaction);
        let line = compute_line_geometry(&points, &self.config.line_canvas);
        render_line_chart(experience_surface, &line, &points);

        let scores = aggregate_best_by_category(&skills.into_records());
        let bars = compute_bar_geometry(&scores, &self.config.bar_canvas, self.config.label_rule);
        render_bar_chart(skills_surface, &bars, &scores);

        log_load_summary(&session_id, failures.len(), points.len(), scores.len(), summary.total_experience);
        Ok(LoadOutcome::Completed(LoadReport {
            summary,
            failures,
            experience_points: points.len(),
            skills: scores.len(),
        }))
    }
}

fn discard_stale(session_id: &str) -> LoadOutcome {
    log(
        Level::Info,
        Domain::Session,
        "load_discarded",
        obj(&[("session", v_str(session_id)), ("msg", v_str("session changed during load"))]),
    );
    LoadOutcome::Stale
}

fn settle<T: Default>(kind: QueryKind, result: Result<T, QueryError>, failures: &mut Vec<(QueryKind, QueryError)>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log_query_fallback(kind.as_str(), &err.to_string());
            failures.push((kind, err));
            T::default()
        }
    }
}
