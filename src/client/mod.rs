//! Collaborator seams: sign-in and data queries.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DashboardError, QueryError};
use crate::queries::QueryRequest;

pub mod fixture;
pub mod http;
pub mod retry;

/// Exchanges user credentials for a bearer credential.
#[async_trait]
pub trait Authenticator {
    async fn sign_in(&self, username: &str, password: &str) -> Result<String, DashboardError>;
}

/// Runs one query and returns its `data` payload.
#[async_trait]
pub trait DataSource {
    async fn query(&self, credential: &str, request: &QueryRequest) -> Result<Value, QueryError>;
}

/// Runs a query and decodes its payload into `T`.
pub async fn fetch<T, D>(source: &D, credential: &str, request: &QueryRequest) -> Result<T, QueryError>
where
    T: DeserializeOwned,
    D: DataSource + ?Sized,
{
    let data = source.query(credential, request).await?;
    serde_json::from_value(data).map_err(|e| QueryError::Decode(format!("{}: {}", request.kind.as_str(), e)))
}
