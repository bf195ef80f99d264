use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::client::retry::{retry_async, RetryConfig};
use crate::client::{Authenticator, DataSource};
use crate::config::Config;
use crate::error::{DashboardError, QueryError};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::queries::QueryRequest;

/// reqwest-backed sign-in and GraphQL transport.
pub struct HttpClient {
    client: Client,
    auth_url: String,
    graphql_url: String,
    retry: RetryConfig,
}

impl HttpClient {
    pub fn new(cfg: &Config) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            auth_url: cfg.auth_url.clone(),
            graphql_url: cfg.graphql_url.clone(),
            retry: cfg.retry.clone(),
        })
    }

    async fn post_query(&self, credential: &str, request: &QueryRequest) -> Result<Value, QueryError> {
        let resp = self
            .client
            .post(&self.graphql_url)
            .bearer_auth(credential)
            .json(&request.body())
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        interpret_query_response(status, &body)
    }
}

#[async_trait]
impl Authenticator for HttpClient {
    async fn sign_in(&self, username: &str, password: &str) -> Result<String, DashboardError> {
        if username.is_empty() || password.is_empty() {
            return Err(DashboardError::Authentication("username and password are required".to_string()));
        }
        let resp = self
            .client
            .post(&self.auth_url)
            .header("Authorization", basic_authorization(username, password))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| DashboardError::Authentication(format!("sign-in request failed: {}", e)))?;

        let status = resp.status();
        log(Level::Debug, Domain::Auth, "sign_in_response", obj(&[("status", v_num(status.as_u16() as f64))]));
        if !status.is_success() {
            return Err(DashboardError::Authentication(format!("invalid credentials (status {})", status.as_u16())));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| DashboardError::Authentication(format!("unreadable sign-in response: {}", e)))?;
        parse_credential(&body)
    }
}

#[async_trait]
impl DataSource for HttpClient {
    async fn query(&self, credential: &str, request: &QueryRequest) -> Result<Value, QueryError> {
        if credential.is_empty() {
            return Err(QueryError::MissingCredential);
        }
        let result = retry_async(
            &self.retry,
            request.kind.as_str(),
            || self.post_query(credential, request),
            QueryError::is_retryable,
        )
        .await;
        if let Err(err) = &result {
            log(
                Level::Debug,
                Domain::Query,
                "query_failed",
                obj(&[("query", v_str(request.kind.as_str())), ("error", v_str(&err.to_string()))]),
            );
        }
        result
    }
}

pub fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// The sign-in endpoint answers with a JSON string literal holding the token.
pub fn parse_credential(body: &str) -> Result<String, DashboardError> {
    let token: String = serde_json::from_str(body.trim())
        .map_err(|_| DashboardError::Authentication("sign-in response is not a JSON string".to_string()))?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(DashboardError::Authentication("no token received from server".to_string()));
    }
    Ok(token)
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorItem>,
}

#[derive(Deserialize)]
struct GraphQlErrorItem {
    #[serde(default)]
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlErrorItem {
    fn names_credential(&self) -> bool {
        let code = self
            .extensions
            .as_ref()
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
            .unwrap_or("");
        code == "invalid-jwt" || code == "invalid-headers" || self.message.contains("JWT")
    }
}

/// Classifies one GraphQL HTTP exchange.
pub fn interpret_query_response(status: u16, body: &str) -> Result<Value, QueryError> {
    if status == 401 || status == 403 {
        return Err(QueryError::Rejected(format!("status {}", status)));
    }
    if !(200..300).contains(&status) {
        return Err(QueryError::Status(status));
    }
    let parsed: GraphQlResponse = serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))?;
    if !parsed.errors.is_empty() {
        if let Some(err) = parsed.errors.iter().find(|e| e.names_credential()) {
            return Err(QueryError::Rejected(err.message.clone()));
        }
        return Err(QueryError::GraphQl(parsed.errors.into_iter().map(|e| e.message).collect()));
    }
    parsed.data.ok_or_else(|| QueryError::Decode("response has no data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_authorization_header() {
        assert_eq!(basic_authorization("Aladdin", "open sesame"), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn test_parse_credential_json_string() {
        assert_eq!(parse_credential("\"eyJhbGciOiJIUzI1NiJ9.x.y\"\n").unwrap(), "eyJhbGciOiJIUzI1NiJ9.x.y");
    }

    #[test]
    fn test_parse_credential_rejects_other_shapes() {
        assert!(matches!(parse_credential("\"\""), Err(DashboardError::Authentication(_))));
        assert!(matches!(parse_credential("{\"token\":\"abc\"}"), Err(DashboardError::Authentication(_))));
        assert!(matches!(parse_credential("eyJ.bare"), Err(DashboardError::Authentication(_))));
    }

    #[test]
    fn test_success_returns_data() {
        let body = json!({"data": {"user": [{"firstName": "Ada"}]}}).to_string();
        let data = interpret_query_response(200, &body).unwrap();
        assert_eq!(data["user"][0]["firstName"], "Ada");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(interpret_query_response(401, ""), Err(QueryError::Rejected(_))));
        assert!(matches!(interpret_query_response(403, ""), Err(QueryError::Rejected(_))));
        assert!(matches!(interpret_query_response(502, ""), Err(QueryError::Status(502))));
    }

    #[test]
    fn test_graphql_errors() {
        let body = json!({"errors": [{"message": "field \"foo\" not found"}]}).to_string();
        assert!(matches!(interpret_query_response(200, &body), Err(QueryError::GraphQl(m)) if m.len() == 1));

        let expired = json!({"errors": [{"message": "Could not verify JWT: JWTExpired", "extensions": {"code": "invalid-jwt"}}]}).to_string();
        assert!(matches!(interpret_query_response(200, &expired), Err(QueryError::Rejected(_))));
    }

    #[test]
    fn test_missing_data_is_decode_error() {
        assert!(matches!(interpret_query_response(200, "{}"), Err(QueryError::Decode(_))));
        assert!(matches!(interpret_query_response(200, "<html>"), Err(QueryError::Decode(_))));
    }
}
