//! Token introspection client.
//!
//! Asks the remote authority whether a bearer token is active and which
//! identity it represents.
//!
//! # Wire format
//!
//! - `POST <endpoint>` with form body `token=<token>`, `Accept: application/json`
//! - optional HTTP basic client credentials
//! - response: JSON object; `active` must be `true`, everything else optional

use reqwest::{Client, StatusCode, header::ACCEPT};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::IntrospectionConfig;
use crate::services::auth::identity::IdentityRecord;
use crate::services::auth::token_cache::token_fingerprint;

#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// The authority answered with a non-success status.
    #[error("introspection rejected with status {0}")]
    Rejected(StatusCode),

    /// Transport failure or a payload we could not read.
    #[error("introspection authority unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a successful round-trip to the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Introspection {
    Active(IdentityRecord),
    Inactive,
}

#[derive(Clone)]
pub struct IntrospectionClient {
    client: Client,
    endpoint: Url,
    credentials: Option<(String, String)>,
}

impl std::fmt::Debug for IntrospectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print client credentials
        f.debug_struct("IntrospectionClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

impl IntrospectionClient {
    pub fn new(config: &IntrospectionConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(std::time::Duration::from_secs(5)))
            .build()?;

        let credentials = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }

    pub async fn introspect(&self, token: &str) -> Result<Introspection, IntrospectionError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .form(&[("token", token)]);

        if let Some((id, secret)) = &self.credentials {
            request = request.basic_auth(id, Some(secret));
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, token = %token_fingerprint(token), "introspection request failed");
            IntrospectionError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, token = %token_fingerprint(token), "introspection endpoint returned non-success");
            return Err(IntrospectionError::Rejected(status));
        }

        let body: Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "introspection response is not valid JSON");
            IntrospectionError::Unavailable(e.to_string())
        })?;

        parse_response(&body)
    }
}

/// Map an introspection payload onto an identity.
///
/// `role` comes before the entries of `roles`; repeats are dropped.
pub fn parse_response(body: &Value) -> Result<Introspection, IntrospectionError> {
    let fields = body.as_object().ok_or_else(|| {
        IntrospectionError::Unavailable("introspection payload is not a JSON object".to_string())
    })?;

    if fields.get("active").and_then(Value::as_bool) != Some(true) {
        return Ok(Introspection::Inactive);
    }

    let name = fields
        .get("username")
        .and_then(Value::as_str)
        .map(str::to_string);

    let single = fields
        .get("role")
        .and_then(Value::as_str)
        .map(str::to_string);

    let many = fields
        .get("roles")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string);

    let expires_at = fields.get("exp").and_then(|exp| match exp {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    });

    Ok(Introspection::Active(IdentityRecord::new(
        name,
        single.into_iter().chain(many),
        expires_at,
    )))
}
