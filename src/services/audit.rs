//! Audit trail: one record per handled request.
//!
//! Records are always logged on the `audit` target. When an endpoint is
//! configured they are also POSTed there from a detached task; delivery is
//! best-effort and never touches the response.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::config::AuditConfig;
use crate::services::auth::IdentityRecord;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditRecord {
    pub action: String,
    pub user: String,
    pub role: String,
    pub timestamp: DateTime<Utc>,
    pub status_code: u16,
}

impl AuditRecord {
    pub fn new(
        action: impl Into<String>,
        identity: Option<&IdentityRecord>,
        status: StatusCode,
    ) -> Self {
        Self {
            action: action.into(),
            user: identity
                .and_then(|i| i.name.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            role: identity
                .and_then(IdentityRecord::primary_role)
                .unwrap_or(UNKNOWN)
                .to_string(),
            timestamp: Utc::now(),
            status_code: status.as_u16(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditSink {
    client: Client,
    endpoint: Option<Url>,
}

impl AuditSink {
    pub fn new(config: &AuditConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Log the record and hand it off for delivery. Returns immediately.
    pub fn record(&self, record: AuditRecord) {
        tracing::info!(
            target: "audit",
            action = %record.action,
            user = %record.user,
            role = %record.role,
            status = record.status_code,
            timestamp = %record.timestamp,
            "AUDIT"
        );

        if self.endpoint.is_none() {
            return;
        }

        let sink = self.clone();
        tokio::spawn(async move {
            sink.deliver(&record).await;
        });
    }

    /// POST one record; failures are logged and dropped.
    pub async fn deliver(&self, record: &AuditRecord) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };

        match self.client.post(endpoint.clone()).json(record).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(status = %response.status(), "audit endpoint rejected record");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to send audit record");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_name_and_first_role() {
        let identity = IdentityRecord::new(
            Some("alice".to_string()),
            vec!["manager".to_string(), "viewer".to_string()],
            None,
        );
        let record = AuditRecord::new("POST /api/v1/patients", Some(&identity), StatusCode::CREATED);

        assert_eq!(record.user, "alice");
        assert_eq!(record.role, "manager");
        assert_eq!(record.status_code, 201);
    }

    #[test]
    fn record_falls_back_to_unknown() {
        let record = AuditRecord::new("GET /api/v1/patients", None, StatusCode::OK);
        assert_eq!(record.user, "unknown");
        assert_eq!(record.role, "unknown");

        let nameless = IdentityRecord::default();
        let record = AuditRecord::new("GET /api/v1/patients", Some(&nameless), StatusCode::OK);
        assert_eq!(record.user, "unknown");
        assert_eq!(record.role, "unknown");
    }

    #[test]
    fn record_serializes_with_pascal_case_keys() {
        let record = AuditRecord::new("DELETE /api/v1/patients/{id}", None, StatusCode::NO_CONTENT);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["Action"], "DELETE /api/v1/patients/{id}");
        assert_eq!(json["User"], "unknown");
        assert_eq!(json["StatusCode"], 204);
        assert!(json["Timestamp"].is_string());
    }
}
