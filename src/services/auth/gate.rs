//! Bearer token authorization gate.
//!
//! `NoHeader | MalformedHeader -> Reject`
//! `CacheHit -> Authenticated`
//! `CacheMiss -> Introspecting -> Authenticated (+cache write) | Reject`
//!
//! `authorize` is total: every failure inside is logged and turned into a
//! `Rejection`, nothing propagates to the caller.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use crate::services::auth::identity::IdentityRecord;
use crate::services::auth::introspection::{
    Introspection, IntrospectionClient, IntrospectionError,
};
use crate::services::auth::token_cache::{TokenCache, token_fingerprint};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing or malformed bearer credentials")]
    Unauthenticated,
    #[error("token is not active")]
    InvalidToken,
    #[error("introspection authority unavailable")]
    AuthorityUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Cache,
    Authority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Authenticated {
        identity: IdentityRecord,
        source: IdentitySource,
    },
    Rejected(Rejection),
}

/// How long an introspected identity may be served from cache.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    pub default_ttl: Duration,
    pub max_ttl: Duration,
}

/// Hard ceiling for any cached identity, whatever `max_ttl` says.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            max_ttl: MAX_CACHE_TTL,
        }
    }
}

impl TtlPolicy {
    /// `exp - now` when it lies strictly inside `(0, max_ttl)`, else the default.
    /// Both bounds are capped at `MAX_CACHE_TTL`.
    pub fn ttl_for(&self, expires_at: Option<i64>, now: i64) -> Duration {
        let default_ttl = self.default_ttl.min(MAX_CACHE_TTL);
        let Some(exp) = expires_at else {
            return default_ttl;
        };

        let max_secs = self.max_ttl.min(MAX_CACHE_TTL).as_secs();
        match u64::try_from(exp.saturating_sub(now)) {
            Ok(remaining) if remaining > 0 && remaining < max_secs => {
                Duration::from_secs(remaining)
            }
            _ => default_ttl,
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively; a blank token counts as malformed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;

    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = value.get(BEARER_PREFIX.len()..)?.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Debug, Clone)]
pub struct TokenGate {
    cache: TokenCache,
    introspection: IntrospectionClient,
    ttl: TtlPolicy,
}

impl TokenGate {
    pub fn new(cache: TokenCache, introspection: IntrospectionClient, ttl: TtlPolicy) -> Self {
        Self {
            cache,
            introspection,
            ttl,
        }
    }

    pub async fn authorize(&self, headers: &HeaderMap) -> GateOutcome {
        match bearer_token(headers) {
            Some(token) => self.authorize_token(token).await,
            None => {
                tracing::debug!("missing or malformed Authorization header");
                GateOutcome::Rejected(Rejection::Unauthenticated)
            }
        }
    }

    pub async fn authorize_token(&self, token: &str) -> GateOutcome {
        if let Some(identity) = self.cache.get(token).await {
            tracing::debug!(token = %token_fingerprint(token), "token cache hit");
            return GateOutcome::Authenticated {
                identity,
                source: IdentitySource::Cache,
            };
        }

        let identity = match self.introspection.introspect(token).await {
            Ok(Introspection::Active(identity)) => identity,
            Ok(Introspection::Inactive) => {
                tracing::info!(token = %token_fingerprint(token), "token is not active");
                return GateOutcome::Rejected(Rejection::InvalidToken);
            }
            Err(IntrospectionError::Rejected(status)) => {
                tracing::info!(
                    token = %token_fingerprint(token),
                    status = %status,
                    "introspection rejected token"
                );
                return GateOutcome::Rejected(Rejection::InvalidToken);
            }
            Err(err @ IntrospectionError::Unavailable(_)) => {
                tracing::error!(error = %err, token = %token_fingerprint(token), "token introspection failed");
                return GateOutcome::Rejected(Rejection::AuthorityUnavailable);
            }
        };

        let ttl = self.ttl.ttl_for(identity.expires_at, Utc::now().timestamp());
        if let Err(err) = self.cache.put(token, &identity, ttl).await {
            // Still authenticated; the next request just introspects again.
            tracing::warn!(error = %err, token = %token_fingerprint(token), "failed to cache introspection result");
        } else {
            tracing::debug!(
                token = %token_fingerprint(token),
                ttl_secs = ttl.as_secs(),
                "cached introspection result"
            );
        }

        GateOutcome::Authenticated {
            identity,
            source: IdentitySource::Authority,
        }
    }
}
