//! Validated identity produced by token introspection.
//!
//! The cached form is a JSON array of `{ "type": ..., "value": ... }` claim
//! pairs so any consumer of the shared cache can read it without knowing this
//! struct.
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CLAIM_NAME: &str = "name";
pub const CLAIM_ROLE: &str = "role";
pub const CLAIM_EXP: &str = "exp";

/// Identity attached to an authenticated request.
///
/// - `name`: principal name from the authority's `username`
/// - `roles`: ordered, duplicate-free; may be empty
/// - `expires_at`: authority `exp` (unix seconds), a hint only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityRecord {
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: Option<i64>,
}

/// One typed fact in the cached representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("claim '{kind}' has an invalid value")]
    InvalidValue { kind: &'static str },
}

impl IdentityRecord {
    /// Build a record, dropping repeated roles (first occurrence wins).
    pub fn new(
        name: Option<String>,
        roles: impl IntoIterator<Item = String>,
        expires_at: Option<i64>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for role in roles {
            if !unique.contains(&role) {
                unique.push(role);
            }
        }

        Self {
            name,
            roles: unique,
            expires_at,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// First role in authority order, used where a single role is reported.
    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }

    pub fn to_claims(&self) -> Vec<Claim> {
        let mut claims = Vec::with_capacity(self.roles.len() + 2);
        if let Some(name) = &self.name {
            claims.push(Claim {
                kind: CLAIM_NAME.to_string(),
                value: name.clone(),
            });
        }
        for role in &self.roles {
            claims.push(Claim {
                kind: CLAIM_ROLE.to_string(),
                value: role.clone(),
            });
        }
        if let Some(exp) = self.expires_at {
            claims.push(Claim {
                kind: CLAIM_EXP.to_string(),
                value: exp.to_string(),
            });
        }
        claims
    }

    /// Rebuild a record from cached claims. Unknown claim types are ignored.
    pub fn from_claims(claims: Vec<Claim>) -> Result<Self, ClaimError> {
        let mut name = None;
        let mut roles = Vec::new();
        let mut expires_at = None;

        for claim in claims {
            match claim.kind.as_str() {
                CLAIM_NAME => name = Some(claim.value),
                CLAIM_ROLE => roles.push(claim.value),
                CLAIM_EXP => {
                    let exp = claim
                        .value
                        .parse::<i64>()
                        .map_err(|_| ClaimError::InvalidValue { kind: CLAIM_EXP })?;
                    expires_at = Some(exp);
                }
                _ => {}
            }
        }

        Ok(Self::new(name, roles, expires_at))
    }
}
