/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - middleware runs the token gate and stores this in request extensions;
 *   handlers only ever receive this type
 *
 * Notes
 * - Introspection, caching and TTLs live in services::auth
 * - Roles are compared by exact membership: admin does not imply viewer
 */
use crate::services::auth::{IdentityRecord, IdentitySource};

/// Roles the patient endpoints are gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

/// Context attached to an authenticated request.
///
/// - `identity`: who the authority says the caller is
/// - `source`: whether the identity came from cache or a fresh introspection (log correlation)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: IdentityRecord,
    pub source: IdentitySource,
}

impl AuthCtx {
    pub fn new(identity: IdentityRecord, source: IdentitySource) -> Self {
        Self { identity, source }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.identity.name.as_deref()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.identity.has_role(role.as_str())
    }
}
