use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::{AuthCtx, Role};

/// Extractor for handlers that need the AuthCtx.
/// Assumes the introspection middleware already inserted it into request.extensions().
/// Missing means the route is not behind the middleware: 401.
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or(AppError::Unauthorized)
    }
}

/// Type-level role requirement for `Authorized<R>`.
pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct Viewer;
pub struct Manager;
pub struct Admin;

impl RequiredRole for Viewer {
    const ROLE: Role = Role::Viewer;
}

impl RequiredRole for Manager {
    const ROLE: Role = Role::Manager;
}

impl RequiredRole for Admin {
    const ROLE: Role = Role::Admin;
}

/// AuthCtx whose identity holds role `R`, else 403.
///
/// A parts extractor, so the check runs before any body is read.
pub struct Authorized<R: RequiredRole> {
    pub ctx: AuthCtx,
    _role: PhantomData<R>,
}

impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: RequiredRole,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthCtxExtractor(ctx) = AuthCtxExtractor::from_request_parts(parts, state).await?;

        if !ctx.has_role(R::ROLE) {
            tracing::info!(
                user = ctx.user_name().unwrap_or("unknown"),
                required = R::ROLE.as_str(),
                "role check failed"
            );
            return Err(AppError::Forbidden);
        }

        Ok(Self {
            ctx,
            _role: PhantomData,
        })
    }
}
