//! Bearer token → TokenGate → AuthCtx in request extensions.
//!
//! Every route under this layer requires an active token. The gate decides
//! (cache hit, or introspection + cache write); this module only translates
//! its outcome into "continue with AuthCtx" or 401.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::GateOutcome;
use crate::state::AppState;

/// Put the token gate in front of every route in `router`.
///
/// Example:
/// ```ignore
/// let patients = middleware::auth::introspection::apply(patients, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn does not see Router state, so hand it over with from_fn_with_state
    router.layer(middleware::from_fn_with_state(state, introspection_middleware))
}

async fn introspection_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match state.gate.authorize(req.headers()).await {
        GateOutcome::Authenticated { identity, source } => {
            tracing::debug!(user = identity.name.as_deref().unwrap_or("unknown"), ?source, "authenticated");
            // middleware -> extractor handoff
            req.extensions_mut().insert(AuthCtx::new(identity, source));
            Ok(next.run(req).await)
        }
        GateOutcome::Rejected(rejection) => {
            tracing::warn!(
                reason = %rejection,
                method = %req.method(),
                path = %req.uri().path(),
                "request rejected by token gate"
            );
            Err(rejection.into())
        }
    }
}
