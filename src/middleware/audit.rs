//! Audit trail for protected routes.
//!
//! Runs inside the token gate, so the AuthCtx (if any) is already in the
//! request extensions. Success and failure responses are both recorded.

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::services::audit::AuditRecord;
use crate::state::AppState;

/// Applied as a route layer so the matched route template is available.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, audit_middleware))
}

async fn audit_middleware(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let action = format!("{} {}", req.method(), route);
    let identity = req
        .extensions()
        .get::<AuthCtx>()
        .map(|ctx| ctx.identity.clone());

    let response = next.run(req).await;

    state
        .audit
        .record(AuditRecord::new(action, identity.as_ref(), response.status()));

    response
}
