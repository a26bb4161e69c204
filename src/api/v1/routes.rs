/*
 * Responsibility
 * - v1 URL structure
 * - /health is public; /patients sits behind the token gate and audit trail
 * - Layer order: token gate (outer) -> audit -> handler
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    health::health,
    patients::{create_patient, delete_patient, get_patient, list_patients, update_patient},
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let patients = Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{patient_id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        );

    let patients = middleware::audit::apply(patients, state.clone());
    let patients = middleware::auth::introspection::apply(patients, state);

    Router::new().route("/health", get(health)).merge(patients)
}
