/*
 * Responsibility
 * - /patients CRUD handlers
 * - Role gates via Authorized<R> (viewer reads, manager writes, admin deletes)
 * - DTO validation -> PatientRepo -> response
 */
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::patients::{ListPatientsQuery, PatientRequest, PatientResponse},
        extractors::{Admin, Authorized, Manager, Viewer},
    },
    error::AppError,
    repos::PageRequest,
    state::AppState,
};

pub async fn list_patients(
    State(state): State<AppState>,
    _auth: Authorized<Viewer>,
    Query(query): Query<ListPatientsQuery>,
) -> Result<Json<Vec<PatientResponse>>, AppError> {
    let page = PageRequest::new(query.page, query.page_size);
    let patients = state.repo.list(page).await?;

    tracing::info!(
        page = page.page(),
        size = page.limit(),
        returned = patients.len(),
        "retrieved patients page"
    );

    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

pub async fn get_patient(
    State(state): State<AppState>,
    _auth: Authorized<Viewer>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<PatientResponse>, AppError> {
    let patient = state
        .repo
        .get(patient_id)
        .await?
        .ok_or(AppError::not_found("patient"))?;

    Ok(Json(patient.into()))
}

pub async fn create_patient(
    State(state): State<AppState>,
    auth: Authorized<Manager>,
    Json(req): Json<PatientRequest>,
) -> Result<Response, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_PATIENT", msg))?;

    let id = req.id.unwrap_or_else(Uuid::new_v4);
    let patient = req.into_patient(id);
    state.repo.create(&patient).await?;

    tracing::info!(
        patient_id = %id,
        by = auth.ctx.user_name().unwrap_or("unknown"),
        "created patient"
    );

    let location = HeaderValue::from_str(&format!("/api/v1/patients/{id}"))
        .map_err(|_| AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(PatientResponse::from(patient)),
    )
        .into_response())
}

pub async fn update_patient(
    State(state): State<AppState>,
    auth: Authorized<Manager>,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<PatientRequest>,
) -> Result<StatusCode, AppError> {
    if req.id.is_some_and(|body_id| body_id != patient_id) {
        return Err(AppError::bad_request(
            "ID_MISMATCH",
            "route id and body id mismatch",
        ));
    }
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_PATIENT", msg))?;

    let patient = req.into_patient(patient_id);
    if !state.repo.update(&patient).await? {
        return Err(AppError::not_found("patient"));
    }

    tracing::info!(
        patient_id = %patient_id,
        by = auth.ctx.user_name().unwrap_or("unknown"),
        "updated patient"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_patient(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    // Idempotent: deleting an absent patient is still 204.
    let deleted = state.repo.delete(patient_id).await?;

    tracing::info!(
        patient_id = %patient_id,
        deleted,
        by = auth.ctx.user_name().unwrap_or("unknown"),
        "deleted patient"
    );
    Ok(StatusCode::NO_CONTENT)
}
