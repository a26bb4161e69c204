/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - repo: selected PatientRepo backend, gate: token gate, audit: audit sink
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::repos::PatientRepo;
use crate::services::{audit::AuditSink, auth::TokenGate};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PatientRepo>,
    pub gate: Arc<TokenGate>,
    pub audit: AuditSink,
}

impl AppState {
    pub fn new(repo: Arc<dyn PatientRepo>, gate: Arc<TokenGate>, audit: AuditSink) -> Self {
        Self { repo, gate, audit }
    }
}
