/*
 * Responsibility
 * - PatientRepo held in process memory (DATABASE_PROVIDER=memory, tests)
 * - Same conflict rules as the SQL backends: unique patient id and number
 *   (Conflict), then unique additional information ids (DetailConflict)
 */
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::patient_repo::{PageRequest, Patient, PatientRepo};

#[derive(Clone, Debug, Default)]
pub struct MemoryPatientRepo {
    patients: Arc<RwLock<BTreeMap<Uuid, Patient>>>,
}

impl MemoryPatientRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn number_taken(patients: &BTreeMap<Uuid, Patient>, number: &str, except: Uuid) -> bool {
    patients
        .values()
        .any(|p| p.id != except && p.patient_number == number)
}

// Detail ids must be unique within `patient` and against every other patient.
fn detail_ids_clash(patients: &BTreeMap<Uuid, Patient>, patient: &Patient) -> bool {
    let mut seen = HashSet::with_capacity(patient.additional_information.len());
    if !patient
        .additional_information
        .iter()
        .all(|info| seen.insert(info.id))
    {
        return true;
    }

    patients
        .values()
        .filter(|p| p.id != patient.id)
        .flat_map(|p| &p.additional_information)
        .any(|info| seen.contains(&info.id))
}

#[async_trait]
impl PatientRepo for MemoryPatientRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, page: PageRequest) -> RepoResult<Vec<Patient>> {
        let patients = self.patients.read().await;

        let mut all: Vec<&Patient> = patients.values().collect();
        all.sort_by(|a, b| a.patient_number.cmp(&b.patient_number));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);

        Ok(all.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Patient>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn create(&self, patient: &Patient) -> RepoResult<Uuid> {
        let mut patients = self.patients.write().await;

        if patients.contains_key(&patient.id)
            || number_taken(&patients, &patient.patient_number, patient.id)
        {
            return Err(RepoError::Conflict);
        }
        if detail_ids_clash(&patients, patient) {
            return Err(RepoError::DetailConflict);
        }

        patients.insert(patient.id, patient.clone());
        Ok(patient.id)
    }

    async fn update(&self, patient: &Patient) -> RepoResult<bool> {
        let mut patients = self.patients.write().await;

        if !patients.contains_key(&patient.id) {
            return Ok(false);
        }
        if number_taken(&patients, &patient.patient_number, patient.id) {
            return Err(RepoError::Conflict);
        }
        if detail_ids_clash(&patients, patient) {
            return Err(RepoError::DetailConflict);
        }

        patients.insert(patient.id, patient.clone());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.patients.write().await.remove(&id).is_some())
    }
}
