//! Every PatientRepo backend that runs without external services, held to the
//! same behavior: memory and SQLite (in-memory database).
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::NaiveDate;
use patient_api::repos::error::RepoError;
use patient_api::repos::{
    AdditionalInformation, MemoryPatientRepo, PageRequest, Patient, PatientRepo,
    SqlitePatientRepo,
};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

async fn sqlite() -> SqlitePatientRepo {
    // One connection that never recycles: each sqlite::memory: connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    SqlitePatientRepo::new(pool).await.unwrap()
}

async fn backends() -> Vec<Arc<dyn PatientRepo>> {
    vec![Arc::new(MemoryPatientRepo::new()), Arc::new(sqlite().await)]
}

fn detail(id: Uuid, name: &str) -> AdditionalInformation {
    AdditionalInformation {
        id,
        name: name.to_string(),
        value: Some("O+".to_string()),
    }
}

fn patient(number: &str) -> Patient {
    Patient {
        id: Uuid::new_v4(),
        patient_number: number.to_string(),
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: Some("grace@example.com".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1906, 12, 9).unwrap(),
        primary_contact_number: None,
        additional_information: vec![detail(Uuid::new_v4(), "blood type")],
    }
}

#[tokio::test]
async fn create_then_get_round_trips_patient_and_details() {
    for repo in backends().await {
        let p = patient("S1");

        let id = repo.create(&p).await.unwrap();

        assert_eq!(id, p.id, "{}", repo.backend_name());
        assert_eq!(repo.get(id).await.unwrap(), Some(p), "{}", repo.backend_name());
        assert_eq!(repo.get(Uuid::new_v4()).await.unwrap(), None);
    }
}

#[tokio::test]
async fn duplicate_patient_number_or_id_is_a_conflict() {
    for repo in backends().await {
        let first = patient("S1");
        repo.create(&first).await.unwrap();

        let err = repo.create(&patient("S1")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict), "{}: {err:?}", repo.backend_name());

        let mut same_id = patient("S2");
        same_id.id = first.id;
        let err = repo.create(&same_id).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict), "{}: {err:?}", repo.backend_name());

        // The failed writes left nothing behind.
        assert_eq!(repo.list(PageRequest::default()).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn detail_id_shared_across_patients_is_a_detail_conflict() {
    for repo in backends().await {
        let shared = Uuid::new_v4();
        let mut first = patient("S1");
        first.additional_information = vec![detail(shared, "allergy")];
        repo.create(&first).await.unwrap();

        let mut second = patient("S2");
        second.additional_information = vec![detail(shared, "allergy")];
        let err = repo.create(&second).await.unwrap_err();
        assert!(
            matches!(err, RepoError::DetailConflict),
            "{}: {err:?}",
            repo.backend_name()
        );
        assert_eq!(repo.get(second.id).await.unwrap(), None, "{}", repo.backend_name());

        second.additional_information = vec![detail(Uuid::new_v4(), "allergy")];
        repo.create(&second).await.unwrap();
        second.additional_information = vec![detail(shared, "allergy")];
        let err = repo.update(&second).await.unwrap_err();
        assert!(
            matches!(err, RepoError::DetailConflict),
            "{}: {err:?}",
            repo.backend_name()
        );

        // Replacing a patient with its own detail ids is fine.
        assert!(repo.update(&first).await.unwrap(), "{}", repo.backend_name());
    }
}

#[tokio::test]
async fn repeated_detail_id_within_one_patient_is_a_detail_conflict() {
    for repo in backends().await {
        let id = Uuid::new_v4();
        let mut p = patient("S1");
        p.additional_information = vec![detail(id, "a"), detail(id, "b")];

        let err = repo.create(&p).await.unwrap_err();
        assert!(
            matches!(err, RepoError::DetailConflict),
            "{}: {err:?}",
            repo.backend_name()
        );
        assert_eq!(repo.get(p.id).await.unwrap(), None, "{}", repo.backend_name());
    }
}

#[tokio::test]
async fn update_replaces_details_and_reports_missing() {
    for repo in backends().await {
        let mut p = patient("S1");
        repo.create(&p).await.unwrap();

        p.first_name = "Amazing".to_string();
        p.additional_information = vec![AdditionalInformation {
            id: Uuid::new_v4(),
            name: "rank".to_string(),
            value: None,
        }];
        assert!(repo.update(&p).await.unwrap());
        assert_eq!(repo.get(p.id).await.unwrap(), Some(p.clone()), "{}", repo.backend_name());

        assert!(!repo.update(&patient("S2")).await.unwrap(), "{}", repo.backend_name());

        let mut clash = patient("S3");
        repo.create(&clash).await.unwrap();
        clash.patient_number = "S1".to_string();
        let err = repo.update(&clash).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict), "{}: {err:?}", repo.backend_name());
    }
}

#[tokio::test]
async fn list_pages_by_patient_number() {
    for repo in backends().await {
        for number in ["S3", "S1", "S2"] {
            repo.create(&patient(number)).await.unwrap();
        }

        let first = repo.list(PageRequest::new(Some(1), Some(2))).await.unwrap();
        let numbers: Vec<_> = first.iter().map(|p| p.patient_number.as_str()).collect();
        assert_eq!(numbers, vec!["S1", "S2"], "{}", repo.backend_name());

        let second = repo.list(PageRequest::new(Some(2), Some(2))).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].patient_number, "S3");
    }
}

#[tokio::test]
async fn delete_removes_patient_and_is_repeatable() {
    for repo in backends().await {
        let p = patient("S1");
        repo.create(&p).await.unwrap();

        assert!(repo.delete(p.id).await.unwrap(), "{}", repo.backend_name());
        assert!(!repo.delete(p.id).await.unwrap());
        assert_eq!(repo.get(p.id).await.unwrap(), None);

        // Details went with the patient, so their ids are free again.
        let mut again = patient("S1");
        again.additional_information = p.additional_information.clone();
        repo.create(&again).await.unwrap();
    }
}
