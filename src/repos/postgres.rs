/*
 * Responsibility
 * - PatientRepo on PostgreSQL (sqlx::PgPool)
 * - additional_information rows are replaced wholesale on update
 * - schema: sql/postgres.sql
 */
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::patient_repo::{AdditionalInformation, PageRequest, Patient, PatientRepo};

#[derive(Debug, FromRow)]
struct PatientRow {
    id: Uuid,
    patient_number: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    date_of_birth: NaiveDate,
    primary_contact_number: Option<String>,
}

#[derive(Debug, FromRow)]
struct InfoRow {
    id: Uuid,
    patient_id: Uuid,
    name: String,
    value: Option<String>,
}

impl PatientRow {
    fn into_patient(self, additional_information: Vec<AdditionalInformation>) -> Patient {
        Patient {
            id: self.id,
            patient_number: self.patient_number,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            date_of_birth: self.date_of_birth,
            primary_contact_number: self.primary_contact_number,
            additional_information,
        }
    }
}

impl From<InfoRow> for AdditionalInformation {
    fn from(row: InfoRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            value: row.value,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgPatientRepo {
    pool: PgPool,
}

impl PgPatientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_infos(
    tx: &mut Transaction<'_, Postgres>,
    patient: &Patient,
) -> RepoResult<()> {
    for info in &patient.additional_information {
        sqlx::query(
            r#"
            INSERT INTO additional_information (id, patient_id, name, value)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(info.id)
        .bind(patient.id)
        .bind(&info.name)
        .bind(info.value.as_deref())
        .execute(&mut **tx)
        .await
        .map_err(RepoError::from_detail_write)?;
    }
    Ok(())
}

#[async_trait]
impl PatientRepo for PgPatientRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn list(&self, page: PageRequest) -> RepoResult<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT id, patient_number, first_name, last_name, email,
                   date_of_birth, primary_contact_number
            FROM patients
            ORDER BY patient_number
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let infos = sqlx::query_as::<_, InfoRow>(
            r#"
            SELECT id, patient_id, name, value
            FROM additional_information
            WHERE patient_id = ANY($1)
            ORDER BY name, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_patient: HashMap<Uuid, Vec<AdditionalInformation>> = HashMap::new();
        for info in infos {
            by_patient.entry(info.patient_id).or_default().push(info.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let infos = by_patient.remove(&row.id).unwrap_or_default();
                row.into_patient(infos)
            })
            .collect())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Patient>> {
        let Some(row) = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT id, patient_number, first_name, last_name, email,
                   date_of_birth, primary_contact_number
            FROM patients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let infos = sqlx::query_as::<_, InfoRow>(
            r#"
            SELECT id, patient_id, name, value
            FROM additional_information
            WHERE patient_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(
            row.into_patient(infos.into_iter().map(Into::into).collect()),
        ))
    }

    async fn create(&self, patient: &Patient) -> RepoResult<Uuid> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO patients
                (id, patient_number, first_name, last_name, email,
                 date_of_birth, primary_contact_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(patient.id)
        .bind(&patient.patient_number)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.email.as_deref())
        .bind(patient.date_of_birth)
        .bind(patient.primary_contact_number.as_deref())
        .execute(&mut *tx)
        .await?;

        insert_infos(&mut tx, patient).await?;
        tx.commit().await?;

        Ok(patient.id)
    }

    async fn update(&self, patient: &Patient) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE patients
            SET
                patient_number = $2,
                first_name = $3,
                last_name = $4,
                email = $5,
                date_of_birth = $6,
                primary_contact_number = $7
            WHERE id = $1
            "#,
        )
        .bind(patient.id)
        .bind(&patient.patient_number)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.email.as_deref())
        .bind(patient.date_of_birth)
        .bind(patient.primary_contact_number.as_deref())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // dropping tx rolls back
            return Ok(false);
        }

        sqlx::query("DELETE FROM additional_information WHERE patient_id = $1")
            .bind(patient.id)
            .execute(&mut *tx)
            .await?;

        insert_infos(&mut tx, patient).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        // additional_information goes with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
