/*
 * Responsibility
 * - PatientRepo on SQLite (sqlx::SqlitePool), the default local backend
 * - Bootstraps its own tables from sql/sqlite.sql (CREATE ... IF NOT EXISTS)
 */
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::patient_repo::{AdditionalInformation, PageRequest, Patient, PatientRepo};

const SCHEMA: &str = include_str!("../../sql/sqlite.sql");

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
    name: String,
    value: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SqlitePatientRepo {
    pool: SqlitePool,
}

impl SqlitePatientRepo {
    pub async fn new(pool: SqlitePool) -> RepoResult<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    async fn load(&self, row: PatientRow) -> RepoResult<Patient> {
        let infos = sqlx::query_as::<_, InfoRow>(
            r#"
            SELECT id, name, value
            FROM additional_information
            WHERE patient_id = ?1
            ORDER BY name, id
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Patient {
            id: row.id,
            patient_number: row.patient_number,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            date_of_birth: row.date_of_birth,
            primary_contact_number: row.primary_contact_number,
            additional_information: infos
                .into_iter()
                .map(|i| AdditionalInformation {
                    id: i.id,
                    name: i.name,
                    value: i.value,
                })
                .collect(),
        })
    }
}

async fn insert_infos(tx: &mut Transaction<'_, Sqlite>, patient: &Patient) -> RepoResult<()> {
    for info in &patient.additional_information {
        sqlx::query(
            r#"
            INSERT INTO additional_information (id, patient_id, name, value)
            VALUES (?1, ?2, ?3, ?4)
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
impl PatientRepo for SqlitePatientRepo {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, page: PageRequest) -> RepoResult<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT id, patient_number, first_name, last_name, email,
                   date_of_birth, primary_contact_number
            FROM patients
            ORDER BY patient_number
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let mut patients = Vec::with_capacity(rows.len());
        for row in rows {
            patients.push(self.load(row).await?);
        }
        Ok(patients)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Patient>> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT id, patient_number, first_name, last_name, email,
                   date_of_birth, primary_contact_number
            FROM patients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, patient: &Patient) -> RepoResult<Uuid> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO patients
                (id, patient_number, first_name, last_name, email,
                 date_of_birth, primary_contact_number)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
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
                patient_number = ?2,
                first_name = ?3,
                last_name = ?4,
                email = ?5,
                date_of_birth = ?6,
                primary_contact_number = ?7
            WHERE id = ?1
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
            return Ok(false);
        }

        sqlx::query("DELETE FROM additional_information WHERE patient_id = ?1")
            .bind(patient.id)
            .execute(&mut *tx)
            .await?;

        insert_infos(&mut tx, patient).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Explicit: foreign_keys may be off on connections we did not configure.
        sqlx::query("DELETE FROM additional_information WHERE patient_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM patients WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
