/// Factory: build the configured `PatientRepo`.
use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, sqlite::SqlitePoolOptions};

use crate::config::{DatabaseConfig, DatabaseProvider};
use crate::repos::{
    MemoryPatientRepo, PatientRepo, PgPatientRepo, SqlitePatientRepo, error::RepoResult,
};

pub async fn build_patient_repo(config: &DatabaseConfig) -> RepoResult<Arc<dyn PatientRepo>> {
    let repo: Arc<dyn PatientRepo> = match config.provider {
        DatabaseProvider::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.url)
                .await?;
            Arc::new(PgPatientRepo::new(pool))
        }
        DatabaseProvider::Sqlite => {
            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.url)
                .await?;
            Arc::new(SqlitePatientRepo::new(pool).await?)
        }
        DatabaseProvider::Memory => Arc::new(MemoryPatientRepo::new()),
    };

    tracing::info!(backend = repo.backend_name(), "patient repository ready");
    Ok(repo)
}
