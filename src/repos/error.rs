/*
 * Responsibility
 * - What the repo layer tells callers, independent of the backend
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[source] sqlx::Error),
    #[error("conflict")]
    Conflict,
    #[error("additional information id conflict")]
    DetailConflict,
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.is_unique_violation()
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }

    /// For writes to `additional_information`, where the only unique key is the detail id.
    pub fn from_detail_write(e: sqlx::Error) -> Self {
        match Self::from_sqlx(e) {
            RepoError::Conflict => RepoError::DetailConflict,
            other => other,
        }
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        Self::from_sqlx(e)
    }
}
