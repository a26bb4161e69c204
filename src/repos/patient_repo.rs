/*
 * Responsibility
 * - Patient domain model shared by every backend
 * - PatientRepo: the one persistence seam handlers talk to
 * - Paging rules (page >= 1, page size 1..=100)
 */
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::repos::error::RepoResult;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    pub id: Uuid,
    pub patient_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub date_of_birth: NaiveDate,
    pub primary_contact_number: Option<String>,
    pub additional_information: Vec<AdditionalInformation>,
}

/// Free-form name/value detail owned by one patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalInformation {
    pub id: Uuid,
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Patient persistence.
///
/// Implementations are selected at startup and shared as `Arc<dyn PatientRepo>`.
/// Each write is one transaction covering the patient row and its
/// additional information.
#[async_trait]
pub trait PatientRepo: Send + Sync + 'static {
    fn backend_name(&self) -> &'static str;

    // Ordered by patient number.
    async fn list(&self, page: PageRequest) -> RepoResult<Vec<Patient>>;

    async fn get(&self, id: Uuid) -> RepoResult<Option<Patient>>;

    // `RepoError::Conflict` when the id or patient number is taken,
    // `RepoError::DetailConflict` when an additional information id is.
    async fn create(&self, patient: &Patient) -> RepoResult<Uuid>;

    // Replaces the patient and its additional information.
    // Returns `Ok(false)` if no patient has `patient.id`. Conflicts as for `create`.
    async fn update(&self, patient: &Patient) -> RepoResult<bool>;

    // Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}
