pub mod error;
pub mod factory;
pub mod memory;
pub mod patient_repo;
pub mod postgres;
pub mod sqlite;

pub use factory::build_patient_repo;
pub use memory::MemoryPatientRepo;
pub use patient_repo::{AdditionalInformation, PageRequest, Patient, PatientRepo};
pub use postgres::PgPatientRepo;
pub use sqlite::SqlitePatientRepo;
