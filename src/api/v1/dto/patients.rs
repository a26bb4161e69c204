/*
 * Responsibility
 * - Patient request/response DTOs (camelCase on the wire)
 * - validate(): shape checks before anything reaches the repo
 * - Conversion to/from the repo's Patient model
 */
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::{AdditionalInformation, Patient};

const MAX_NAME_LEN: usize = 100;
const MAX_PATIENT_NUMBER_LEN: usize = 32;
const MAX_EMAIL_LEN: usize = 256;
const MAX_PHONE_LEN: usize = 32;
const MAX_INFO_VALUE_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListPatientsQuery {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInformationRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub value: Option<String>,
}

/// Body for both create and replace.
///
/// `id` is optional: generated on create, taken from the path on replace
/// (where a present-but-different id is rejected).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    pub id: Option<Uuid>,
    pub patient_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub date_of_birth: NaiveDate,
    pub primary_contact_number: Option<String>,
    #[serde(default)]
    pub additional_information: Vec<AdditionalInformationRequest>,
}

impl PatientRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let number = self.patient_number.trim();
        if number.is_empty() {
            return Err("patientNumber is required");
        }
        if number.len() > MAX_PATIENT_NUMBER_LEN
            || !number.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err("patientNumber must be alphanumeric (dashes allowed), <= 32 chars");
        }
        if self.first_name.trim().is_empty() {
            return Err("firstName is required");
        }
        if self.last_name.trim().is_empty() {
            return Err("lastName is required");
        }
        if self.first_name.len() > MAX_NAME_LEN || self.last_name.len() > MAX_NAME_LEN {
            return Err("names must be <= 100 chars");
        }
        if let Some(email) = &self.email
            && (email.len() > MAX_EMAIL_LEN || !is_plausible_email(email))
        {
            return Err("email is not a valid address");
        }
        if let Some(phone) = &self.primary_contact_number
            && phone.len() > MAX_PHONE_LEN
        {
            return Err("primaryContactNumber must be <= 32 chars");
        }
        if self.date_of_birth > Utc::now().date_naive() {
            return Err("dateOfBirth cannot be in the future");
        }
        for info in &self.additional_information {
            if info.name.trim().is_empty() || info.name.len() > MAX_NAME_LEN {
                return Err("additionalInformation.name is required, <= 100 chars");
            }
            if let Some(value) = &info.value
                && value.len() > MAX_INFO_VALUE_LEN
            {
                return Err("additionalInformation.value must be <= 1000 chars");
            }
        }

        Ok(())
    }

    pub fn into_patient(self, id: Uuid) -> Patient {
        Patient {
            id,
            patient_number: self.patient_number.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email,
            date_of_birth: self.date_of_birth,
            primary_contact_number: self.primary_contact_number,
            additional_information: self
                .additional_information
                .into_iter()
                .map(|info| AdditionalInformation {
                    id: info.id.unwrap_or_else(Uuid::new_v4),
                    name: info.name.trim().to_string(),
                    value: info.value,
                })
                .collect(),
        }
    }
}

// local@domain with a dot in the domain; full RFC parsing is not the goal
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInformationResponse {
    pub id: Uuid,
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: Uuid,
    pub patient_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub date_of_birth: NaiveDate,
    pub primary_contact_number: Option<String>,
    pub additional_information: Vec<AdditionalInformationResponse>,
}

impl From<Patient> for PatientResponse {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            patient_number: p.patient_number,
            first_name: p.first_name,
            last_name: p.last_name,
            email: p.email,
            date_of_birth: p.date_of_birth,
            primary_contact_number: p.primary_contact_number,
            additional_information: p
                .additional_information
                .into_iter()
                .map(|i| AdditionalInformationResponse {
                    id: i.id,
                    name: i.name,
                    value: i.value,
                })
                .collect(),
        }
    }
}
