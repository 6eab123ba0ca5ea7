// libs/patient-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;

pub fn addresses_collection(patient_id: Uuid) -> String {
    format!("users/{}/addresses", patient_id)
}

/// A patient's saved visit address. At most one per patient carries the
/// default flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub label: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAddressRequest {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub label: String,
    pub is_default: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Address not found: {0}")]
    AddressNotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
