// libs/billing-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;

pub const PAYMENTS_COLLECTION: &str = "payments";
pub const FEEDBACK_COLLECTION: &str = "feedback";
pub const FEE_CONFIG_COLLECTION: &str = "fee_configurations";
pub const FEE_CONFIG_DOC_ID: &str = "current_config";

// ==============================================================================
// SETTLEMENT MODELS
// ==============================================================================

/// Immutable settlement record. There is no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub method: String,
    pub transaction_ref: String,
    pub status: PaymentRecordStatus,
    pub platform_fee_amount: f64,
    pub doctor_fee_amount: f64,
    pub admin_fee_amount: f64,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The settlement engine only ever produces successful records; gateway
/// failures never reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    Successful,
}

/// Platform-wide percentage split, stored as fractions in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfiguration {
    pub platform_fee_percentage: f64,
    pub doctor_share_percentage: f64,
    pub admin_fee_percentage: f64,
    pub effective_from: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl FeeConfiguration {
    pub fn split(&self, amount: f64) -> FeeSplit {
        FeeSplit {
            platform_fee_amount: amount * self.platform_fee_percentage,
            doctor_fee_amount: amount * self.doctor_share_percentage,
            admin_fee_amount: amount * self.admin_fee_percentage,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeeSplit {
    pub platform_fee_amount: f64,
    pub doctor_fee_amount: f64,
    pub admin_fee_amount: f64,
}

// ==============================================================================
// FEEDBACK MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub rating: i32,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: f64,
    pub currency: Option<String>,
    pub method: String,
    /// Gateway reference; a synthetic offline reference is generated when
    /// absent.
    pub transaction_ref: Option<String>,
}

/// Percentages arrive as 0-100 at the interface and are stored as 0-1
/// fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFeeConfigurationRequest {
    pub platform_fee_percentage: f64,
    pub doctor_share_percentage: f64,
    pub admin_fee_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub rating: i32,
    pub comments: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
