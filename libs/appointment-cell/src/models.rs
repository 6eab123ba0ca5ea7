// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;

// ==============================================================================
// COLLECTION PATHS
// ==============================================================================

pub fn appointments_collection(patient_id: Uuid) -> String {
    format!("users/{}/appointments", patient_id)
}

pub fn teleconsultations_collection(patient_id: Uuid, appointment_id: Uuid) -> String {
    format!(
        "users/{}/appointments/{}/teleconsultations",
        patient_id, appointment_id
    )
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub service_id: Uuid,
    /// Physical visit address; absent for teleconsultations.
    pub address_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub estimated_cost: f64,
    pub appointment_type: AppointmentType,
    pub teleconsultation_id: Option<Uuid>,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub cancellation_reason: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    PendingAssignment,
    Assigned,
    Confirmed,
    OnTheWay,
    Arrived,
    ServiceStarted,
    Completed,
    CancelledByPatient,
    CancelledByDoctor,
    DeclinedByDoctor,
    Rescheduled,
}

impl AppointmentStatus {
    /// Position along the forward pipeline; terminal side states have none.
    pub fn stage(&self) -> Option<u8> {
        match self {
            AppointmentStatus::PendingAssignment => Some(0),
            AppointmentStatus::Assigned => Some(1),
            AppointmentStatus::Confirmed => Some(2),
            AppointmentStatus::OnTheWay => Some(3),
            AppointmentStatus::Arrived => Some(4),
            AppointmentStatus::ServiceStarted => Some(5),
            AppointmentStatus::Completed => Some(6),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::CancelledByPatient
                | AppointmentStatus::CancelledByDoctor
                | AppointmentStatus::DeclinedByDoctor
                | AppointmentStatus::Rescheduled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::PendingAssignment => write!(f, "pending_assignment"),
            AppointmentStatus::Assigned => write!(f, "assigned"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::OnTheWay => write!(f, "on_the_way"),
            AppointmentStatus::Arrived => write!(f, "arrived"),
            AppointmentStatus::ServiceStarted => write!(f, "service_started"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::CancelledByPatient => write!(f, "cancelled_by_patient"),
            AppointmentStatus::CancelledByDoctor => write!(f, "cancelled_by_doctor"),
            AppointmentStatus::DeclinedByDoctor => write!(f, "declined_by_doctor"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    InPerson,
    Teleconsultation,
}

/// The six bookable visit slots. Anything else is rejected at the
/// deserialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "09:00 AM - 10:00 AM")]
    NineToTen,
    #[serde(rename = "10:00 AM - 11:00 AM")]
    TenToEleven,
    #[serde(rename = "11:00 AM - 12:00 PM")]
    ElevenToNoon,
    #[serde(rename = "02:00 PM - 03:00 PM")]
    TwoToThree,
    #[serde(rename = "03:00 PM - 04:00 PM")]
    ThreeToFour,
    #[serde(rename = "04:00 PM - 05:00 PM")]
    FourToFive,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 6] = [
        TimeSlot::NineToTen,
        TimeSlot::TenToEleven,
        TimeSlot::ElevenToNoon,
        TimeSlot::TwoToThree,
        TimeSlot::ThreeToFour,
        TimeSlot::FourToFive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::NineToTen => "09:00 AM - 10:00 AM",
            TimeSlot::TenToEleven => "10:00 AM - 11:00 AM",
            TimeSlot::ElevenToNoon => "11:00 AM - 12:00 PM",
            TimeSlot::TwoToThree => "02:00 PM - 03:00 PM",
            TimeSlot::ThreeToFour => "03:00 PM - 04:00 PM",
            TimeSlot::FourToFive => "04:00 PM - 05:00 PM",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==============================================================================
// TELECONSULTATION MODELS
// ==============================================================================

/// Created exactly once, when a doctor is first assigned to a
/// teleconsultation-type appointment, in the same batch as the assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teleconsultation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub meeting_link: String,
    pub status: TeleconsultationStatus,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeleconsultationStatus {
    Scheduled,
    Ended,
    Cancelled,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub address_id: Option<Uuid>,
    pub appointment_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub estimated_cost: f64,
    pub appointment_type: AppointmentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDoctorRequest {
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceStatusRequest {
    pub new_status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_time_slot: TimeSlot,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Doctor not found or inactive: {0}")]
    DoctorNotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
