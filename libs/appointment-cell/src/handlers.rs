// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{firestore::FirestoreClient, DocumentStore};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_actor;

use crate::models::{
    AdvanceStatusRequest, AppointmentError, AssignDoctorRequest, CancelAppointmentRequest,
    CreateAppointmentRequest, RescheduleAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;

fn booking_service(config: &AppConfig) -> AppointmentBookingService {
    let store: Arc<dyn DocumentStore> = Arc::new(FirestoreClient::new(config));
    AppointmentBookingService::new(store, &config.teleconsult_platform)
}

fn map_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound(id) => {
            AppError::NotFound(format!("Appointment {} not found", id))
        }
        AppointmentError::DoctorNotFound(id) => {
            AppError::NotFound(format!("Doctor {} not found or inactive", id))
        }
        AppointmentError::Validation(msg) => AppError::ValidationError(msg),
        AppointmentError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
        AppointmentError::Unauthorized(msg) => AppError::Auth(msg),
        AppointmentError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .create_appointment(request, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment requested; a doctor will be assigned shortly",
    })))
}

#[axum::debug_handler]
pub async fn assign_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AssignDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .assign_doctor(patient_id, appointment_id, request.doctor_id, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn advance_status(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AdvanceStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .advance_status(patient_id, appointment_id, request.new_status, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .cancel(patient_id, appointment_id, &actor, request.reason)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn decline_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .decline(patient_id, appointment_id, &actor, request.reason)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .reschedule(patient_id, appointment_id, request, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointment = booking_service(&state)
        .get_appointment(patient_id, appointment_id, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let appointments = booking_service(&state)
        .list_patient_appointments(patient_id, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}
