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

use crate::models::{CreateDoctorRequest, DoctorError, UpdateDoctorStatusRequest};
use crate::services::profile::DoctorProfileService;

fn profile_service(config: &AppConfig) -> DoctorProfileService {
    let store: Arc<dyn DocumentStore> = Arc::new(FirestoreClient::new(config));
    DoctorProfileService::new(store)
}

fn map_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound(id) => AppError::NotFound(format!("Doctor {} not found", id)),
        DoctorError::Validation(msg) => AppError::ValidationError(msg),
        DoctorError::Unauthorized(msg) => AppError::Auth(msg),
        DoctorError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let doctor = profile_service(&state)
        .create_doctor(request, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = profile_service(&state)
        .get_doctor(doctor_id)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "doctor": doctor })))
}

#[axum::debug_handler]
pub async fn list_active_doctors(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctors = profile_service(&state)
        .list_active_doctors()
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn set_doctor_status(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    profile_service(&state)
        .set_doctor_status(doctor_id, request.status, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor status updated",
    })))
}
