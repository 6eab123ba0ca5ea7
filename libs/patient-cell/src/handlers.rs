// libs/patient-cell/src/handlers.rs
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

use crate::models::{PatientError, SetAddressRequest};
use crate::services::address::AddressService;

fn address_service(config: &AppConfig) -> AddressService {
    let store: Arc<dyn DocumentStore> = Arc::new(FirestoreClient::new(config));
    AddressService::new(store)
}

fn map_error(err: PatientError) -> AppError {
    match err {
        PatientError::AddressNotFound(id) => {
            AppError::NotFound(format!("Address {} not found", id))
        }
        PatientError::Validation(msg) => AppError::ValidationError(msg),
        PatientError::Unauthorized(msg) => AppError::Auth(msg),
        PatientError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn create_address(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<SetAddressRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let address = address_service(&state)
        .set_address(patient_id, request, None, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "address": address,
    })))
}

#[axum::debug_handler]
pub async fn update_address(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, address_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetAddressRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let address = address_service(&state)
        .set_address(patient_id, request, Some(address_id), &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "address": address,
    })))
}

#[axum::debug_handler]
pub async fn get_address(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let address = address_service(&state)
        .get_address(patient_id, address_id, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "address": address })))
}

#[axum::debug_handler]
pub async fn list_addresses(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let addresses = address_service(&state)
        .list_addresses(patient_id, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "addresses": addresses })))
}

#[axum::debug_handler]
pub async fn delete_address(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    address_service(&state)
        .delete_address(patient_id, address_id, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Address deleted",
    })))
}
