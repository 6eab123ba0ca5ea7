// libs/billing-cell/src/handlers.rs
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
    BillingError, RecordPaymentRequest, SaveFeeConfigurationRequest, SubmitFeedbackRequest,
};
use crate::services::fees::FeeConfigService;
use crate::services::rating::FeedbackService;
use crate::services::settlement::SettlementService;

fn store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    Arc::new(FirestoreClient::new(config))
}

fn map_error(err: BillingError) -> AppError {
    match err {
        BillingError::Validation(msg) => AppError::ValidationError(msg),
        BillingError::Precondition(msg) => AppError::Conflict(msg),
        BillingError::NotFound(msg) => AppError::NotFound(msg),
        BillingError::Unauthorized(msg) => AppError::Auth(msg),
        BillingError::Store(e) => AppError::Database(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn record_payment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let payment = SettlementService::new(store(&state))
        .record_payment(patient_id, appointment_id, request, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "payment": payment,
    })))
}

#[axum::debug_handler]
pub async fn get_fee_configuration(
    State(state): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let config = FeeConfigService::new(store(&state))
        .resolve_fee_configuration()
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "fee_configuration": config })))
}

#[axum::debug_handler]
pub async fn save_fee_configuration(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<SaveFeeConfigurationRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let config = FeeConfigService::new(store(&state))
        .save_fee_configuration(request, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "fee_configuration": config,
    })))
}

#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<SubmitFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = require_actor(&user)?;

    let feedback = FeedbackService::new(store(&state))
        .submit_feedback(request, &actor)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "feedback": feedback,
    })))
}
