// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/patients/{patient_id}", get(handlers::list_patient_appointments))
        .route(
            "/patients/{patient_id}/{appointment_id}",
            get(handlers::get_appointment),
        )
        .route(
            "/patients/{patient_id}/{appointment_id}/assign",
            post(handlers::assign_doctor),
        )
        .route(
            "/patients/{patient_id}/{appointment_id}/status",
            patch(handlers::advance_status),
        )
        .route(
            "/patients/{patient_id}/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/patients/{patient_id}/{appointment_id}/decline",
            post(handlers::decline_appointment),
        )
        .route(
            "/patients/{patient_id}/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
