// libs/billing-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn billing_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/payments/patients/{patient_id}/{appointment_id}",
            post(handlers::record_payment),
        )
        .route("/fee-configuration", get(handlers::get_fee_configuration))
        .route("/fee-configuration", put(handlers::save_fee_configuration))
        .route("/feedback", post(handlers::submit_feedback))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
