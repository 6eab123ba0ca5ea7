// libs/patient-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/{patient_id}/addresses", post(handlers::create_address))
        .route("/{patient_id}/addresses", get(handlers::list_addresses))
        .route(
            "/{patient_id}/addresses/{address_id}",
            get(handlers::get_address),
        )
        .route(
            "/{patient_id}/addresses/{address_id}",
            put(handlers::update_address),
        )
        .route(
            "/{patient_id}/addresses/{address_id}",
            delete(handlers::delete_address),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
