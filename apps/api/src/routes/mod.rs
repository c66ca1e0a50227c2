pub mod health;

use axum::{routing::get, Router};

use crate::calibration::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Calibration engine
        .route(
            "/api/v1/calibrators/:calibrator_id/summary",
            get(handlers::handle_summary),
        )
        .route(
            "/api/v1/calibrators/:calibrator_id/guidance",
            get(handlers::handle_guidance),
        )
        .route(
            "/api/v1/calibrators/:calibrator_id/actuals",
            get(handlers::handle_actuals),
        )
        // Rating quota configuration
        .route(
            "/api/v1/quota-configs/:project_id/:business_unit_id",
            get(handlers::handle_get_quota_config).put(handlers::handle_put_quota_config),
        )
        .with_state(state)
}
