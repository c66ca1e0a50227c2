use std::sync::Arc;

use sqlx::PgPool;

use crate::calibration::store::CalibrationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pool used by the quota-config write path.
    pub db: PgPool,
    /// Read-only entity view consumed by the calibration engine.
    pub store: Arc<dyn CalibrationStore>,
}
