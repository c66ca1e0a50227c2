//! Axum route handlers for the calibration engine and quota configuration.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibration::cohort::{CohortQuery, CohortStrategy};
use crate::calibration::postgres::upsert_quota_config;
use crate::calibration::service::{compute_actual_totals, compute_guidance_quota};
use crate::calibration::summary::{summarize, SummaryResult};
use crate::errors::AppError;
use crate::models::calibration::RatingBand;
use crate::models::quota::{QuotaBreakdown, RatingQuotaConfig};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CohortParams {
    pub business_unit_id: Uuid,
    pub reference_calibrator_id: Option<Uuid>,
    /// Absent means `default`; an unknown literal is rejected by the extractor.
    #[serde(default)]
    pub strategy: CohortStrategy,
}

impl CohortParams {
    fn into_query(self, calibrator_id: Uuid) -> CohortQuery {
        CohortQuery {
            calibrator_id,
            reference_calibrator_id: self.reference_calibrator_id,
            business_unit_id: self.business_unit_id,
            strategy: self.strategy,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuotaConfigRequest {
    pub a_plus: f64,
    pub a: f64,
    pub b_plus: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub remaining: RatingBand,
    pub excess: RatingBand,
}

impl QuotaConfigRequest {
    fn into_config(self, project_id: Uuid, business_unit_id: Uuid) -> Result<RatingQuotaConfig, AppError> {
        let config = RatingQuotaConfig {
            project_id,
            business_unit_id,
            a_plus: self.a_plus,
            a: self.a,
            b_plus: self.b_plus,
            b: self.b,
            c: self.c,
            d: self.d,
            remaining: self.remaining,
            excess: self.excess,
        };
        for band in RatingBand::ALL {
            let pct = config.percentage(band);
            if !pct.is_finite() || pct < 0.0 {
                return Err(AppError::Validation(format!(
                    "quota for {band} must be a non-negative number, got {pct}"
                )));
            }
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
pub struct CohortQuotaResponse {
    pub calibrator_id: Uuid,
    pub business_unit_id: Uuid,
    pub strategy: CohortStrategy,
    #[serde(flatten)]
    pub quota: QuotaBreakdown,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/calibrators/:calibrator_id/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Path(calibrator_id): Path<Uuid>,
) -> Result<Json<SummaryResult>, AppError> {
    let summary = summarize(state.store.as_ref(), calibrator_id).await?;
    Ok(Json(summary))
}

/// GET /api/v1/calibrators/:calibrator_id/guidance
pub async fn handle_guidance(
    State(state): State<AppState>,
    Path(calibrator_id): Path<Uuid>,
    Query(params): Query<CohortParams>,
) -> Result<Json<CohortQuotaResponse>, AppError> {
    let query = params.into_query(calibrator_id);
    let quota = compute_guidance_quota(state.store.as_ref(), &query).await?;
    Ok(Json(CohortQuotaResponse {
        calibrator_id,
        business_unit_id: query.business_unit_id,
        strategy: query.strategy,
        quota,
    }))
}

/// GET /api/v1/calibrators/:calibrator_id/actuals
pub async fn handle_actuals(
    State(state): State<AppState>,
    Path(calibrator_id): Path<Uuid>,
    Query(params): Query<CohortParams>,
) -> Result<Json<CohortQuotaResponse>, AppError> {
    let query = params.into_query(calibrator_id);
    let quota = compute_actual_totals(state.store.as_ref(), &query).await?;
    Ok(Json(CohortQuotaResponse {
        calibrator_id,
        business_unit_id: query.business_unit_id,
        strategy: query.strategy,
        quota,
    }))
}

/// GET /api/v1/quota-configs/:project_id/:business_unit_id
pub async fn handle_get_quota_config(
    State(state): State<AppState>,
    Path((project_id, business_unit_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RatingQuotaConfig>, AppError> {
    let config = state
        .store
        .get_quota_config(project_id, business_unit_id)
        .await?;
    Ok(Json(config))
}

/// PUT /api/v1/quota-configs/:project_id/:business_unit_id
///
/// Percentages need not sum to 100; only negative or non-finite values are rejected.
pub async fn handle_put_quota_config(
    State(state): State<AppState>,
    Path((project_id, business_unit_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<QuotaConfigRequest>,
) -> Result<Json<RatingQuotaConfig>, AppError> {
    let config = req.into_config(project_id, business_unit_id)?;
    upsert_quota_config(&state.db, &config).await?;
    Ok(Json(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(a_plus: f64) -> QuotaConfigRequest {
        QuotaConfigRequest {
            a_plus,
            a: 10.0,
            b_plus: 25.0,
            b: 40.0,
            c: 15.0,
            d: 5.0,
            remaining: RatingBand::B,
            excess: RatingBand::A,
        }
    }

    #[test]
    fn test_negative_quota_is_rejected() {
        let err = request(-1.0)
            .into_config(Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_nan_quota_is_rejected() {
        assert!(request(f64::NAN)
            .into_config(Uuid::new_v4(), Uuid::new_v4())
            .is_err());
    }

    #[test]
    fn test_quota_not_summing_to_hundred_is_accepted() {
        let config = request(50.0)
            .into_config(Uuid::new_v4(), Uuid::new_v4())
            .unwrap();
        assert_eq!(config.a_plus, 50.0);
    }

    #[test]
    fn test_strategy_defaults_when_absent() {
        let params: CohortParams = serde_json::from_value(serde_json::json!({
            "business_unit_id": Uuid::nil(),
        }))
        .unwrap();
        assert_eq!(params.strategy, CohortStrategy::Default);
        assert_eq!(params.reference_calibrator_id, None);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let parsed: Result<CohortParams, _> = serde_json::from_value(serde_json::json!({
            "business_unit_id": Uuid::nil(),
            "strategy": "everyone",
        }));
        assert!(parsed.is_err());
    }
}
