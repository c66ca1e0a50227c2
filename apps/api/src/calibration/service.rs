//! Per-cohort guidance and actual totals exposed to the HTTP layer.

use tracing::debug;

use crate::calibration::allocator::allocate;
use crate::calibration::cohort::{resolve_cohort, CohortQuery};
use crate::calibration::store::CalibrationStore;
use crate::errors::AppError;
use crate::models::quota::{BandCounts, QuotaBreakdown};

/// Target counts per band for the cohort, from the business unit's quota.
pub async fn compute_guidance_quota(
    store: &dyn CalibrationStore,
    query: &CohortQuery,
) -> Result<QuotaBreakdown, AppError> {
    let cohort = resolve_cohort(store, query).await?;
    let config = store
        .get_quota_config(cohort.phase.project_id, query.business_unit_id)
        .await?;
    debug!(
        "Guidance for calibrator {} ({:?}): cohort of {}",
        query.calibrator_id,
        query.strategy,
        cohort.employees.len()
    );
    Ok(allocate(&config, cohort.employees.len()))
}

/// Ratings actually given at the calibrator's phase, per band.
pub async fn compute_actual_totals(
    store: &dyn CalibrationStore,
    query: &CohortQuery,
) -> Result<QuotaBreakdown, AppError> {
    let cohort = resolve_cohort(store, query).await?;
    let mut counts = BandCounts::default();
    for employee in &cohort.employees {
        if let Some(current) = employee.record_at(cohort.phase.phase_order) {
            counts.increment(current.rating);
        }
    }
    Ok(QuotaBreakdown {
        counts,
        total: cohort.employees.len() as i64,
    })
}
