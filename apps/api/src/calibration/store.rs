use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibration::cohort::{select_cohort, CohortQuery};
use crate::errors::AppError;
use crate::models::calibration::Employee;
use crate::models::quota::RatingQuotaConfig;

/// Where a calibrator currently sits: its active project and highest phase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibratorPhase {
    pub project_id: Uuid,
    pub phase_order: i32,
}

/// Read-only entity view the engine consumes.
///
/// Employees come back with their full trail in the calibrator's project,
/// sorted by phase order, and are themselves ordered by name then id.
///
/// Carried in `AppState` as `Arc<dyn CalibrationStore>`.
#[async_trait]
pub trait CalibrationStore: Send + Sync {
    /// `NotFound` when the calibrator holds no record in an active project.
    async fn get_calibrator_phase(&self, calibrator_id: Uuid) -> Result<CalibratorPhase, AppError>;

    /// Every employee with at least one record by `calibrator_id` in the project.
    async fn get_employees_in_scope(
        &self,
        calibrator_id: Uuid,
        phase: CalibratorPhase,
    ) -> Result<Vec<Employee>, AppError>;

    /// Every employee of the business unit with a record in the project.
    async fn get_business_unit_employees(
        &self,
        project_id: Uuid,
        business_unit_id: Uuid,
    ) -> Result<Vec<Employee>, AppError>;

    /// `NotFound` when the (project, business unit) pair has no quota config.
    async fn get_quota_config(
        &self,
        project_id: Uuid,
        business_unit_id: Uuid,
    ) -> Result<RatingQuotaConfig, AppError>;

    /// Cohort selection shared by all adapters: fetch the business unit, then filter.
    async fn get_cohort(
        &self,
        query: &CohortQuery,
        phase: CalibratorPhase,
    ) -> Result<Vec<Employee>, AppError> {
        let candidates = self
            .get_business_unit_employees(phase.project_id, query.business_unit_id)
            .await?;
        select_cohort(candidates, query, phase.phase_order)
    }
}
