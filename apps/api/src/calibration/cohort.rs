//! Cohort Resolver: which employees, at the calibrator's phase, sit under a
//! given reference calibrator.
//!
//! Every strategy first restricts to employees of the business unit whose
//! record at the calibrator's phase order is the calibrator's own. Then:
//! - `default`: the preceding record is by the reference calibrator.
//! - `numberOne`: every record before the phase is by the calibrator itself
//!   (top of chain), and the preceding calibrator, defaulting to the
//!   calibrator, is the reference.
//! - `n-1`: there is no preceding record at all.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibration::store::{CalibrationStore, CalibratorPhase};
use crate::errors::AppError;
use crate::models::calibration::Employee;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CohortStrategy {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "numberOne")]
    NumberOne,
    #[serde(rename = "n-1")]
    NoPriorOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortQuery {
    pub calibrator_id: Uuid,
    /// Ignored by `n-1`; required otherwise.
    pub reference_calibrator_id: Option<Uuid>,
    pub business_unit_id: Uuid,
    pub strategy: CohortStrategy,
}

/// A cohort together with the phase it was resolved at.
#[derive(Debug, Clone)]
pub struct ResolvedCohort {
    pub phase: CalibratorPhase,
    pub employees: Vec<Employee>,
}

/// Looks up the calibrator's phase, then asks the store for the cohort.
pub async fn resolve_cohort(
    store: &dyn CalibrationStore,
    query: &CohortQuery,
) -> Result<ResolvedCohort, AppError> {
    let phase = store.get_calibrator_phase(query.calibrator_id).await?;
    let employees = store.get_cohort(query, phase).await?;
    Ok(ResolvedCohort { phase, employees })
}

/// Applies a strategy to a candidate set. Output is ordered by name, then id.
pub fn select_cohort(
    candidates: Vec<Employee>,
    query: &CohortQuery,
    phase_order: i32,
) -> Result<Vec<Employee>, AppError> {
    let reference = match query.strategy {
        CohortStrategy::NoPriorOwner => None,
        CohortStrategy::Default | CohortStrategy::NumberOne => {
            Some(query.reference_calibrator_id.ok_or_else(|| {
                AppError::Validation(
                    "reference_calibrator_id is required for this strategy".to_string(),
                )
            })?)
        }
    };

    let mut cohort: Vec<Employee> = candidates
        .into_iter()
        .filter(|e| e.business_unit.id == query.business_unit_id)
        .filter(|e| {
            e.record_at(phase_order)
                .is_some_and(|r| r.calibrator_id == query.calibrator_id)
        })
        .filter(|e| matches_strategy(e, query, reference, phase_order))
        .collect();

    cohort.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(cohort)
}

fn matches_strategy(
    employee: &Employee,
    query: &CohortQuery,
    reference: Option<Uuid>,
    phase_order: i32,
) -> bool {
    let preceding = employee.preceding(phase_order).map(|r| r.calibrator_id);
    match query.strategy {
        CohortStrategy::Default => preceding.is_some() && preceding == reference,
        CohortStrategy::NumberOne => {
            let top_of_chain = employee
                .trail
                .iter()
                .filter(|r| r.phase_order < phase_order)
                .all(|r| r.calibrator_id == query.calibrator_id);
            top_of_chain && Some(preceding.unwrap_or(query.calibrator_id)) == reference
        }
        CohortStrategy::NoPriorOwner => preceding.is_none(),
    }
}
