//! In-memory `CalibrationStore` and fixture builders for engine tests.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::calibration::store::{CalibrationStore, CalibratorPhase};
use crate::errors::AppError;
use crate::models::calibration::{
    BusinessUnit, CalibrationRecord, CalibrationStatus, Employee, RatingBand, ScoringMethod,
    SpmoStatus,
};
use crate::models::quota::RatingQuotaConfig;

pub const PROJECT: Uuid = Uuid::from_u128(0xfeed);

#[derive(Debug, Clone)]
pub struct Calibrator {
    pub id: Uuid,
    pub name: String,
}

pub fn calibrator(name: &str) -> Calibrator {
    Calibrator {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

pub fn business_unit(name: &str) -> BusinessUnit {
    BusinessUnit {
        id: Uuid::new_v4(),
        name: name.to_string(),
        group_id: None,
    }
}

pub fn record(order: i32, by: &Calibrator, rating: RatingBand, score: f64) -> CalibrationRecord {
    CalibrationRecord {
        id: Uuid::new_v4(),
        project_id: PROJECT,
        project_phase_id: Uuid::from_u128(order as u128),
        phase_order: order,
        calibrator_id: by.id,
        calibrator_name: by.name.clone(),
        rating,
        score,
        status: CalibrationStatus::Complete,
        spmo_status: SpmoStatus::Unset,
    }
}

pub fn with_status(mut r: CalibrationRecord, status: CalibrationStatus) -> CalibrationRecord {
    r.status = status;
    r
}

pub fn employee(
    name: &str,
    bu: &BusinessUnit,
    scoring_method: ScoringMethod,
    trail: Vec<CalibrationRecord>,
) -> Employee {
    Employee {
        id: Uuid::new_v4(),
        name: name.to_string(),
        business_unit: bu.clone(),
        scoring_method,
        trail,
    }
}

pub fn quota(bu: &BusinessUnit, pcts: [f64; 6]) -> RatingQuotaConfig {
    RatingQuotaConfig {
        project_id: PROJECT,
        business_unit_id: bu.id,
        a_plus: pcts[0],
        a: pcts[1],
        b_plus: pcts[2],
        b: pcts[3],
        c: pcts[4],
        d: pcts[5],
        remaining: RatingBand::B,
        excess: RatingBand::B,
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    pub phases: HashMap<Uuid, CalibratorPhase>,
    pub employees: Vec<Employee>,
    pub configs: HashMap<(Uuid, Uuid), RatingQuotaConfig>,
    pub fail_cohort_lookup: bool,
}

impl InMemoryStore {
    pub fn at_phase(mut self, who: &Calibrator, phase_order: i32) -> Self {
        self.phases.insert(
            who.id,
            CalibratorPhase {
                project_id: PROJECT,
                phase_order,
            },
        );
        self
    }

    pub fn with_employee(mut self, e: Employee) -> Self {
        self.employees.push(e);
        self
    }

    pub fn with_quota(mut self, config: RatingQuotaConfig) -> Self {
        self.configs
            .insert((config.project_id, config.business_unit_id), config);
        self
    }

    fn sorted(mut employees: Vec<Employee>) -> Vec<Employee> {
        employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        for e in &mut employees {
            e.trail.sort_by_key(|r| r.phase_order);
        }
        employees
    }
}

#[async_trait]
impl CalibrationStore for InMemoryStore {
    async fn get_calibrator_phase(&self, calibrator_id: Uuid) -> Result<CalibratorPhase, AppError> {
        self.phases
            .get(&calibrator_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No active phase for calibrator {calibrator_id}")))
    }

    async fn get_employees_in_scope(
        &self,
        calibrator_id: Uuid,
        phase: CalibratorPhase,
    ) -> Result<Vec<Employee>, AppError> {
        let scoped = self
            .employees
            .iter()
            .filter(|e| {
                e.trail.iter().any(|r| {
                    r.project_id == phase.project_id && r.calibrator_id == calibrator_id
                })
            })
            .cloned()
            .collect();
        Ok(Self::sorted(scoped))
    }

    async fn get_business_unit_employees(
        &self,
        project_id: Uuid,
        business_unit_id: Uuid,
    ) -> Result<Vec<Employee>, AppError> {
        if self.fail_cohort_lookup {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let members = self
            .employees
            .iter()
            .filter(|e| e.business_unit.id == business_unit_id)
            .filter(|e| e.trail.iter().any(|r| r.project_id == project_id))
            .cloned()
            .collect();
        Ok(Self::sorted(members))
    }

    async fn get_quota_config(
        &self,
        project_id: Uuid,
        business_unit_id: Uuid,
    ) -> Result<RatingQuotaConfig, AppError> {
        self.configs
            .get(&(project_id, business_unit_id))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No rating quota for project {project_id} / business unit {business_unit_id}"
                ))
            })
    }
}
