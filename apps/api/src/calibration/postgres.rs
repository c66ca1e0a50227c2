//! PostgreSQL-backed `CalibrationStore` plus the quota-config write path.
//! Persisted strings are parsed into domain enums here; a bad value is an
//! `Internal` error, never silently coerced.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calibration::store::{CalibrationStore, CalibratorPhase};
use crate::errors::AppError;
use crate::models::calibration::{
    BusinessUnit, CalibrationRecord, CalibrationStatus, Employee, RatingBand, ScoringMethod,
    SpmoStatus,
};
use crate::models::quota::RatingQuotaConfig;

#[derive(Debug, Clone, FromRow)]
struct PhaseRow {
    project_id: Uuid,
    phase_order: i32,
}

#[derive(Debug, Clone, FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    scoring_method: String,
    business_unit_id: Uuid,
    business_unit_name: String,
    group_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
struct CalibrationRow {
    id: Uuid,
    employee_id: Uuid,
    project_id: Uuid,
    project_phase_id: Uuid,
    phase_order: i32,
    calibrator_id: Uuid,
    calibrator_name: String,
    calibration_rating: String,
    calibration_score: f64,
    status: String,
    spmo_status: String,
}

#[derive(Debug, Clone, FromRow)]
struct RatingQuotaRow {
    project_id: Uuid,
    business_unit_id: Uuid,
    a_plus_quota: f64,
    a_quota: f64,
    b_plus_quota: f64,
    b_quota: f64,
    c_quota: f64,
    d_quota: f64,
    remaining: String,
    excess: String,
}

impl TryFrom<CalibrationRow> for CalibrationRecord {
    type Error = anyhow::Error;

    fn try_from(row: CalibrationRow) -> Result<Self, Self::Error> {
        Ok(CalibrationRecord {
            rating: row
                .calibration_rating
                .parse::<RatingBand>()
                .with_context(|| format!("calibration {}", row.id))?,
            status: row
                .status
                .parse::<CalibrationStatus>()
                .with_context(|| format!("calibration {}", row.id))?,
            spmo_status: row
                .spmo_status
                .parse::<SpmoStatus>()
                .with_context(|| format!("calibration {}", row.id))?,
            id: row.id,
            project_id: row.project_id,
            project_phase_id: row.project_phase_id,
            phase_order: row.phase_order,
            calibrator_id: row.calibrator_id,
            calibrator_name: row.calibrator_name,
            score: row.calibration_score,
        })
    }
}

impl TryFrom<RatingQuotaRow> for RatingQuotaConfig {
    type Error = anyhow::Error;

    fn try_from(row: RatingQuotaRow) -> Result<Self, Self::Error> {
        Ok(RatingQuotaConfig {
            project_id: row.project_id,
            business_unit_id: row.business_unit_id,
            a_plus: row.a_plus_quota,
            a: row.a_quota,
            b_plus: row.b_plus_quota,
            b: row.b_quota,
            c: row.c_quota,
            d: row.d_quota,
            remaining: row
                .remaining
                .parse::<RatingBand>()
                .context("rating quota remaining band")?,
            excess: row.excess.parse::<RatingBand>().context("rating quota excess band")?,
        })
    }
}

const EMPLOYEE_COLUMNS: &str = r#"
    SELECT e.id, e.name, e.scoring_method,
           bu.id AS business_unit_id, bu.name AS business_unit_name, bu.group_id
    FROM employees e
    JOIN business_units bu ON bu.id = e.business_unit_id
"#;

const QUOTA_SELECT: &str = r#"
    SELECT project_id, business_unit_id, a_plus_quota, a_quota, b_plus_quota,
           b_quota, c_quota, d_quota, remaining, excess
    FROM rating_quotas
    WHERE project_id = $1 AND business_unit_id = $2
"#;

pub struct PgCalibrationStore {
    pool: PgPool,
}

impl PgCalibrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads every trail of `rows` in the project and assembles employees, keeping row order.
    async fn with_trails(
        &self,
        project_id: Uuid,
        rows: Vec<EmployeeRow>,
    ) -> Result<Vec<Employee>, AppError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let calibrations = sqlx::query_as::<_, CalibrationRow>(
            r#"
            SELECT c.id, c.employee_id, c.project_id, c.project_phase_id,
                   ph."order" AS phase_order, c.calibrator_id, u.name AS calibrator_name,
                   c.calibration_rating, c.calibration_score, c.status, c.spmo_status
            FROM calibrations c
            JOIN project_phases pp ON pp.id = c.project_phase_id
            JOIN phases ph ON ph.id = pp.phase_id
            JOIN users u ON u.id = c.calibrator_id
            WHERE c.project_id = $1 AND c.employee_id = ANY($2)
            ORDER BY c.employee_id, ph."order", c.created_at
            "#,
        )
        .bind(project_id)
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut trails: HashMap<Uuid, Vec<CalibrationRecord>> = HashMap::new();
        for row in calibrations {
            let employee_id = row.employee_id;
            trails
                .entry(employee_id)
                .or_default()
                .push(CalibrationRecord::try_from(row)?);
        }

        Ok(rows
            .into_iter()
            .map(|row| Employee {
                trail: trails.remove(&row.id).unwrap_or_default(),
                scoring_method: ScoringMethod::parse_lenient(&row.scoring_method),
                business_unit: BusinessUnit {
                    id: row.business_unit_id,
                    name: row.business_unit_name,
                    group_id: row.group_id,
                },
                id: row.id,
                name: row.name,
            })
            .collect())
    }
}

#[async_trait]
impl CalibrationStore for PgCalibrationStore {
    async fn get_calibrator_phase(&self, calibrator_id: Uuid) -> Result<CalibratorPhase, AppError> {
        let row: Option<PhaseRow> = sqlx::query_as(
            r#"
            SELECT c.project_id, MAX(ph."order") AS phase_order
            FROM calibrations c
            JOIN project_phases pp ON pp.id = c.project_phase_id
            JOIN phases ph ON ph.id = pp.phase_id
            JOIN projects p ON p.id = c.project_id
            WHERE c.calibrator_id = $1 AND p.active
            GROUP BY c.project_id
            ORDER BY phase_order DESC
            LIMIT 1
            "#,
        )
        .bind(calibrator_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| {
            AppError::NotFound(format!("No active phase for calibrator {calibrator_id}"))
        })?;
        debug!(
            "Calibrator {calibrator_id} is at phase {} of project {}",
            row.phase_order, row.project_id
        );
        Ok(CalibratorPhase {
            project_id: row.project_id,
            phase_order: row.phase_order,
        })
    }

    async fn get_employees_in_scope(
        &self,
        calibrator_id: Uuid,
        phase: CalibratorPhase,
    ) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            r#"{EMPLOYEE_COLUMNS}
            WHERE EXISTS (
                SELECT 1 FROM calibrations c
                WHERE c.employee_id = e.id AND c.project_id = $1 AND c.calibrator_id = $2
            )
            ORDER BY e.name, e.id
            "#
        ))
        .bind(phase.project_id)
        .bind(calibrator_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_trails(phase.project_id, rows).await
    }

    async fn get_business_unit_employees(
        &self,
        project_id: Uuid,
        business_unit_id: Uuid,
    ) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            r#"{EMPLOYEE_COLUMNS}
            WHERE e.business_unit_id = $2
              AND EXISTS (
                SELECT 1 FROM calibrations c
                WHERE c.employee_id = e.id AND c.project_id = $1
              )
            ORDER BY e.name, e.id
            "#
        ))
        .bind(project_id)
        .bind(business_unit_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_trails(project_id, rows).await
    }

    async fn get_quota_config(
        &self,
        project_id: Uuid,
        business_unit_id: Uuid,
    ) -> Result<RatingQuotaConfig, AppError> {
        find_quota_config(&self.pool, project_id, business_unit_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No rating quota for project {project_id} / business unit {business_unit_id}"
                ))
            })
    }
}

pub async fn find_quota_config(
    pool: &PgPool,
    project_id: Uuid,
    business_unit_id: Uuid,
) -> Result<Option<RatingQuotaConfig>, AppError> {
    let row: Option<RatingQuotaRow> = sqlx::query_as(QUOTA_SELECT)
    .bind(project_id)
    .bind(business_unit_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(RatingQuotaConfig::try_from).transpose()?)
}

/// Inserts or replaces the quota for one (project, business unit).
pub async fn upsert_quota_config(
    pool: &PgPool,
    config: &RatingQuotaConfig,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO rating_quotas
            (project_id, business_unit_id, a_plus_quota, a_quota, b_plus_quota,
             b_quota, c_quota, d_quota, remaining, excess, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
        ON CONFLICT (project_id, business_unit_id) DO UPDATE SET
            a_plus_quota = EXCLUDED.a_plus_quota,
            a_quota = EXCLUDED.a_quota,
            b_plus_quota = EXCLUDED.b_plus_quota,
            b_quota = EXCLUDED.b_quota,
            c_quota = EXCLUDED.c_quota,
            d_quota = EXCLUDED.d_quota,
            remaining = EXCLUDED.remaining,
            excess = EXCLUDED.excess,
            updated_at = now()
        "#,
    )
    .bind(config.project_id)
    .bind(config.business_unit_id)
    .bind(config.a_plus)
    .bind(config.a)
    .bind(config.b_plus)
    .bind(config.b)
    .bind(config.c)
    .bind(config.d)
    .bind(config.remaining.as_str())
    .bind(config.excess.as_str())
    .execute(pool)
    .await?;

    info!(
        "Upserted rating quota for project {} / business unit {}",
        config.project_id, config.business_unit_id
    );
    Ok(())
}
