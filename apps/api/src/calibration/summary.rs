//! Ownership & Aggregation Walker.
//!
//! Folds every in-scope employee into a per-(business unit, owner) bucket,
//! then attaches guidance quotas and averages. Bucket order is business unit
//! name, then owner name, compared on the literal strings.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::calibration::allocator::allocate;
use crate::calibration::cohort::{CohortQuery, CohortStrategy};
use crate::calibration::ownership::{resolve_owner, EstablishedOwners, Owner, Resolution};
use crate::calibration::store::{CalibrationStore, CalibratorPhase};
use crate::errors::AppError;
use crate::models::calibration::{CalibrationRecord, CalibrationStatus, Employee, SpmoStatus};
use crate::models::quota::{BandCounts, QuotaBreakdown};

/// Bucket status. Ordered so that the worst status is the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum BucketStatus {
    #[default]
    Complete,
    Calibrate,
    Waiting,
}

impl BucketStatus {
    pub fn of_record(record: &CalibrationRecord) -> Self {
        if record.status == CalibrationStatus::Waiting {
            BucketStatus::Waiting
        } else if record.status != CalibrationStatus::Complete
            || record.spmo_status == SpmoStatus::Rejected
        {
            BucketStatus::Calibrate
        } else {
            BucketStatus::Complete
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibratorBusinessUnitSummary {
    pub owner_name: String,
    /// `None` for the "no prior owner" bucket.
    pub owner_id: Option<Uuid>,
    pub business_unit_id: Uuid,
    pub business_unit_name: String,
    pub actual: BandCounts,
    pub guidance: QuotaBreakdown,
    pub score_sum: f64,
    pub scored_count: u32,
    pub average_score: f64,
    pub employee_count: u32,
    /// Employees rated by the calibrator at its own phase.
    pub direct_count: u32,
    pub status: BucketStatus,
    /// Holds employees with no earlier record, rated directly at the phase.
    #[serde(skip)]
    holds_roots: bool,
}

impl CalibratorBusinessUnitSummary {
    fn new(owner: &Owner, employee: &Employee) -> Self {
        CalibratorBusinessUnitSummary {
            owner_name: owner.name().to_string(),
            owner_id: owner.id(),
            business_unit_id: employee.business_unit.id,
            business_unit_name: employee.business_unit.name.clone(),
            actual: BandCounts::default(),
            guidance: QuotaBreakdown::default(),
            score_sum: 0.0,
            scored_count: 0,
            average_score: 0.0,
            employee_count: 0,
            direct_count: 0,
            status: BucketStatus::Complete,
            holds_roots: false,
        }
    }

    /// Folds the employee's last calibration record into the bucket.
    fn add(&mut self, employee: &Employee, last: &CalibrationRecord, direct: bool, root: bool) {
        self.actual.increment(last.rating);
        if employee.is_score_based() {
            self.score_sum += last.score;
            self.scored_count += 1;
        }
        self.employee_count += 1;
        if direct {
            self.direct_count += 1;
        }
        self.holds_roots |= root;
        self.status = self.status.max(BucketStatus::of_record(last));
    }

    fn absorb(&mut self, other: CalibratorBusinessUnitSummary) {
        self.actual.add(&other.actual);
        self.score_sum += other.score_sum;
        self.scored_count += other.scored_count;
        self.employee_count += other.employee_count;
        self.direct_count += other.direct_count;
        self.holds_roots |= other.holds_roots;
        self.status = self.status.max(other.status);
    }

    fn is_no_prior_owner(&self) -> bool {
        self.owner_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub calibrator_id: Uuid,
    pub phase: CalibratorPhase,
    pub buckets: Vec<CalibratorBusinessUnitSummary>,
    pub grand_totals: QuotaBreakdown,
    pub grand_guidance: QuotaBreakdown,
    pub overall_average: f64,
}

type BucketKey = (String, String);

/// State of one summarize call, threaded by value through the fold.
#[derive(Debug)]
struct SummaryAccumulator {
    calibrator_id: Uuid,
    phase_order: i32,
    buckets: BTreeMap<BucketKey, CalibratorBusinessUnitSummary>,
    established: EstablishedOwners,
    excluded: usize,
}

impl SummaryAccumulator {
    fn new(calibrator_id: Uuid, phase_order: i32) -> Self {
        SummaryAccumulator {
            calibrator_id,
            phase_order,
            buckets: BTreeMap::new(),
            established: EstablishedOwners::new(),
            excluded: 0,
        }
    }

    fn fold(mut self, employee: &Employee) -> Self {
        let Some(last) = employee.last_record() else {
            return self;
        };
        let resolution =
            resolve_owner(employee, self.calibrator_id, self.phase_order, &self.established);
        let Some(Resolution {
            owner,
            direct,
            establishes_owner,
        }) = resolution
        else {
            debug!("Employee {} is out of scope", employee.id);
            self.excluded += 1;
            return self;
        };

        if establishes_owner {
            if let Owner::Named(o) = &owner {
                self.established
                    .entry(o.name.clone())
                    .or_insert_with(|| o.clone());
            }
        }

        let root = direct && employee.preceding(self.phase_order).is_none();
        let key = (
            employee.business_unit.name.clone(),
            owner.name().to_string(),
        );
        self.buckets
            .entry(key)
            .or_insert_with(|| CalibratorBusinessUnitSummary::new(&owner, employee))
            .add(employee, last, direct, root);
        self
    }

    /// Merges each business unit's "no prior owner" bucket into the
    /// calibrator's own bucket for that unit, when both exist.
    fn finish(self) -> Vec<CalibratorBusinessUnitSummary> {
        let calibrator_id = self.calibrator_id;
        let (roots, mut named): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .buckets
            .into_iter()
            .partition(|(_, b)| b.is_no_prior_owner());

        for ((bu_name, root_key), root) in roots {
            let own = named
                .iter_mut()
                .find(|((bu, _), b)| *bu == bu_name && b.owner_id == Some(calibrator_id));
            match own {
                Some((_, bucket)) => bucket.absorb(root),
                None => {
                    named.insert((bu_name, root_key), root);
                }
            }
        }

        named.into_values().collect()
    }
}

/// Guidance headcount for one bucket.
///
/// Named owners count the `default` cohort with the owner as reference, the
/// sentinel counts `n-1`. A named bucket that took in root employees (the
/// calibrator's own bucket) counts the `n-1` cohort on top.
async fn guidance_headcount(
    store: &dyn CalibrationStore,
    bucket: &CalibratorBusinessUnitSummary,
    calibrator_id: Uuid,
    phase: CalibratorPhase,
) -> Result<usize, AppError> {
    let query_for = |strategy: CohortStrategy| CohortQuery {
        calibrator_id,
        reference_calibrator_id: bucket.owner_id,
        business_unit_id: bucket.business_unit_id,
        strategy,
    };
    if bucket.is_no_prior_owner() {
        let roots = store
            .get_cohort(&query_for(CohortStrategy::NoPriorOwner), phase)
            .await?;
        return Ok(roots.len());
    }
    let mut headcount = store
        .get_cohort(&query_for(CohortStrategy::Default), phase)
        .await?
        .len();
    if bucket.holds_roots {
        headcount += store
            .get_cohort(&query_for(CohortStrategy::NoPriorOwner), phase)
            .await?
            .len();
    }
    Ok(headcount)
}

fn average(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Summarizes the calibrator's whole scope. Any store failure aborts the call.
pub async fn summarize(
    store: &dyn CalibrationStore,
    calibrator_id: Uuid,
) -> Result<SummaryResult, AppError> {
    let phase = store.get_calibrator_phase(calibrator_id).await?;
    let employees = store.get_employees_in_scope(calibrator_id, phase).await?;

    let acc = employees.iter().fold(
        SummaryAccumulator::new(calibrator_id, phase.phase_order),
        SummaryAccumulator::fold,
    );
    let excluded = acc.excluded;
    let mut buckets = acc.finish();

    info!(
        "Summarizing calibrator {calibrator_id} at phase {}: {} employees scanned, {excluded} out of scope, {} buckets",
        phase.phase_order,
        employees.len(),
        buckets.len()
    );

    let mut grand_totals = QuotaBreakdown::default();
    let mut grand_guidance = QuotaBreakdown::default();
    let mut total_score = 0.0;
    let mut total_scored = 0u32;

    for bucket in &mut buckets {
        let headcount = guidance_headcount(store, bucket, calibrator_id, phase).await?;
        let config = store
            .get_quota_config(phase.project_id, bucket.business_unit_id)
            .await?;
        bucket.guidance = allocate(&config, headcount);
        bucket.average_score = average(bucket.score_sum, bucket.scored_count);

        grand_totals.counts.add(&bucket.actual);
        grand_totals.total += i64::from(bucket.employee_count);
        grand_guidance.counts.add(&bucket.guidance.counts);
        grand_guidance.total += bucket.guidance.total;
        total_score += bucket.score_sum;
        total_scored += bucket.scored_count;
    }

    Ok(SummaryResult {
        calibrator_id,
        phase,
        buckets,
        grand_totals,
        grand_guidance,
        overall_average: average(total_score, total_scored),
    })
}
