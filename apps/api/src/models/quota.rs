use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::calibration::RatingBand;

/// Percentage quota per band for one (project, business unit).
///
/// Percentages are not required to sum to 100. `remaining` absorbs a rounding
/// deficit, `excess` absorbs a rounding surplus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingQuotaConfig {
    pub project_id: Uuid,
    pub business_unit_id: Uuid,
    pub a_plus: f64,
    pub a: f64,
    pub b_plus: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub remaining: RatingBand,
    pub excess: RatingBand,
}

impl RatingQuotaConfig {
    pub fn percentage(&self, band: RatingBand) -> f64 {
        match band {
            RatingBand::APlus => self.a_plus,
            RatingBand::A => self.a,
            RatingBand::BPlus => self.b_plus,
            RatingBand::B => self.b,
            RatingBand::C => self.c,
            RatingBand::D => self.d,
        }
    }
}

/// Per-band headcounts. Signed: the surplus fallback may drive `B+` below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCounts {
    pub a_plus: i64,
    pub a: i64,
    pub b_plus: i64,
    pub b: i64,
    pub c: i64,
    pub d: i64,
}

impl BandCounts {
    pub fn get(&self, band: RatingBand) -> i64 {
        match band {
            RatingBand::APlus => self.a_plus,
            RatingBand::A => self.a,
            RatingBand::BPlus => self.b_plus,
            RatingBand::B => self.b,
            RatingBand::C => self.c,
            RatingBand::D => self.d,
        }
    }

    pub fn get_mut(&mut self, band: RatingBand) -> &mut i64 {
        match band {
            RatingBand::APlus => &mut self.a_plus,
            RatingBand::A => &mut self.a,
            RatingBand::BPlus => &mut self.b_plus,
            RatingBand::B => &mut self.b,
            RatingBand::C => &mut self.c,
            RatingBand::D => &mut self.d,
        }
    }

    pub fn increment(&mut self, band: RatingBand) {
        *self.get_mut(band) += 1;
    }

    pub fn sum(&self) -> i64 {
        RatingBand::ALL.iter().map(|b| self.get(*b)).sum()
    }

    pub fn add(&mut self, other: &BandCounts) {
        for band in RatingBand::ALL {
            *self.get_mut(band) += other.get(band);
        }
    }
}

/// Band counts together with the headcount they were computed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaBreakdown {
    #[serde(flatten)]
    pub counts: BandCounts,
    pub total: i64,
}
