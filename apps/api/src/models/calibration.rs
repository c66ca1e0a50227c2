use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Forced-curve rating band, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RatingBand {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
}

impl RatingBand {
    pub const ALL: [RatingBand; 6] = [
        RatingBand::APlus,
        RatingBand::A,
        RatingBand::BPlus,
        RatingBand::B,
        RatingBand::C,
        RatingBand::D,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RatingBand::APlus => "A+",
            RatingBand::A => "A",
            RatingBand::BPlus => "B+",
            RatingBand::B => "B",
            RatingBand::C => "C",
            RatingBand::D => "D",
        }
    }
}

impl fmt::Display for RatingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingBand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatingBand::ALL
            .into_iter()
            .find(|band| band.as_str() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("unknown rating band '{s}'"))
    }
}

/// Lifecycle of a single calibration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationStatus {
    Waiting,
    Calibrate,
    Complete,
}

impl FromStr for CalibrationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Waiting" => Ok(CalibrationStatus::Waiting),
            "Calibrate" => Ok(CalibrationStatus::Calibrate),
            "Complete" => Ok(CalibrationStatus::Complete),
            other => Err(anyhow::anyhow!("unknown calibration status '{other}'")),
        }
    }
}

/// SPMO review state attached to a calibration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpmoStatus {
    #[serde(rename = "-")]
    Unset,
    Waiting,
    Approved,
    Rejected,
}

impl FromStr for SpmoStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "-" => Ok(SpmoStatus::Unset),
            "Waiting" => Ok(SpmoStatus::Waiting),
            "Approved" => Ok(SpmoStatus::Approved),
            "Rejected" => Ok(SpmoStatus::Rejected),
            other => Err(anyhow::anyhow!("unknown spmo status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMethod {
    Score,
    Rating,
}

impl ScoringMethod {
    /// Anything other than `Score` is not score-based.
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim() == "Score" {
            ScoringMethod::Score
        } else {
            ScoringMethod::Rating
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: Uuid,
    pub name: String,
    pub group_id: Option<Uuid>,
}

/// One calibrator's verdict on one employee at one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_phase_id: Uuid,
    pub phase_order: i32,
    pub calibrator_id: Uuid,
    pub calibrator_name: String,
    pub rating: RatingBand,
    pub score: f64,
    pub status: CalibrationStatus,
    pub spmo_status: SpmoStatus,
}

/// An employee with its calibration trail, sorted by phase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub business_unit: BusinessUnit,
    pub scoring_method: ScoringMethod,
    pub trail: Vec<CalibrationRecord>,
}

impl Employee {
    /// The record at exactly `phase_order`, if the employee has reached it.
    pub fn record_at(&self, phase_order: i32) -> Option<&CalibrationRecord> {
        self.trail.iter().find(|r| r.phase_order == phase_order)
    }

    /// The latest record strictly before `phase_order`.
    pub fn preceding(&self, phase_order: i32) -> Option<&CalibrationRecord> {
        self.trail
            .iter()
            .filter(|r| r.phase_order < phase_order)
            .max_by_key(|r| r.phase_order)
    }

    pub fn last_record(&self) -> Option<&CalibrationRecord> {
        self.trail.last()
    }

    pub fn is_score_based(&self) -> bool {
        self.scoring_method == ScoringMethod::Score
    }
}
