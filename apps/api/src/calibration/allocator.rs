//! Quota Allocator: percentage quotas to integer per-band targets.
//!
//! 1. `raw = pct * cohort / 100`, rounded half away from zero (`f64::round`).
//! 2. A deficit goes entirely to the `remaining` band.
//! 3. A surplus comes entirely out of the `excess` band. When `excess` is
//!    `A+` or `A` and would go negative, the surplus comes out of `B+`
//!    instead, with no negativity check there. That fallback is pinned by
//!    tests and awaiting product confirmation.

use tracing::debug;

use crate::models::calibration::RatingBand;
use crate::models::quota::{BandCounts, QuotaBreakdown, RatingQuotaConfig};

pub fn allocate(config: &RatingQuotaConfig, cohort_size: usize) -> QuotaBreakdown {
    let target = cohort_size as i64;
    let mut counts = BandCounts::default();
    for band in RatingBand::ALL {
        let raw = config.percentage(band) * cohort_size as f64 / 100.0;
        *counts.get_mut(band) = raw.round() as i64;
    }

    let total = counts.sum();
    if total < target {
        *counts.get_mut(config.remaining) += target - total;
    } else if total > target {
        let surplus = total - target;
        let excess = counts.get(config.excess);
        let falls_back = matches!(config.excess, RatingBand::APlus | RatingBand::A);
        if falls_back && excess - surplus < 0 {
            debug!(
                "Excess band {} cannot absorb surplus {surplus}; taking it from B+",
                config.excess
            );
            counts.b_plus -= surplus;
        } else {
            *counts.get_mut(config.excess) -= surplus;
        }
    }

    QuotaBreakdown {
        counts,
        total: target,
    }
}
