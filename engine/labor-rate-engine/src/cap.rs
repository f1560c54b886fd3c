//! Cap resolution
//!
//! Every capped mode consumes a single peak expressed in hours. A rate ceiling
//! (`CapType::Elr`) is translated into the hour at which the uncapped curve would
//! first reach it, so the mode branches never look at the cap type.

use crate::config::{CapType, PricingConfig, ScalingMode};
use crate::CELLS_PER_HOUR;
use tracing::trace;

/// Peak of the scaling curve after applying the cap type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCap {
    /// Hour at which scaling stops increasing; `f64::INFINITY` when uncapped
    pub peak_hours: f64,
}

impl ResolvedCap {
    pub const UNCAPPED: ResolvedCap = ResolvedCap { peak_hours: f64::INFINITY };

    pub fn is_capped(&self) -> bool {
        self.peak_hours.is_finite()
    }

    /// Cell index of the peak, `round(peak * 10)`
    pub fn peak_cell(&self) -> Option<i64> {
        self.is_capped()
            .then(|| (self.peak_hours * CELLS_PER_HOUR as f64).round() as i64)
    }

    /// Peak in cells past the first hour, never negative
    pub fn peak_cells_past_one(&self) -> Option<i64> {
        self.peak_cell()
            .map(|cell| (cell - CELLS_PER_HOUR as i64).max(0))
    }
}

/// Fraction of the base rate added per 0.1-hour cell.
pub fn step_per_cell(config: &PricingConfig) -> f64 {
    config.percent_increase_per_hour / 1000.0
}

/// Resolve the effective peak for a configuration.
pub fn resolve_peak_hours(config: &PricingConfig) -> ResolvedCap {
    let resolved = match (config.mode, config.cap_type) {
        (ScalingMode::Infinity, _) => ResolvedCap::UNCAPPED,
        (_, CapType::Hours) => match config.peak_hours {
            Some(peak) if peak.is_finite() => ResolvedCap { peak_hours: peak },
            _ => ResolvedCap::UNCAPPED,
        },
        (_, CapType::Elr) => match config.max_effective_rate {
            Some(max_rate) => peak_for_rate_ceiling(config.base_rate, step_per_cell(config), max_rate),
            None => ResolvedCap::UNCAPPED,
        },
    };
    trace!(peak_hours = resolved.peak_hours, "cap resolved");
    resolved
}

/// Inverse of the uncapped curve `factor = 1 + step * cells`.
///
/// The peak snaps down to the last whole cell whose rate stays within the
/// ceiling, so the ceiling holds on every discretized duration.
fn peak_for_rate_ceiling(base_rate: f64, step: f64, max_rate: f64) -> ResolvedCap {
    if !(base_rate > 0.0 && step > 0.0) {
        return ResolvedCap::UNCAPPED;
    }
    let target = max_rate / base_rate;
    if !(target > 1.0 && target.is_finite()) {
        return ResolvedCap::UNCAPPED;
    }

    // Tolerance keeps exact ceilings such as 153.00 from losing a cell to rounding.
    let cells = ((target - 1.0) / step + 1e-9).floor();
    ResolvedCap {
        peak_hours: 1.0 + cells / CELLS_PER_HOUR as f64,
    }
}
