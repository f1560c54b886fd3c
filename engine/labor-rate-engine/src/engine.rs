use crate::cap::{resolve_peak_hours, step_per_cell, ResolvedCap};
use crate::config::{PricingConfig, ScalingMode};
use crate::curve::{generate_curve, CurveDomain, CurveSamples};
use crate::error::{PricingError, Result};
use crate::{round2, CELLS_PER_HOUR};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Result of pricing one duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub hours: f64,
    /// Multiplier applied to the base rate
    pub scaling_factor: f64,
    /// `base_rate * scaling_factor`
    pub effective_rate: f64,
    /// Billed amount, rounded to cents
    pub total_amount: f64,
}

impl Evaluation {
    /// Realized hourly rate, `total_amount / hours`; undefined at zero hours
    pub fn elr(&self) -> Option<f64> {
        (self.hours > 0.0).then(|| self.total_amount / self.hours)
    }
}

/// Stateless pricing engine
///
/// Holds nothing between calls: the configuration snapshot is passed to every
/// evaluation, so calls for different stores may run on any thread at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    /// Price `total_hours` under `config`.
    pub fn evaluate(total_hours: f64, config: &PricingConfig) -> Result<Evaluation> {
        check_hours(total_hours)?;
        Ok(evaluate_hours(total_hours, config))
    }

    /// Sample the pricing curve across `domain`, one evaluation per 0.1-hour step.
    pub fn generate_curve(config: &PricingConfig, domain: CurveDomain) -> CurveSamples<'_> {
        generate_curve(config, domain)
    }
}

/// Durations must be finite and non-negative.
pub(crate) fn check_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(PricingError::DegenerateInput { hours });
    }
    Ok(())
}

/// Cell index `round(hours * 10)`
pub(crate) fn cell_index(hours: f64) -> i64 {
    (hours * CELLS_PER_HOUR as f64).round() as i64
}

/// `1 + step * cells`; linear, not compounding
fn scaling_factor(step: f64, cells: i64) -> f64 {
    1.0 + step * cells.max(0) as f64
}

/// Evaluation for a duration already known to be finite and non-negative.
pub(crate) fn evaluate_hours(total_hours: f64, config: &PricingConfig) -> Evaluation {
    let base_rate = config.base_rate;
    if total_hours <= 0.0 {
        return Evaluation {
            hours: 0.0,
            scaling_factor: 1.0,
            effective_rate: base_rate,
            total_amount: 0.0,
        };
    }

    let cap = resolve_peak_hours(config);
    let step = step_per_cell(config);
    let cell = cell_index(total_hours);
    let cells_past_one = (cell - CELLS_PER_HOUR as i64).max(0);

    let (factor, total_amount) = match config.mode {
        ScalingMode::Infinity => uncapped(step, cells_past_one, base_rate, total_hours),
        ScalingMode::HoursCap => hours_cap(step, cells_past_one, base_rate, total_hours, cap),
        ScalingMode::Mirror => {
            let factor = mirror_factor(step, cell, cells_past_one, total_hours, cap);
            (factor, round2(base_rate * factor * total_hours))
        }
        ScalingMode::Proportional { end_hours } => {
            match end_hours.filter(|end| cap.is_capped() && *end > cap.peak_hours) {
                Some(end_hours) => {
                    let factor =
                        proportional_factor(step, cells_past_one, total_hours, cap, end_hours);
                    (factor, round2(base_rate * factor * total_hours))
                }
                None => hours_cap(step, cells_past_one, base_rate, total_hours, cap),
            }
        }
    };

    let evaluation = Evaluation {
        hours: total_hours,
        scaling_factor: factor,
        effective_rate: base_rate * factor,
        total_amount,
    };
    trace!(?config.mode, hours = total_hours, factor, total = total_amount, "evaluated");
    evaluation
}

fn uncapped(step: f64, cells_past_one: i64, base_rate: f64, hours: f64) -> (f64, f64) {
    let factor = scaling_factor(step, cells_past_one);
    (factor, round2(base_rate * factor * hours))
}

/// Rate plateaus at the peak; past it the amount keeps accruing at the peak rate.
fn hours_cap(
    step: f64,
    cells_past_one: i64,
    base_rate: f64,
    hours: f64,
    cap: ResolvedCap,
) -> (f64, f64) {
    let Some(peak_cells) = cap.peak_cells_past_one() else {
        return uncapped(step, cells_past_one, base_rate, hours);
    };

    let factor = scaling_factor(step, cells_past_one.min(peak_cells));
    if hours > cap.peak_hours {
        let peak_amount = base_rate * factor * cap.peak_hours;
        let total = peak_amount + (hours - cap.peak_hours) * base_rate * factor;
        (factor, round2(total))
    } else {
        (factor, round2(base_rate * factor * hours))
    }
}

/// Tent: rises to the peak, then walks back down one cell per cell past it.
fn mirror_factor(step: f64, cell: i64, cells_past_one: i64, hours: f64, cap: ResolvedCap) -> f64 {
    let (Some(peak_cell), Some(peak_cells)) = (cap.peak_cell(), cap.peak_cells_past_one()) else {
        return scaling_factor(step, cells_past_one);
    };

    if hours <= cap.peak_hours {
        return scaling_factor(step, cells_past_one.min(peak_cells));
    }
    let cells_past_peak = cell - peak_cell;
    let mirrored = (peak_cells - cells_past_peak).max(0);
    scaling_factor(step, mirrored)
}

/// Rises to the peak, then decays linearly to 1 at `end_hours`.
fn proportional_factor(
    step: f64,
    cells_past_one: i64,
    hours: f64,
    cap: ResolvedCap,
    end_hours: f64,
) -> f64 {
    let peak_cells = cap.peak_cells_past_one().unwrap_or(0);
    if hours <= cap.peak_hours {
        return scaling_factor(step, cells_past_one.min(peak_cells));
    }
    if hours >= end_hours {
        return 1.0;
    }

    let peak_factor = scaling_factor(step, peak_cells);
    let decrease = (hours - cap.peak_hours) / (end_hours - cap.peak_hours);
    (peak_factor - (peak_factor - 1.0) * decrease).max(1.0)
}
