//! Curve sampling and chart view models

use crate::config::PricingConfig;
use crate::engine::evaluate_hours;
use crate::{round2, CELLS_PER_HOUR, DEFAULT_MAX_HOUR};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Inclusive range of 0.1-hour cells to sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveDomain {
    pub first_cell: u32,
    pub last_cell: u32,
}

impl CurveDomain {
    /// Every cell of a matrix with rows `0..=max_hour`, i.e. 0.0 to `max_hour`.9
    ///
    /// Saturates at `u32::MAX` cells.
    pub fn matrix(max_hour: u32) -> Self {
        Self {
            first_cell: 0,
            last_cell: max_hour
                .saturating_mul(CELLS_PER_HOUR)
                .saturating_add(CELLS_PER_HOUR - 1),
        }
    }

    /// Chart domain: same as the matrix, starting at 1.0 hours
    pub fn chart(max_hour: u32) -> Self {
        Self {
            first_cell: CELLS_PER_HOUR,
            ..Self::matrix(max_hour)
        }
    }

    pub fn cells(&self) -> RangeInclusive<u32> {
        self.first_cell..=self.last_cell
    }

    pub fn len(&self) -> usize {
        self.cells().count()
    }

    pub fn is_empty(&self) -> bool {
        self.first_cell > self.last_cell
    }
}

impl Default for CurveDomain {
    fn default() -> Self {
        Self::matrix(DEFAULT_MAX_HOUR)
    }
}

/// One point of the pricing curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveSample {
    pub hours: f64,
    pub effective_rate: f64,
    pub total_amount: f64,
}

/// Lazy sample sequence; clone it to restart from the first cell
#[derive(Debug, Clone)]
pub struct CurveSamples<'a> {
    config: &'a PricingConfig,
    cells: RangeInclusive<u32>,
}

impl Iterator for CurveSamples<'_> {
    type Item = CurveSample;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cells.next()?;
        Some(sample_at(self.config, cell))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

impl DoubleEndedIterator for CurveSamples<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let cell = self.cells.next_back()?;
        Some(sample_at(self.config, cell))
    }
}

impl ExactSizeIterator for CurveSamples<'_> {}

fn sample_at(config: &PricingConfig, cell: u32) -> CurveSample {
    let hours = cell as f64 / CELLS_PER_HOUR as f64;
    let eval = evaluate_hours(hours, config);
    CurveSample {
        hours,
        effective_rate: eval.effective_rate,
        total_amount: eval.total_amount,
    }
}

/// Sample `config` over every cell of `domain`.
pub fn generate_curve(config: &PricingConfig, domain: CurveDomain) -> CurveSamples<'_> {
    CurveSamples { config, cells: domain.cells() }
}

/// Which value a chart plots on its Y axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartMetric {
    /// Effective labor rate per hour
    #[default]
    Elr,
    /// Billed amount
    TotalAmount,
}

/// A chart point compared against billing at the flat base rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub hours: f64,
    /// `total / hours`, rounded to cents
    pub elr: f64,
    pub total_amount: f64,
    /// `hours * base_rate`
    pub standard_amount: f64,
}

impl ChartPoint {
    /// Difference between the plotted value and its flat-rate counterpart.
    pub fn premium(&self, metric: ChartMetric, base_rate: f64) -> f64 {
        match metric {
            ChartMetric::Elr => self.elr - base_rate,
            ChartMetric::TotalAmount => self.total_amount - self.standard_amount,
        }
    }

    pub fn value(&self, metric: ChartMetric) -> f64 {
        match metric {
            ChartMetric::Elr => self.elr,
            ChartMetric::TotalAmount => self.total_amount,
        }
    }
}

/// Points for the line chart, ordered by hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub base_rate: f64,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Build the series over `domain`, skipping durations under one hour.
    pub fn build(config: &PricingConfig, domain: CurveDomain) -> Self {
        let points = generate_curve(config, domain)
            .filter(|sample| sample.hours >= 1.0)
            .map(|sample| ChartPoint {
                hours: sample.hours,
                elr: round2(sample.total_amount / sample.hours),
                total_amount: sample.total_amount,
                standard_amount: sample.hours * config.base_rate,
            })
            .collect();
        Self { base_rate: config.base_rate, points }
    }

    /// Axis bounds padded by `padding_percent`.
    pub fn bounds(&self, metric: ChartMetric, padding_percent: f64) -> Option<AxisBounds> {
        AxisBounds::for_metric(self, metric, padding_percent)
    }
}

/// Y-axis range for a chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    /// Range covering the plotted series and its flat-rate reference line.
    ///
    /// The lower bound is floored and the upper bound ceiled after padding; an
    /// ELR axis never goes below zero. Returns `None` for an empty series.
    pub fn for_metric(series: &ChartSeries, metric: ChartMetric, padding_percent: f64) -> Option<Self> {
        let first = series.points.first()?;
        let last = series.points.last()?;
        let padding = padding_percent / 100.0;

        let (lowest, highest) = series.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), point| {
                let value = point.value(metric);
                (lo.min(value), hi.max(value))
            },
        );

        let bounds = match metric {
            ChartMetric::Elr => {
                let lo = lowest.min(series.base_rate);
                let hi = highest.max(series.base_rate);
                AxisBounds {
                    min: (lo * (1.0 - padding)).floor().max(0.0),
                    max: (hi * (1.0 + padding)).ceil(),
                }
            }
            ChartMetric::TotalAmount => {
                let lo = lowest.min(first.standard_amount);
                let hi = highest.max(last.standard_amount);
                AxisBounds {
                    min: (lo * (1.0 - padding)).floor(),
                    max: (hi * (1.0 + padding)).ceil(),
                }
            }
        };
        Some(bounds)
    }
}
