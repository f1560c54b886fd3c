//! # Labor Rate Engine
//!
//! Computes a labor-rate pricing matrix. A base hourly rate is scaled per 0.1-hour
//! cell past the first hour, under one of four scaling policies, and optionally
//! capped by an hour threshold or a maximum effective rate.
//!
//! The engine is pure: every call receives its configuration by reference and no
//! state is kept between calls. Stores, matrices and chart bounds are built on top.

pub mod cap;
pub mod config;
pub mod curve;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod store;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod integration_tests;

pub use cap::{resolve_peak_hours, ResolvedCap};
pub use config::{
    CapType, EngineSettings, FieldValue, PricingConfig, RawPricingConfig, ScalingMode,
    ScalingModeKind, StoreSettings, ValidationPolicy,
};
pub use curve::{
    generate_curve, AxisBounds, ChartMetric, ChartPoint, ChartSeries, CurveDomain, CurveSample,
    CurveSamples,
};
pub use engine::{Evaluation, PricingEngine};
pub use error::{ConfigurationError, PricingError, Result};
pub use matrix::{format_money, money, MatrixCell, MatrixRow, MatrixView, RateMatrix};
pub use store::{StoreBook, StoreEntry, StoreQuote};

/// Current version of the engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cells per whole hour
pub const CELLS_PER_HOUR: u32 = 10;

/// Base rate used when a permissive configuration omits it entirely
pub const DEFAULT_FALLBACK_BASE_RATE: f64 = 150.0;

/// Last whole hour shown in the matrix
pub const DEFAULT_MAX_HOUR: u32 = 20;

/// Largest `max_hour` accepted from settings
pub const MAX_MATRIX_HOUR: u32 = 1000;

/// Padding applied to chart axis bounds, in percent
pub const DEFAULT_CHART_PADDING_PERCENT: f64 = 10.0;

/// Round a money value to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
