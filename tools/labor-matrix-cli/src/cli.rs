//! # Command Line Interface
//!
//! Argument definitions for the `labor-matrix` binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use labor_rate_engine::{CapType, ChartMetric, FieldValue, MatrixView, RawPricingConfig, ScalingModeKind};
use std::path::PathBuf;

/// Labor rate matrix calculator
#[derive(Parser, Debug)]
#[command(name = "labor-matrix")]
#[command(about = "Price labor durations and print rate matrices, charts and store quotes")]
#[command(version)]
pub struct Cli {
    /// TOML settings file with engine settings and stores
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Store to price; defaults to the first store in the settings
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Default invalid fields to 0 instead of rejecting them
    #[arg(long, global = true)]
    pub permissive: bool,

    #[command(flatten)]
    pub pricing: PricingArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Inline pricing fields, applied over the selected store's input
///
/// Values are kept as typed so the validation policy decides what is invalid.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct PricingArgs {
    /// Hourly rate at one hour
    #[arg(long, global = true)]
    pub base_rate: Option<String>,

    /// Percent increase per hour past the first
    #[arg(long, global = true)]
    pub percent: Option<String>,

    #[arg(long, global = true, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, global = true, value_enum)]
    pub cap_type: Option<CapTypeArg>,

    /// Hour at which scaling stops increasing
    #[arg(long, global = true)]
    pub peak_hours: Option<String>,

    /// Effective rate ceiling
    #[arg(long, global = true)]
    pub max_rate: Option<String>,

    /// Hour at which a proportional rate is back at the base rate
    #[arg(long, global = true)]
    pub end_hours: Option<String>,
}

impl PricingArgs {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay the given fields on `raw`.
    pub fn apply(&self, mut raw: RawPricingConfig) -> RawPricingConfig {
        let text = |value: &Option<String>| value.as_deref().map(FieldValue::from);

        if self.base_rate.is_some() {
            raw.base_rate = text(&self.base_rate);
        }
        if self.percent.is_some() {
            raw.percent_increase_per_hour = text(&self.percent);
        }
        if self.peak_hours.is_some() {
            raw.peak_hours = text(&self.peak_hours);
        }
        if self.max_rate.is_some() {
            raw.max_effective_rate = text(&self.max_rate);
        }
        if self.end_hours.is_some() {
            raw.end_hours = text(&self.end_hours);
        }
        if let Some(mode) = self.mode {
            raw.mode = mode.into();
        }
        if let Some(cap_type) = self.cap_type {
            raw.cap_type = cap_type.into();
        }
        raw
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Price a single duration
    Quote {
        /// Duration in hours
        #[arg(long)]
        hours: f64,
    },

    /// Print the rate matrix
    Grid {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Show billed amounts or effective rates
        #[arg(long, value_enum, default_value_t = ViewArg::Amount)]
        view: ViewArg,
    },

    /// Print the chart series from one hour on
    Curve {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print padded Y-axis bounds for the chart
    Bounds {
        #[arg(long, value_enum, default_value_t = MetricArg::Elr)]
        metric: MetricArg,
    },

    /// List stores with their lock state
    Stores {
        /// Also quote every store for this duration
        #[arg(long)]
        hours: Option<f64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Amount,
    Elr,
}

impl From<ViewArg> for MatrixView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Amount => MatrixView::Amount,
            ViewArg::Elr => MatrixView::Elr,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricArg {
    Elr,
    Amount,
}

impl From<MetricArg> for ChartMetric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Elr => ChartMetric::Elr,
            MetricArg::Amount => ChartMetric::TotalAmount,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Infinity,
    #[value(alias = "hoursCap")]
    HoursCap,
    Mirror,
    Proportional,
}

impl From<ModeArg> for ScalingModeKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Infinity => ScalingModeKind::Infinity,
            ModeArg::HoursCap => ScalingModeKind::HoursCap,
            ModeArg::Mirror => ScalingModeKind::Mirror,
            ModeArg::Proportional => ScalingModeKind::Proportional,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapTypeArg {
    Hours,
    Elr,
}

impl From<CapTypeArg> for CapType {
    fn from(cap_type: CapTypeArg) -> Self {
        match cap_type {
            CapTypeArg::Hours => CapType::Hours,
            CapTypeArg::Elr => CapType::Elr,
        }
    }
}
