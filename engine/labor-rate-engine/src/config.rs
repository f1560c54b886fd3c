//! Pricing configuration and engine settings

use crate::cap::resolve_peak_hours;
use crate::error::{ConfigurationError, PricingError, Result};
use crate::{
    DEFAULT_CHART_PADDING_PERCENT, DEFAULT_FALLBACK_BASE_RATE, DEFAULT_MAX_HOUR, MAX_MATRIX_HOUR,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Scaling policy applied past the first hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalingMode {
    /// Rate grows forever with duration
    Infinity,
    /// Rate stops growing at the peak, amount keeps accruing at the peak rate
    HoursCap,
    /// Rate rises to the peak, then falls back symmetrically to the base rate
    Mirror,
    /// Rate rises to the peak, then decays linearly to the base rate at `end_hours`
    Proportional { end_hours: Option<f64> },
}

impl ScalingMode {
    pub fn kind(&self) -> ScalingModeKind {
        match self {
            ScalingMode::Infinity => ScalingModeKind::Infinity,
            ScalingMode::HoursCap => ScalingModeKind::HoursCap,
            ScalingMode::Mirror => ScalingModeKind::Mirror,
            ScalingMode::Proportional { .. } => ScalingModeKind::Proportional,
        }
    }
}

/// Mode selector as it appears in edit forms and settings files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalingModeKind {
    #[default]
    Infinity,
    HoursCap,
    Mirror,
    Proportional,
}

/// How the cap bound is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapType {
    /// Cap at a given hour
    #[default]
    Hours,
    /// Cap at a maximum effective labor rate
    Elr,
}

/// How raw input that is missing or invalid is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Reject missing required fields and out-of-range values
    #[default]
    Strict,
    /// Default invalid fields to 0 and a missing base rate to the fallback
    Permissive,
}

/// A numeric field as typed into a form: a number, or text that may not parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

enum Parsed {
    Empty,
    Value(f64),
    Invalid(String),
}

impl FieldValue {
    fn parse(&self) -> Parsed {
        match self {
            FieldValue::Number(value) if value.is_finite() => Parsed::Value(*value),
            FieldValue::Number(value) => Parsed::Invalid(value.to_string()),
            FieldValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Parsed::Empty;
                }
                match trimmed.parse::<f64>() {
                    Ok(value) if value.is_finite() => Parsed::Value(value),
                    _ => Parsed::Invalid(text.clone()),
                }
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Unvalidated pricing configuration, one per store edit form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPricingConfig {
    pub base_rate: Option<FieldValue>,
    pub percent_increase_per_hour: Option<FieldValue>,
    pub mode: ScalingModeKind,
    pub cap_type: CapType,
    pub peak_hours: Option<FieldValue>,
    pub max_effective_rate: Option<FieldValue>,
    pub end_hours: Option<FieldValue>,
}

/// Validated pricing configuration handed to every evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Hourly rate at duration 1.0
    pub base_rate: f64,
    /// Percentage increase per 0.1-hour cell past the first hour
    pub percent_increase_per_hour: f64,
    pub mode: ScalingMode,
    /// Ignored when mode is `Infinity`
    pub cap_type: CapType,
    pub peak_hours: Option<f64>,
    pub max_effective_rate: Option<f64>,
}

impl PricingConfig {
    /// Unbounded scaling with no cap.
    pub fn infinity(base_rate: f64, percent_increase_per_hour: f64) -> Self {
        Self {
            base_rate,
            percent_increase_per_hour,
            mode: ScalingMode::Infinity,
            cap_type: CapType::Hours,
            peak_hours: None,
            max_effective_rate: None,
        }
    }

    /// Same rates with a different policy capped at `peak_hours`.
    pub fn capped_at_hours(mut self, mode: ScalingMode, peak_hours: f64) -> Self {
        self.mode = mode;
        self.cap_type = CapType::Hours;
        self.peak_hours = Some(peak_hours);
        self
    }

    /// Same rates with a different policy capped at `max_effective_rate`.
    pub fn capped_at_rate(mut self, mode: ScalingMode, max_effective_rate: f64) -> Self {
        self.mode = mode;
        self.cap_type = CapType::Elr;
        self.max_effective_rate = Some(max_effective_rate);
        self
    }

    pub fn end_hours(&self) -> Option<f64> {
        match self.mode {
            ScalingMode::Proportional { end_hours } => end_hours,
            _ => None,
        }
    }

    /// Build a configuration from form input under the given policy.
    pub fn from_raw(
        raw: &RawPricingConfig,
        policy: ValidationPolicy,
        fallback_base_rate: f64,
    ) -> std::result::Result<Self, ConfigurationError> {
        let base_rate = match policy {
            ValidationPolicy::Strict => required_field("baseRate", raw.base_rate.as_ref())?,
            ValidationPolicy::Permissive => match raw.base_rate.as_ref() {
                None => {
                    warn!(fallback_base_rate, "baseRate absent, using fallback");
                    fallback_base_rate
                }
                Some(value) => permissive_field("baseRate", Some(value)).unwrap_or(0.0),
            },
        };

        let percent_increase_per_hour = match policy {
            ValidationPolicy::Strict => {
                optional_field("percentIncreasePerHour", raw.percent_increase_per_hour.as_ref())?
                    .unwrap_or(0.0)
            }
            ValidationPolicy::Permissive => {
                permissive_field("percentIncreasePerHour", raw.percent_increase_per_hour.as_ref())
                    .unwrap_or(0.0)
            }
        };

        let (peak_hours, max_effective_rate, end_hours) = match policy {
            ValidationPolicy::Strict => (
                optional_field("peakHours", raw.peak_hours.as_ref())?,
                optional_field("maxEffectiveRate", raw.max_effective_rate.as_ref())?,
                optional_field("endHours", raw.end_hours.as_ref())?,
            ),
            // A zero bound means "unset" in the permissive reading.
            ValidationPolicy::Permissive => (
                permissive_field("peakHours", raw.peak_hours.as_ref()).filter(|v| *v > 0.0),
                permissive_field("maxEffectiveRate", raw.max_effective_rate.as_ref())
                    .filter(|v| *v > 0.0),
                permissive_field("endHours", raw.end_hours.as_ref()).filter(|v| *v > 0.0),
            ),
        };

        let mode = match raw.mode {
            ScalingModeKind::Infinity => ScalingMode::Infinity,
            ScalingModeKind::HoursCap => ScalingMode::HoursCap,
            ScalingModeKind::Mirror => ScalingMode::Mirror,
            ScalingModeKind::Proportional => ScalingMode::Proportional { end_hours },
        };

        let config = Self {
            base_rate,
            percent_increase_per_hour,
            mode,
            cap_type: raw.cap_type,
            peak_hours,
            max_effective_rate,
        };

        if policy == ValidationPolicy::Strict {
            config.validate()?;
        }
        debug!(?config, ?policy, "pricing configuration resolved");
        Ok(config)
    }

    /// Check that every field required by the mode and cap type is present and in range.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        non_negative("baseRate", self.base_rate)?;
        non_negative("percentIncreasePerHour", self.percent_increase_per_hour)?;

        if self.mode == ScalingMode::Infinity {
            return Ok(());
        }

        match self.cap_type {
            CapType::Hours => {
                let peak = self
                    .peak_hours
                    .ok_or(ConfigurationError::MissingField { field: "peakHours" })?;
                if !(peak.is_finite() && peak > 1.0) {
                    return Err(ConfigurationError::OutOfRange {
                        field: "peakHours",
                        expected: "greater than 1",
                        value: peak,
                    });
                }
            }
            CapType::Elr => {
                let max_rate = self
                    .max_effective_rate
                    .ok_or(ConfigurationError::MissingField { field: "maxEffectiveRate" })?;
                if !(max_rate.is_finite() && max_rate > self.base_rate) {
                    return Err(ConfigurationError::CeilingBelowBase {
                        max_rate,
                        base_rate: self.base_rate,
                    });
                }
            }
        }

        if let ScalingMode::Proportional { end_hours } = self.mode {
            let end_hours =
                end_hours.ok_or(ConfigurationError::MissingField { field: "endHours" })?;
            let peak_hours = resolve_peak_hours(self).peak_hours;
            if peak_hours.is_finite() && !(end_hours > peak_hours) {
                return Err(ConfigurationError::EndBeforePeak { end_hours, peak_hours });
            }
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> std::result::Result<f64, ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::OutOfRange { field, expected: "a non-negative number", value })
    }
}

fn optional_field(
    field: &'static str,
    value: Option<&FieldValue>,
) -> std::result::Result<Option<f64>, ConfigurationError> {
    match value.map(FieldValue::parse) {
        None | Some(Parsed::Empty) => Ok(None),
        Some(Parsed::Value(v)) => non_negative(field, v).map(Some),
        Some(Parsed::Invalid(text)) => Err(ConfigurationError::NotNumeric { field, value: text }),
    }
}

fn required_field(
    field: &'static str,
    value: Option<&FieldValue>,
) -> std::result::Result<f64, ConfigurationError> {
    optional_field(field, value)?.ok_or(ConfigurationError::MissingField { field })
}

fn permissive_field(field: &'static str, value: Option<&FieldValue>) -> Option<f64> {
    match value.map(FieldValue::parse) {
        None => None,
        Some(Parsed::Empty) => Some(0.0),
        Some(Parsed::Value(v)) if v >= 0.0 => Some(v),
        Some(Parsed::Value(v)) => {
            warn!(field, value = v, "negative value treated as 0");
            Some(0.0)
        }
        Some(Parsed::Invalid(text)) => {
            warn!(field, value = %text, "non-numeric value treated as 0");
            Some(0.0)
        }
    }
}

/// A named store as declared in a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub name: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub pricing: RawPricingConfig,
}

/// Settings shared by the engine's collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How store edits are validated
    pub validation: ValidationPolicy,

    /// Base rate used by permissive validation when none is given
    pub fallback_base_rate: f64,

    /// Last whole hour of the matrix (rows run 0..=max_hour)
    pub max_hour: u32,

    /// Chart axis padding in percent
    pub chart_padding_percent: f64,

    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Stores loaded into the session at startup
    pub stores: Vec<StoreSettings>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::Strict,
            fallback_base_rate: DEFAULT_FALLBACK_BASE_RATE,
            max_hour: DEFAULT_MAX_HOUR,
            chart_padding_percent: DEFAULT_CHART_PADDING_PERCENT,
            log_level: "info".to_string(),
            stores: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut settings: EngineSettings = toml::from_str(&content)?;
        settings.apply_env()?;
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("LABOR_MATRIX_VALIDATION") {
            self.validation = match value.trim().to_ascii_lowercase().as_str() {
                "strict" => ValidationPolicy::Strict,
                "permissive" | "compat" => ValidationPolicy::Permissive,
                other => {
                    return Err(PricingError::Settings(format!(
                        "LABOR_MATRIX_VALIDATION must be 'strict' or 'permissive', got '{other}'"
                    )))
                }
            };
        }

        if let Ok(value) = std::env::var("LABOR_MATRIX_FALLBACK_BASE_RATE") {
            self.fallback_base_rate = value.trim().parse().map_err(|_| {
                PricingError::Settings(format!(
                    "LABOR_MATRIX_FALLBACK_BASE_RATE must be a number, got '{value}'"
                ))
            })?;
        }

        if let Ok(value) = std::env::var("LABOR_MATRIX_MAX_HOUR") {
            self.max_hour = value.trim().parse().map_err(|_| {
                PricingError::Settings(format!(
                    "LABOR_MATRIX_MAX_HOUR must be a whole number, got '{value}'"
                ))
            })?;
        }

        if let Ok(value) = std::env::var("LABOR_MATRIX_LOG_LEVEL") {
            self.log_level = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_MATRIX_HOUR).contains(&self.max_hour) {
            return Err(PricingError::Settings(format!(
                "max_hour must be between 1 and {MAX_MATRIX_HOUR}, got {}",
                self.max_hour
            )));
        }
        if !(self.fallback_base_rate.is_finite() && self.fallback_base_rate >= 0.0) {
            return Err(PricingError::Settings(
                "fallback_base_rate must be a non-negative number".to_string(),
            ));
        }
        if !(self.chart_padding_percent.is_finite() && self.chart_padding_percent >= 0.0) {
            return Err(PricingError::Settings(
                "chart_padding_percent must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a store's raw configuration under these settings.
    pub fn resolve(
        &self,
        raw: &RawPricingConfig,
    ) -> std::result::Result<PricingConfig, ConfigurationError> {
        PricingConfig::from_raw(raw, self.validation, self.fallback_base_rate)
    }
}
