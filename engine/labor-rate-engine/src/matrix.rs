//! Rate matrix: whole hours down, tenths across

use crate::config::PricingConfig;
use crate::curve::{generate_curve, CurveDomain};
use crate::error::{PricingError, Result};
use crate::{round2, CELLS_PER_HOUR};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Money value rounded half away from zero to cents.
///
/// Fails for values outside the range `Decimal` can hold.
pub fn money(value: f64) -> Result<Decimal> {
    let mut amount = Decimal::from_f64(value)
        .ok_or(PricingError::MoneyOutOfRange { value })?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    Ok(amount)
}

/// `money` rendered with exactly two decimals
pub fn format_money(value: f64) -> Result<String> {
    Ok(money(value)?.to_string())
}

/// Which figure a matrix cell shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixView {
    /// Billed amount
    #[default]
    Amount,
    /// Effective labor rate, `N/A` at zero hours
    Elr,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub hours: f64,
    pub total_amount: f64,
    pub elr: Option<f64>,
}

impl MatrixCell {
    pub fn display(&self, view: MatrixView) -> Result<String> {
        match (view, self.elr) {
            (MatrixView::Amount, _) => format_money(self.total_amount),
            (MatrixView::Elr, Some(elr)) => format_money(elr),
            (MatrixView::Elr, None) => Ok("N/A".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRow {
    pub hour: u32,
    /// Increments 0.0 through 0.9
    pub cells: Vec<MatrixCell>,
}

/// Labor rate matrix for one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateMatrix {
    pub base_rate: f64,
    pub rows: Vec<MatrixRow>,
}

impl RateMatrix {
    /// Price every cell from 0.0 through `max_hour`.9 hours.
    pub fn build(config: &PricingConfig, max_hour: u32) -> Self {
        let mut rows: Vec<MatrixRow> = (0..=max_hour)
            .map(|hour| MatrixRow { hour, cells: Vec::with_capacity(CELLS_PER_HOUR as usize) })
            .collect();

        for sample in generate_curve(config, CurveDomain::matrix(max_hour)) {
            let row = (sample.hours.floor() as usize).min(max_hour as usize);
            let elr = (sample.hours > 0.0).then(|| round2(sample.total_amount / sample.hours));
            rows[row].cells.push(MatrixCell {
                hours: sample.hours,
                total_amount: sample.total_amount,
                elr,
            });
        }

        Self { base_rate: config.base_rate, rows }
    }

    pub fn cell(&self, hour: u32, tenth: u32) -> Option<&MatrixCell> {
        self.rows.get(hour as usize)?.cells.get(tenth as usize)
    }

    fn header() -> Vec<String> {
        std::iter::once("Labor Time".to_string())
            .chain((0..CELLS_PER_HOUR).map(|tenth| format!("0.{tenth}")))
            .collect()
    }

    fn record(row: &MatrixRow, view: MatrixView) -> Result<Vec<String>> {
        std::iter::once(Ok(format!("{}.0", row.hour)))
            .chain(row.cells.iter().map(|cell| cell.display(view)))
            .collect()
    }

    /// Fixed-width text table, one line per row.
    pub fn render_table(&self, view: MatrixView) -> Result<String> {
        let header = Self::header();
        let records = self
            .rows
            .iter()
            .map(|row| Self::record(row, view))
            .collect::<Result<Vec<_>>>()?;

        let mut widths: Vec<usize> = header.iter().map(String::len).collect();
        for record in &records {
            for (width, value) in widths.iter_mut().zip(record) {
                *width = (*width).max(value.len());
            }
        }

        let mut out = String::new();
        for line in std::iter::once(&header).chain(records.iter()) {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{value:>width$}"))
                .collect();
            out.push_str(&cells.join("  "));
            out.push('\n');
        }
        Ok(out)
    }

    /// CSV suitable for pasting into a spreadsheet.
    pub fn write_csv<W: Write>(&self, writer: W, view: MatrixView) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(Self::header())?;
        for row in &self.rows {
            csv.write_record(Self::record(row, view)?)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
