//! End-to-end scenarios: settings -> store book -> engine -> views

use crate::config::{EngineSettings, FieldValue, RawPricingConfig, ScalingModeKind};
use crate::curve::{ChartMetric, ChartSeries, CurveDomain};
use crate::matrix::{MatrixView, RateMatrix};
use crate::store::StoreBook;
use crate::{PricingEngine, PricingError};

const SETTINGS: &str = r#"
max_hour = 20

[[stores]]
name = "Infinity"
[stores.pricing]
baseRate = 150
percentIncreasePerHour = 2
mode = "infinity"

[[stores]]
name = "Capped"
[stores.pricing]
baseRate = 150
percentIncreasePerHour = 2
mode = "hoursCap"
capType = "hours"
peakHours = 5

[[stores]]
name = "Tapered"
locked = true
[stores.pricing]
baseRate = 150
percentIncreasePerHour = 2
mode = "proportional"
capType = "hours"
peakHours = 5
endHours = 20
"#;

fn book() -> StoreBook {
    let settings: EngineSettings = toml::from_str(SETTINGS).expect("settings parse");
    StoreBook::from_settings(&settings).expect("stores resolve")
}

#[test]
fn scenario_infinity_two_hours() {
    let book = book();
    let config = book.config("Infinity").expect("store exists");

    let one = PricingEngine::evaluate(1.0, &config).expect("valid duration");
    assert_eq!(one.effective_rate, 150.0);
    assert_eq!(one.total_amount, 150.0);

    let two = PricingEngine::evaluate(2.0, &config).expect("valid duration");
    assert!((two.scaling_factor - 1.02).abs() < 1e-12);
    assert!((two.effective_rate - 153.0).abs() < 1e-9);
    assert_eq!(two.total_amount, 306.0);
}

#[test]
fn scenario_hours_cap_keeps_accruing_past_peak() {
    let book = book();
    let config = book.config("Capped").expect("store exists");

    let peak = PricingEngine::evaluate(5.0, &config).expect("valid duration");
    let mut previous = peak.total_amount;
    for hours in [6.0, 7.0, 8.0, 9.0, 10.0] {
        let eval = PricingEngine::evaluate(hours, &config).expect("valid duration");
        assert_eq!(eval.effective_rate, peak.effective_rate);
        let step = eval.total_amount - previous;
        assert!((step - peak.effective_rate).abs() < 0.011, "step {step} at {hours}");
        previous = eval.total_amount;
    }
    assert_eq!(previous, 1620.0);
}

#[test]
fn scenario_zero_hours_for_every_store() {
    let book = book();
    for quote in book.quote_all(0.0).expect("quotes") {
        assert_eq!(quote.evaluation.total_amount, 0.0, "{}", quote.store);
    }
}

#[test]
fn scenario_proportional_returns_to_base_at_end() {
    let book = book();
    let config = book.config("Tapered").expect("store exists");
    let end = PricingEngine::evaluate(20.0, &config).expect("valid duration");
    assert_eq!(end.effective_rate, config.base_rate);
    assert_eq!(end.total_amount, 3000.0);
}

#[test]
fn locked_store_survives_edit_attempts() {
    let mut book = book();
    let edit = RawPricingConfig {
        base_rate: Some(FieldValue::Number(99.0)),
        ..Default::default()
    };
    assert!(matches!(book.update("Tapered", edit.clone()), Err(PricingError::StoreLocked { .. })));
    assert_eq!(book.config("Tapered").expect("store exists").base_rate, 150.0);

    book.unlock("Tapered").expect("unlock");
    let updated = book.update("Tapered", edit).expect("update");
    assert_eq!(updated.base_rate, 99.0);
    assert_eq!(book.entry("Tapered").expect("store exists").raw.mode, ScalingModeKind::Infinity);
}

#[test]
fn matrix_and_chart_agree_with_engine() {
    let mut book = book();
    let (name, _) = book.selected().expect("first store selected");
    assert_eq!(name, "Infinity");

    book.select("Capped").expect("store exists");
    let (name, entry) = book.selected().expect("store selected");
    assert_eq!(name, "Capped");

    let matrix = RateMatrix::build(&entry.config, 20);
    let series = ChartSeries::build(&entry.config, CurveDomain::chart(20));
    assert_eq!(series.points.len(), 200);

    for point in &series.points {
        let hour = point.hours.floor() as u32;
        let tenth = ((point.hours - hour as f64) * 10.0).round() as u32;
        let cell = matrix.cell(hour, tenth).expect("cell exists");
        assert_eq!(cell.total_amount, point.total_amount);
        assert_eq!(cell.elr, Some(point.elr));
    }

    let bounds = series.bounds(ChartMetric::Elr, 10.0).expect("non-empty");
    assert_eq!(bounds.min, 135.0);
    // Peak ELR 162.00 at 5.0 hours, padded by 10% and ceiled.
    assert_eq!(bounds.max, 179.0);

    let table = matrix.render_table(MatrixView::Elr).expect("table renders");
    assert!(table.lines().nth(1).expect("zero row").contains("N/A"));
}
