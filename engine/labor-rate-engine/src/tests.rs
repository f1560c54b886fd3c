//! Unit and property tests for the pricing engine

use crate::config::{CapType, PricingConfig, ScalingMode};
use crate::curve::{generate_curve, CurveDomain};
use crate::{PricingEngine, CELLS_PER_HOUR};
use proptest::prelude::*;

fn hours_of(cell: u32) -> f64 {
    cell as f64 / CELLS_PER_HOUR as f64
}

fn rates(config: &PricingConfig, max_hour: u32) -> Vec<f64> {
    generate_curve(config, CurveDomain::chart(max_hour))
        .map(|sample| sample.effective_rate)
        .collect()
}

fn capped_mode() -> impl Strategy<Value = ScalingMode> {
    prop_oneof![
        Just(ScalingMode::HoursCap),
        Just(ScalingMode::Mirror),
        (150u32..=250).prop_map(|end_cell| ScalingMode::Proportional {
            end_hours: Some(hours_of(end_cell))
        }),
    ]
}

#[cfg(test)]
mod mode_tests {
    use super::*;

    #[test]
    fn every_mode_matches_infinity_before_the_peak() {
        let infinity = PricingConfig::infinity(150.0, 2.0);
        let modes = [
            ScalingMode::HoursCap,
            ScalingMode::Mirror,
            ScalingMode::Proportional { end_hours: Some(20.0) },
        ];
        for mode in modes {
            let capped = infinity.capped_at_hours(mode, 8.0);
            for cell in 0..=80 {
                let hours = hours_of(cell);
                assert_eq!(
                    PricingEngine::evaluate(hours, &capped).expect("valid duration"),
                    PricingEngine::evaluate(hours, &infinity).expect("valid duration"),
                    "{mode:?} diverged at {hours} hours"
                );
            }
        }
    }

    #[test]
    fn cap_type_is_ignored_in_infinity_mode() {
        let mut config = PricingConfig::infinity(150.0, 2.0);
        let plain = PricingEngine::evaluate(15.0, &config).expect("valid duration");
        config.cap_type = CapType::Elr;
        config.max_effective_rate = Some(155.0);
        let with_ceiling = PricingEngine::evaluate(15.0, &config).expect("valid duration");
        assert_eq!(plain, with_ceiling);
    }

    #[test]
    fn zero_percent_is_flat_in_every_mode() {
        let flat = PricingConfig::infinity(120.0, 0.0);
        for mode in [ScalingMode::Infinity, ScalingMode::HoursCap, ScalingMode::Mirror] {
            let config = flat.capped_at_hours(mode, 4.0);
            assert!(rates(&config, 20).iter().all(|rate| *rate == 120.0));
        }
    }

    #[test]
    fn rate_ceiling_matches_equivalent_hour_cap() {
        // 159 / 150 = 1.06 is reached 30 cells past the first hour.
        let by_rate = PricingConfig::infinity(150.0, 2.0).capped_at_rate(ScalingMode::Mirror, 159.0);
        let by_hours = PricingConfig::infinity(150.0, 2.0).capped_at_hours(ScalingMode::Mirror, 4.0);
        for cell in 0..=209 {
            let hours = hours_of(cell);
            let a = PricingEngine::evaluate(hours, &by_rate).expect("valid duration");
            let b = PricingEngine::evaluate(hours, &by_hours).expect("valid duration");
            assert!((a.effective_rate - b.effective_rate).abs() < 1e-9, "diverged at {hours}");
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn infinity_starts_at_base_and_strictly_increases(
            base in 1.0f64..1000.0,
            percent in 0.1f64..25.0,
        ) {
            let config = PricingConfig::infinity(base, percent);
            let at_one = PricingEngine::evaluate(1.0, &config).expect("valid duration");
            prop_assert_eq!(at_one.effective_rate, base);

            let rates = rates(&config, 20);
            for pair in rates.windows(2) {
                prop_assert!(pair[1] > pair[0]);
            }
        }

        #[test]
        fn mirror_returns_to_base_and_is_unimodal(
            base in 1.0f64..1000.0,
            percent in 0.1f64..25.0,
            peak_cell in 11u32..=100,
        ) {
            let peak = hours_of(peak_cell);
            let config = PricingConfig::infinity(base, percent).capped_at_hours(ScalingMode::Mirror, peak);

            let back = PricingEngine::evaluate(2.0 * peak - 1.0, &config).expect("valid duration");
            prop_assert_eq!(back.effective_rate, base);

            let rates = rates(&config, 20);
            let top = rates
                .iter()
                .enumerate()
                .fold(0, |best, (i, rate)| if *rate > rates[best] { i } else { best });
            for pair in rates[..=top].windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
            for pair in rates[top..].windows(2) {
                prop_assert!(pair[1] <= pair[0]);
            }
        }

        #[test]
        fn proportional_is_at_base_from_end_hours(
            base in 1.0f64..1000.0,
            percent in 0.1f64..25.0,
            peak_cell in 11u32..=100,
            extra_cells in 1u32..=100,
            past_end in 0.0f64..10.0,
        ) {
            let peak = hours_of(peak_cell);
            let end = hours_of(peak_cell + extra_cells);
            let config = PricingConfig::infinity(base, percent)
                .capped_at_hours(ScalingMode::Proportional { end_hours: Some(end) }, peak);

            let eval = PricingEngine::evaluate(end + past_end, &config).expect("valid duration");
            prop_assert_eq!(eval.effective_rate, base);
        }

        #[test]
        fn rate_ceiling_holds_across_the_domain(
            base in 1.0f64..1000.0,
            percent in 0.1f64..25.0,
            headroom in 0.001f64..1.0,
            mode in capped_mode(),
        ) {
            let max_rate = base * (1.0 + headroom);
            let config = PricingConfig::infinity(base, percent).capped_at_rate(mode, max_rate);
            for rate in rates(&config, 20) {
                prop_assert!(rate <= max_rate + 1e-6);
                prop_assert!(rate >= base);
            }
        }

        #[test]
        fn evaluation_is_deterministic(
            base in 0.0f64..1000.0,
            percent in 0.0f64..25.0,
            peak_cell in 11u32..=100,
            hours in 0.0f64..30.0,
            mode in capped_mode(),
        ) {
            let config = PricingConfig::infinity(base, percent).capped_at_hours(mode, hours_of(peak_cell));
            let a = PricingEngine::evaluate(hours, &config).expect("valid duration");
            let b = PricingEngine::evaluate(hours, &config).expect("valid duration");
            prop_assert_eq!(a.scaling_factor.to_bits(), b.scaling_factor.to_bits());
            prop_assert_eq!(a.effective_rate.to_bits(), b.effective_rate.to_bits());
            prop_assert_eq!(a.total_amount.to_bits(), b.total_amount.to_bits());
        }

        #[test]
        fn capped_rate_never_drops_below_base(
            base in 0.0f64..1000.0,
            percent in 0.0f64..25.0,
            peak_cell in 11u32..=100,
            mode in capped_mode(),
        ) {
            let config = PricingConfig::infinity(base, percent).capped_at_hours(mode, hours_of(peak_cell));
            for rate in rates(&config, 25) {
                prop_assert!(rate >= base);
            }
        }
    }
}
