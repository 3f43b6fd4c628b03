//! Time-value-of-money building blocks shared by the FIRE calculators and
//! the CD accrual. Rates are annual decimals (0.07 = 7%).

pub const DAYS_PER_YEAR: f64 = 365.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Compound growth of a lump sum: `principal * (1 + rate/n)^(n*years)`.
///
/// Returns `principal` unchanged when `years <= 0` or the rate is zero.
pub fn future_value(principal: f64, annual_rate: f64, periods_per_year: u32, years: f64) -> f64 {
    if years <= 0.0 || annual_rate == 0.0 || periods_per_year == 0 {
        return principal;
    }
    let n = f64::from(periods_per_year);
    principal * (1.0 + annual_rate / n).powf(n * years)
}

/// Future value of a level payment stream (paid at the start of each
/// period) plus the grown initial principal.
///
/// With `years <= 0` no contributions are applied and `principal` is
/// returned as is. At a zero rate the stream is a plain sum.
pub fn future_value_of_series(
    periodic_payment: f64,
    annual_rate: f64,
    periods_per_year: u32,
    years: f64,
    principal: f64,
) -> f64 {
    if years <= 0.0 || periods_per_year == 0 {
        return principal;
    }
    let n = f64::from(periods_per_year);
    let periods = n * years;
    if annual_rate == 0.0 {
        return principal + periodic_payment * periods;
    }

    let rate = annual_rate / n;
    let growth = (1.0 + rate).powf(periods);
    let stream = periodic_payment * ((growth - 1.0) / rate) * (1.0 + rate);
    principal * growth + stream
}

/// Lump sum needed today so that it, together with a monthly contribution
/// stream, reaches `future_target` after `years`.
pub fn present_value_needed(
    future_target: f64,
    monthly_payment: f64,
    annual_rate: f64,
    years: f64,
) -> f64 {
    let discount = (1.0 + annual_rate).powf(years.max(0.0));
    if monthly_payment <= 0.0 {
        return (future_target / discount).max(0.0);
    }

    let stream_value =
        future_value_of_series(monthly_payment, annual_rate, MONTHS_PER_YEAR as u32, years, 0.0);
    ((future_target - stream_value) / discount).max(0.0)
}

pub fn monthly_to_daily(monthly_amount: f64) -> f64 {
    monthly_amount * MONTHS_PER_YEAR / DAYS_PER_YEAR
}

/// Fisher relation.
pub fn real_return(nominal_return: f64, inflation_rate: f64) -> f64 {
    (1.0 + nominal_return) / (1.0 + inflation_rate) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn future_value_matches_hand_calculation() {
        // 1000 * 1.05^3 = 1157.625
        assert_approx(future_value(1_000.0, 0.05, 1, 3.0), 1_157.625);
        // 1000 * (1 + 0.12/12)^12 = 1126.825030...
        assert_approx(future_value(1_000.0, 0.12, 12, 1.0), 1_126.825_030_131_969_7);
    }

    #[test]
    fn future_value_returns_principal_for_zero_years_or_rate() {
        assert_approx(future_value(2_500.0, 0.07, 365, 0.0), 2_500.0);
        assert_approx(future_value(2_500.0, 0.07, 365, -3.0), 2_500.0);
        assert_approx(future_value(2_500.0, 0.0, 365, 10.0), 2_500.0);
    }

    #[test]
    fn future_value_of_series_pays_at_period_start() {
        // Two annual payments of 100 at 10%: 100*1.1^2 + 100*1.1 = 231.
        assert_approx(future_value_of_series(100.0, 0.10, 1, 2.0, 0.0), 231.0);
        // Principal 1000 grows alongside: 1000*1.21 + 231.
        assert_approx(future_value_of_series(100.0, 0.10, 1, 2.0, 1_000.0), 1_441.0);
    }

    #[test]
    fn future_value_of_series_ignores_contributions_without_time() {
        assert_approx(future_value_of_series(500.0, 0.07, 12, 0.0, 42.0), 42.0);
    }

    #[test]
    fn present_value_needed_discounts_target_without_payments() {
        assert_approx(present_value_needed(1_210.0, 0.0, 0.10, 2.0), 1_000.0);
    }

    #[test]
    fn present_value_needed_is_zero_when_stream_covers_target() {
        assert_approx(present_value_needed(1_000.0, 1_000.0, 0.05, 10.0), 0.0);
    }

    #[test]
    fn present_value_needed_subtracts_stream_before_discounting() {
        let stream = future_value_of_series(100.0, 0.06, 12, 5.0, 0.0);
        let expected = (50_000.0 - stream) / 1.06_f64.powf(5.0);
        assert_approx(present_value_needed(50_000.0, 100.0, 0.06, 5.0), expected);
    }

    #[test]
    fn monthly_to_daily_spreads_over_calendar_days() {
        assert_approx(monthly_to_daily(365.0), 12.0);
    }

    #[test]
    fn real_return_applies_fisher_relation() {
        assert_approx(real_return(0.07, 0.03), 1.07 / 1.03 - 1.0);
        assert_approx(real_return(0.05, 0.05), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_future_value_non_decreasing_in_time_and_rate(
            principal in 0u32..2_000_000,
            rate_bp in 0u32..2_000,
            rate_step_bp in 0u32..500,
            years_tenths in 0u32..600,
            years_step_tenths in 0u32..200,
            periods in proptest::sample::select(vec![1u32, 4, 12, 365])
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let years = years_tenths as f64 / 10.0;
            let base = future_value(principal, rate, periods, years);

            let later = future_value(principal, rate, periods, years + years_step_tenths as f64 / 10.0);
            let higher = future_value(principal, rate + rate_step_bp as f64 / 10_000.0, periods, years);

            prop_assert!(later + 1e-9 >= base);
            prop_assert!(higher + 1e-9 >= base);
        }

        #[test]
        fn prop_zero_rate_series_is_linear(
            payment in 0u32..10_000,
            principal in 0u32..1_000_000,
            years_tenths in 1u32..500,
            periods in proptest::sample::select(vec![1u32, 4, 12, 365])
        ) {
            let years = years_tenths as f64 / 10.0;
            let expected = principal as f64 + payment as f64 * periods as f64 * years;
            let actual = future_value_of_series(payment as f64, 0.0, periods, years, principal as f64);
            prop_assert!((actual - expected).abs() <= 1e-6 * expected.max(1.0));
        }
    }
}
