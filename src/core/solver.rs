use tracing::debug;

use super::primitives::{DAYS_PER_YEAR, MONTHS_PER_YEAR, future_value_of_series, monthly_to_daily};
use super::types::{CoastConvergence, YearsToTarget};

/// Longest horizon the years-to-target search will consider.
pub const YEARS_SEARCH_CEILING: u32 = 100;
/// Bisection stops once the bracket is narrower than this (about nine hours).
pub const YEARS_TOLERANCE: f64 = 0.001;
const MAX_BISECTION_ROUNDS: u32 = 64;

pub const CROSSOVER_MAX_ITERATIONS: u32 = 50;
pub const CROSSOVER_TOLERANCE: f64 = 1_000.0;

/// Time until `current_value` reaches `target_value` under monthly
/// contributions and compounding.
///
/// Without contributions the answer is closed form, inverting daily
/// compounding so that it agrees with [`super::primitives::future_value`].
/// With contributions, whole years up to [`YEARS_SEARCH_CEILING`] are scanned
/// to bracket the crossing, which bisection then narrows to
/// [`YEARS_TOLERANCE`].
pub fn years_to_target(
    current_value: f64,
    target_value: f64,
    monthly_contribution: f64,
    annual_return: f64,
) -> YearsToTarget {
    if current_value >= target_value {
        return YearsToTarget::Achieved;
    }

    if monthly_contribution <= 0.0 {
        if annual_return <= 0.0 || current_value <= 0.0 {
            return YearsToTarget::Unreachable;
        }
        let log_growth_per_year = DAYS_PER_YEAR * (annual_return / DAYS_PER_YEAR).ln_1p();
        return YearsToTarget::Years((target_value / current_value).ln() / log_growth_per_year);
    }

    let value_at = |years: f64| {
        value_with_monthly_contributions(current_value, monthly_contribution, annual_return, years)
    };

    let Some(first_year) =
        (1..=YEARS_SEARCH_CEILING).find(|&y| value_at(f64::from(y)) >= target_value)
    else {
        return YearsToTarget::BeyondHorizon;
    };

    let mut lo = f64::from(first_year - 1);
    let mut hi = f64::from(first_year);
    let mut rounds = 0;
    while hi - lo > YEARS_TOLERANCE && rounds < MAX_BISECTION_ROUNDS {
        let mid = (lo + hi) * 0.5;
        if value_at(mid) >= target_value {
            hi = mid;
        } else {
            lo = mid;
        }
        rounds += 1;
    }
    YearsToTarget::Years(hi)
}

/// Portfolio value after `years` of monthly compounding with contributions at
/// the end of each month.
pub fn value_with_monthly_contributions(
    current_value: f64,
    monthly_contribution: f64,
    annual_return: f64,
    years: f64,
) -> f64 {
    let months = years.max(0.0) * MONTHS_PER_YEAR;
    let monthly_rate = annual_return / MONTHS_PER_YEAR;
    if monthly_rate == 0.0 {
        return current_value + monthly_contribution * months;
    }
    let growth = (1.0 + monthly_rate).powf(months);
    current_value * growth + monthly_contribution * (growth - 1.0) / monthly_rate
}

/// Level monthly payment that grows `current_value` into `target_value`
/// over `years`. Zero when already sufficient or there is no time left.
pub fn monthly_payment_needed(
    current_value: f64,
    target_value: f64,
    years: f64,
    annual_return: f64,
) -> f64 {
    if years <= 0.0 {
        return 0.0;
    }

    let months = years * MONTHS_PER_YEAR;
    let monthly_rate = annual_return / MONTHS_PER_YEAR;
    if monthly_rate == 0.0 {
        let gap = target_value - current_value;
        return if gap <= 0.0 { 0.0 } else { gap / months };
    }

    let growth = (1.0 + monthly_rate).powf(months);
    let gap = target_value - current_value * growth;
    if gap <= 0.0 {
        return 0.0;
    }
    gap * monthly_rate / (growth - 1.0)
}

#[derive(Debug, Clone, Copy)]
pub struct CoastConvergeParams {
    pub current_age: u32,
    pub current_portfolio: f64,
    pub monthly_contribution: f64,
    pub monthly_barista_contribution: f64,
    pub annual_return: f64,
    pub years_to_retirement: f64,
    pub fire_target: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceConfig {
    pub iterations: u32,
    pub steps: u32,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            iterations: 3,
            steps: 10,
        }
    }
}

/// Finds how many more years of full saving are needed before contributions
/// can drop to the barista level and still reach the FIRE target by
/// retirement.
///
/// Each pass splits the current window into `config.steps` slices and keeps
/// the slice in which the projected retirement value first reaches the
/// target, so `iterations` passes give `steps^iterations` resolution. When no
/// slice crosses, the best crossing from an earlier pass is kept; if there is
/// none, the result is flagged as not possible.
pub fn coast_fire_converge(
    params: &CoastConvergeParams,
    config: ConvergenceConfig,
) -> CoastConvergence {
    let window = (0.0, params.years_to_retirement.max(0.0));
    refine_coast_window(params, config.steps.max(1), window, config.iterations, 0, None)
        .unwrap_or_else(|| coast_not_possible(params, config.iterations.min(1)))
}

fn refine_coast_window(
    params: &CoastConvergeParams,
    steps: u32,
    (lo, hi): (f64, f64),
    remaining: u32,
    completed: u32,
    best: Option<CoastConvergence>,
) -> Option<CoastConvergence> {
    if remaining == 0 {
        return best;
    }

    let step = (hi - lo) / f64::from(steps);
    let mut previous = lo;
    for k in 0..=steps {
        let years_saving = lo + step * f64::from(k);
        let (portfolio_at_coast, projected_final_value) = project_coast_path(params, years_saving);
        if projected_final_value < params.fire_target {
            previous = years_saving;
            continue;
        }

        let crossing = CoastConvergence {
            possible: true,
            years_saving,
            coast_age: f64::from(params.current_age) + years_saving,
            portfolio_at_coast,
            projected_final_value,
            iterations_run: completed + 1,
        };
        if k == 0 || step <= 0.0 {
            return Some(crossing);
        }
        return refine_coast_window(
            params,
            steps,
            (previous, years_saving),
            remaining - 1,
            completed + 1,
            Some(crossing),
        );
    }

    debug!(
        lo,
        hi, completed, "coast convergence found no crossing in window; keeping previous best"
    );
    best
}

/// Value at the switch to barista contributions, and the value at retirement.
fn project_coast_path(params: &CoastConvergeParams, years_saving: f64) -> (f64, f64) {
    let daily_periods = DAYS_PER_YEAR as u32;
    let at_coast = future_value_of_series(
        monthly_to_daily(params.monthly_contribution),
        params.annual_return,
        daily_periods,
        years_saving,
        params.current_portfolio,
    );
    let at_retirement = future_value_of_series(
        monthly_to_daily(params.monthly_barista_contribution),
        params.annual_return,
        daily_periods,
        params.years_to_retirement - years_saving,
        at_coast,
    );
    (at_coast, at_retirement)
}

fn coast_not_possible(params: &CoastConvergeParams, iterations_run: u32) -> CoastConvergence {
    let years_saving = params.years_to_retirement.max(0.0);
    let (portfolio_at_coast, projected_final_value) = project_coast_path(params, years_saving);
    CoastConvergence {
        possible: false,
        years_saving,
        coast_age: f64::from(params.current_age) + years_saving,
        portfolio_at_coast,
        projected_final_value,
        iterations_run,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverSearch {
    pub value: f64,
    pub converged: bool,
    pub iterations: u32,
}

/// Smallest portfolio value that, with barista contributions only, still
/// grows into `target` within `years`.
///
/// Runs at most [`CROSSOVER_MAX_ITERATIONS`] halvings; when the bracket has
/// not shrunk below [`CROSSOVER_TOLERANCE`] the upper bound is returned with
/// `converged = false`.
pub fn barista_crossover_search(
    target: f64,
    monthly_barista_contribution: f64,
    annual_return: f64,
    years: f64,
) -> CrossoverSearch {
    let mut lo = 0.0;
    let mut hi = target.max(0.0);
    for iteration in 1..=CROSSOVER_MAX_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        let projected = future_value_of_series(
            monthly_barista_contribution,
            annual_return,
            MONTHS_PER_YEAR as u32,
            years,
            mid,
        );
        if projected >= target {
            hi = mid;
        } else {
            lo = mid;
        }

        if hi - lo <= CROSSOVER_TOLERANCE {
            return CrossoverSearch {
                value: hi,
                converged: true,
                iterations: iteration,
            };
        }
    }

    debug!(
        target,
        lo, hi, "barista crossover search exhausted its iteration budget"
    );
    CrossoverSearch {
        value: hi,
        converged: false,
        iterations: CROSSOVER_MAX_ITERATIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::primitives::future_value;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_converge_params() -> CoastConvergeParams {
        CoastConvergeParams {
            current_age: 30,
            current_portfolio: 20_000.0,
            monthly_contribution: 2_000.0,
            monthly_barista_contribution: 500.0,
            annual_return: 0.07,
            years_to_retirement: 30.0,
            fire_target: 1_000_000.0,
        }
    }

    #[test]
    fn years_to_target_is_zero_when_already_at_target() {
        assert_eq!(
            years_to_target(500_000.0, 400_000.0, 1_000.0, 0.07),
            YearsToTarget::Achieved
        );
        assert_eq!(years_to_target(10.0, 10.0, 0.0, 0.0).as_years(), 0.0);
    }

    #[test]
    fn years_to_target_without_growth_or_contributions_is_unreachable() {
        assert_eq!(
            years_to_target(100_000.0, 200_000.0, 0.0, 0.0),
            YearsToTarget::Unreachable
        );
        assert_eq!(
            years_to_target(100_000.0, 200_000.0, 0.0, -0.02),
            YearsToTarget::Unreachable
        );
        assert_eq!(
            years_to_target(0.0, 200_000.0, 0.0, 0.07),
            YearsToTarget::Unreachable
        );
        assert!(!YearsToTarget::Unreachable.is_finite());
        assert!(YearsToTarget::Unreachable.as_years().is_infinite());
    }

    #[test]
    fn years_to_target_linear_contributions_match_hand_calculation() {
        // 1000/month with no growth reaches 120k after exactly 10 years.
        let years = years_to_target(0.0, 120_000.0, 1_000.0, 0.0).as_years();
        assert_approx_tol(years, 10.0, YEARS_TOLERANCE);
    }

    #[test]
    fn years_to_target_search_result_reaches_target() {
        let years = years_to_target(10_000.0, 1_000_000.0, 1_500.0, 0.07).as_years();
        assert!(years > 0.0 && years < 100.0);
        let at = value_with_monthly_contributions(10_000.0, 1_500.0, 0.07, years);
        let before =
            value_with_monthly_contributions(10_000.0, 1_500.0, 0.07, years - 2.0 * YEARS_TOLERANCE);
        assert!(at >= 1_000_000.0);
        assert!(before < 1_000_000.0);
    }

    #[test]
    fn years_to_target_reports_targets_past_the_ceiling() {
        assert_eq!(
            years_to_target(0.0, 1.0e9, 10.0, 0.0),
            YearsToTarget::BeyondHorizon
        );
    }

    #[test]
    fn monthly_payment_needed_closes_gap_exactly() {
        let payment = monthly_payment_needed(50_000.0, 1_000_000.0, 25.0, 0.06);
        assert!(payment > 0.0);
        let reached = value_with_monthly_contributions(50_000.0, payment, 0.06, 25.0);
        assert_approx_tol(reached, 1_000_000.0, 1e-4);
    }

    #[test]
    fn monthly_payment_needed_zero_rate_is_linear() {
        assert_approx_tol(
            monthly_payment_needed(0.0, 120_000.0, 10.0, 0.0),
            1_000.0,
            1e-9,
        );
    }

    #[test]
    fn monthly_payment_needed_is_zero_when_sufficient_or_out_of_time() {
        assert_eq!(monthly_payment_needed(900_000.0, 1_000_000.0, 10.0, 0.07), 0.0);
        assert_eq!(monthly_payment_needed(0.0, 1_000_000.0, 0.0, 0.07), 0.0);
        assert_eq!(monthly_payment_needed(0.0, 1_000_000.0, -2.0, 0.07), 0.0);
    }

    #[test]
    fn coast_converge_crossing_is_first_point_to_reach_target() {
        let params = sample_converge_params();
        let config = ConvergenceConfig::default();
        let result = coast_fire_converge(&params, config);

        assert!(result.possible);
        assert_eq!(result.iterations_run, 3);
        assert!(result.years_saving > 0.0 && result.years_saving < 30.0);
        assert!(result.projected_final_value >= params.fire_target);
        assert_approx_tol(result.coast_age, 30.0 + result.years_saving, 1e-12);

        let resolution = params.years_to_retirement / 1_000.0;
        let (_, just_before) = project_coast_path(&params, result.years_saving - resolution);
        assert!(just_before < params.fire_target);
    }

    #[test]
    fn coast_converge_stops_immediately_when_already_coasting() {
        let mut params = sample_converge_params();
        params.current_portfolio = 400_000.0;
        let result = coast_fire_converge(&params, ConvergenceConfig::default());

        assert!(result.possible);
        assert_eq!(result.years_saving, 0.0);
        assert_eq!(result.iterations_run, 1);
        assert_eq!(result.portfolio_at_coast, 400_000.0);
    }

    #[test]
    fn coast_converge_flags_unreachable_targets() {
        let mut params = sample_converge_params();
        params.current_portfolio = 0.0;
        params.monthly_contribution = 50.0;
        params.monthly_barista_contribution = 0.0;
        let result = coast_fire_converge(&params, ConvergenceConfig::default());

        assert!(!result.possible);
        assert_eq!(result.years_saving, 30.0);
        assert!(result.projected_final_value < params.fire_target);
    }

    #[test]
    fn coast_converge_with_single_pass_has_step_resolution() {
        let params = sample_converge_params();
        let coarse = coast_fire_converge(
            &params,
            ConvergenceConfig {
                iterations: 1,
                steps: 10,
            },
        );
        let fine = coast_fire_converge(&params, ConvergenceConfig::default());

        assert_eq!(coarse.iterations_run, 1);
        assert_eq!(coarse.years_saving % 3.0, 0.0);
        assert!(fine.years_saving <= coarse.years_saving);
        assert!(coarse.years_saving - fine.years_saving <= 3.0);
    }

    #[test]
    fn barista_crossover_search_matches_linear_oracle() {
        // No growth: 30 years of 1000/month adds 360k, so 640k must already be invested.
        let search = barista_crossover_search(1_000_000.0, 1_000.0, 0.0, 30.0);
        assert!(search.converged);
        assert!(search.value >= 640_000.0);
        assert!(search.value <= 640_000.0 + CROSSOVER_TOLERANCE);
    }

    #[test]
    fn barista_crossover_search_without_contributions_discounts_target() {
        let search = barista_crossover_search(1_000_000.0, 0.0, 0.07, 30.0);
        let exact = 1_000_000.0 / (1.0 + 0.07 / 12.0_f64).powf(360.0);
        assert!(search.converged);
        assert!(search.value >= exact);
        assert!(search.value <= exact + CROSSOVER_TOLERANCE);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_years_to_target_round_trips_daily_future_value(
            current in 1_000u32..1_000_000,
            rate_bp in 100u32..1_500,
            years_tenths in 1u32..600
        ) {
            let current = current as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let years = years_tenths as f64 / 10.0;
            let target = future_value(current, rate, 365, years);

            let solved = years_to_target(current, target, 0.0, rate).as_years();
            prop_assert!((solved - years).abs() <= 0.01);
        }

        #[test]
        fn prop_years_to_target_is_zero_once_target_is_met(
            current in 0u32..2_000_000,
            shortfall in 0u32..2_000_000,
            contribution in 0u32..5_000,
            rate_bp in -500i32..1_500
        ) {
            let current = current as f64;
            let target = current - shortfall as f64;
            let result = years_to_target(current, target, contribution as f64, rate_bp as f64 / 10_000.0);
            prop_assert!(result == YearsToTarget::Achieved);
            prop_assert!(result.as_years() == 0.0);
        }
    }
}
