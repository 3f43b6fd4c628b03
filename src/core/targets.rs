use tracing::debug;

use super::primitives::{present_value_needed, real_return};
use super::solver::{
    CoastConvergeParams, ConvergenceConfig, barista_crossover_search, coast_fire_converge,
};
use super::types::{CalculationMethod, CoastConvergence, FireMethod, UserFinancialInputs};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationAdjustedTarget {
    /// In today's money; this is the figure progress is tracked against.
    pub current_purchasing_power: f64,
    /// Nominal amount needed at retirement.
    pub future_nominal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaristaTarget {
    pub target: f64,
    pub method: FireMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireTargets {
    pub traditional: f64,
    pub traditional_future: Option<f64>,
    pub traditional_method: FireMethod,
    pub coast: f64,
    pub coast_method: FireMethod,
    pub barista: BaristaTarget,
    pub coast_convergence: CoastConvergence,
    /// Annual rate all projections should grow at: nominal, or real when
    /// inflation-adjusted.
    pub growth_rate: f64,
}

/// Portfolio whose withdrawals at `safe_withdrawal_rate` cover
/// `annual_expenses`. A non-positive rate has no finite answer.
pub fn traditional_fire_target(annual_expenses: f64, safe_withdrawal_rate: f64) -> f64 {
    if safe_withdrawal_rate <= 0.0 {
        return f64::INFINITY;
    }
    (annual_expenses / safe_withdrawal_rate).max(0.0)
}

pub fn traditional_fire_target_with_inflation(
    annual_expenses: f64,
    safe_withdrawal_rate: f64,
    inflation_rate: f64,
    years_to_retirement: f64,
) -> InflationAdjustedTarget {
    let inflation_factor = (1.0 + inflation_rate).powf(years_to_retirement.max(0.0));
    InflationAdjustedTarget {
        current_purchasing_power: traditional_fire_target(annual_expenses, safe_withdrawal_rate),
        future_nominal: traditional_fire_target(
            annual_expenses * inflation_factor,
            safe_withdrawal_rate,
        ),
    }
}

/// Amount that, left alone, grows into `fire_number` by retirement.
///
/// Never exceeds `fire_number`: with non-positive growth there is nothing to
/// coast on and the full target is needed.
pub fn coast_fire_target(fire_number: f64, expected_return: f64, years_to_retirement: f64) -> f64 {
    if years_to_retirement <= 0.0 {
        return fire_number;
    }
    (fire_number / (1.0 + expected_return).powf(years_to_retirement)).clamp(0.0, fire_number.max(0.0))
}

pub fn coast_fire_target_with_inflation(
    fire_number: f64,
    nominal_return: f64,
    inflation_rate: f64,
    years_to_retirement: f64,
) -> f64 {
    coast_fire_target(
        fire_number,
        real_return(nominal_return, inflation_rate),
        years_to_retirement,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaristaInputs {
    pub traditional_target: f64,
    pub coast_target: f64,
    pub monthly_contribution: f64,
    pub monthly_barista_contribution: f64,
    pub years_to_retirement: f64,
    /// Years of full contributions before switching to the barista rate.
    pub years_until_downshift: f64,
}

/// Portfolio value at the downshift point that, with barista contributions
/// only, still grows into the traditional target by retirement. Always lies
/// within `[coast_target, traditional_target]`.
pub fn barista_fire_target(inputs: &BaristaInputs, expected_return: f64) -> BaristaTarget {
    let traditional = inputs.traditional_target;
    if !traditional.is_finite() || inputs.years_to_retirement <= 0.0 {
        return BaristaTarget {
            target: traditional,
            method: FireMethod::TraditionalFallback,
        };
    }

    if inputs.monthly_contribution <= 0.0 && inputs.monthly_barista_contribution <= 0.0 {
        return BaristaTarget {
            target: inputs.coast_target,
            method: FireMethod::CoastFallback,
        };
    }

    let horizon = (inputs.years_to_retirement - inputs.years_until_downshift.max(0.0)).max(0.0);
    let search = barista_crossover_search(
        traditional,
        inputs.monthly_barista_contribution,
        expected_return,
        horizon,
    );
    let (raw, method) = if search.converged {
        (search.value, FireMethod::CrossoverSearch)
    } else {
        debug!(
            traditional,
            horizon, "barista search did not converge; using present value of the barista stream"
        );
        (
            present_value_needed(
                traditional,
                inputs.monthly_barista_contribution,
                expected_return,
                horizon,
            ),
            FireMethod::AnnuityFallback,
        )
    };

    BaristaTarget {
        target: clamp_between(raw, inputs.coast_target, traditional),
        method,
    }
}

pub fn barista_fire_target_with_inflation(
    inputs: &BaristaInputs,
    nominal_return: f64,
    inflation_rate: f64,
) -> BaristaTarget {
    barista_fire_target(inputs, real_return(nominal_return, inflation_rate))
}

/// All three targets for one set of inputs.
///
/// The barista horizon starts where the coast convergence says full
/// contributions can stop.
pub fn compute_targets(inputs: &UserFinancialInputs, method: CalculationMethod) -> FireTargets {
    let years = inputs.years_to_retirement();
    let (traditional, traditional_future, traditional_method, coast, coast_method, growth_rate) =
        match method {
            CalculationMethod::Simple => {
                let traditional =
                    traditional_fire_target(inputs.annual_expenses, inputs.safe_withdrawal_rate);
                (
                    traditional,
                    None,
                    FireMethod::WithdrawalRule,
                    coast_fire_target(traditional, inputs.expected_annual_return, years),
                    FireMethod::GrowthOnlyDiscount,
                    inputs.expected_annual_return,
                )
            }
            CalculationMethod::InflationAdjusted => {
                let adjusted = traditional_fire_target_with_inflation(
                    inputs.annual_expenses,
                    inputs.safe_withdrawal_rate,
                    inputs.inflation_rate,
                    years,
                );
                let tracked = adjusted.current_purchasing_power;
                (
                    tracked,
                    Some(adjusted.future_nominal),
                    FireMethod::WithdrawalRuleInflationAdjusted,
                    coast_fire_target_with_inflation(
                        tracked,
                        inputs.expected_annual_return,
                        inputs.inflation_rate,
                        years,
                    ),
                    FireMethod::RealReturnDiscount,
                    real_return(inputs.expected_annual_return, inputs.inflation_rate),
                )
            }
        };

    let coast_convergence = coast_fire_converge(
        &CoastConvergeParams {
            current_age: inputs.current_age,
            current_portfolio: inputs.current_portfolio_value,
            monthly_contribution: inputs.monthly_contribution,
            monthly_barista_contribution: inputs.monthly_barista_contribution,
            annual_return: growth_rate,
            years_to_retirement: years,
            fire_target: traditional,
        },
        ConvergenceConfig::default(),
    );

    let barista_inputs = BaristaInputs {
        traditional_target: traditional,
        coast_target: coast,
        monthly_contribution: inputs.monthly_contribution,
        monthly_barista_contribution: inputs.monthly_barista_contribution,
        years_to_retirement: years,
        years_until_downshift: coast_convergence.years_saving,
    };
    let barista = match method {
        CalculationMethod::Simple => {
            barista_fire_target(&barista_inputs, inputs.expected_annual_return)
        }
        CalculationMethod::InflationAdjusted => barista_fire_target_with_inflation(
            &barista_inputs,
            inputs.expected_annual_return,
            inputs.inflation_rate,
        ),
    };

    FireTargets {
        traditional,
        traditional_future,
        traditional_method,
        coast,
        coast_method,
        barista,
        coast_convergence,
        growth_rate,
    }
}

fn clamp_between(value: f64, lower: f64, upper: f64) -> f64 {
    if !(lower <= upper) {
        return upper;
    }
    value.clamp(lower, upper)
}
