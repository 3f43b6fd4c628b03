use super::primitives::future_value;
use super::solver::{monthly_payment_needed, years_to_target};
use super::targets::{FireTargets, compute_targets};
use super::types::{
    CalculationMethod, ComprehensiveFireResult, FIRE_TYPE_PRIORITY, FireMetadata, FireMethod,
    FireSummary, FireTargetResult, FireType, GapAnalyses, InvestmentGapAnalysis,
    UserFinancialInputs, YearsToTarget,
};

pub fn calculate_comprehensive_fire(
    inputs: &UserFinancialInputs,
    method: CalculationMethod,
) -> ComprehensiveFireResult {
    let targets = compute_targets(inputs, method);
    let years_to_retirement = inputs.years_to_retirement();

    let traditional = evaluate_target(
        inputs,
        &targets,
        FireType::Traditional,
        targets.traditional,
        targets.traditional_method,
    );
    let coast = evaluate_target(
        inputs,
        &targets,
        FireType::Coast,
        targets.coast,
        targets.coast_method,
    );
    let barista = evaluate_target(
        inputs,
        &targets,
        FireType::Barista,
        targets.barista.target,
        targets.barista.method,
    );

    let gap_analysis = GapAnalyses {
        traditional: investment_gap(inputs.monthly_contribution, traditional.monthly_investment_needed),
        coast: investment_gap(inputs.monthly_contribution, coast.monthly_investment_needed),
        barista: investment_gap(inputs.monthly_contribution, barista.monthly_investment_needed),
    };

    let mut result = ComprehensiveFireResult {
        traditional,
        coast,
        barista,
        gap_analysis,
        coast_convergence: targets.coast_convergence.clone(),
        summary: FireSummary {
            fastest_to_reach: None,
            most_achievable: FireType::Coast,
            most_feasible: None,
        },
        metadata: FireMetadata {
            years_to_retirement,
            calculation_method: method,
            growth_rate_used: targets.growth_rate,
        },
    };
    result.summary = summarize(&result, inputs.current_portfolio_value);
    result
}

fn evaluate_target(
    inputs: &UserFinancialInputs,
    targets: &FireTargets,
    fire_type: FireType,
    target: f64,
    method: FireMethod,
) -> FireTargetResult {
    let current = inputs.current_portfolio_value;
    let years_to_retirement = inputs.years_to_retirement();
    let rate = targets.growth_rate;

    let achieved = match fire_type {
        // Coast is judged on where today's portfolio grows to, untouched.
        FireType::Coast => {
            future_value(current, rate, 1, years_to_retirement) >= targets.traditional
        }
        FireType::Traditional | FireType::Barista => current >= target,
    };

    let (years_remaining, monthly_investment_needed) = if achieved {
        (YearsToTarget::Achieved, 0.0)
    } else {
        (
            years_to_target(current, target, inputs.monthly_contribution, rate),
            monthly_payment_needed(current, target, years_to_retirement, rate),
        )
    };

    FireTargetResult {
        fire_type,
        target,
        future_target: match fire_type {
            FireType::Traditional => targets.traditional_future,
            FireType::Coast | FireType::Barista => None,
        },
        achieved,
        progress_percentage: progress_ratio(current, target).clamp(0.0, 100.0),
        years_remaining,
        monthly_investment_needed,
        method,
    }
}

/// Uncapped progress in percent. A zero target counts as complete and an
/// unbounded one as not started.
fn progress_ratio(current: f64, target: f64) -> f64 {
    if !target.is_finite() {
        return 0.0;
    }
    if target <= 0.0 {
        return 100.0;
    }
    current / target * 100.0
}

pub fn investment_gap(current_monthly: f64, needed_monthly: f64) -> InvestmentGapAnalysis {
    let monthly_gap = needed_monthly - current_monthly;
    let gap_percentage = if needed_monthly > 0.0 {
        monthly_gap / needed_monthly * 100.0
    } else {
        0.0
    };
    InvestmentGapAnalysis {
        current_monthly,
        needed_monthly,
        monthly_gap,
        gap_percentage,
        is_sufficient: monthly_gap <= 0.0,
        additional_needed: monthly_gap.max(0.0),
    }
}

fn summarize(result: &ComprehensiveFireResult, current: f64) -> FireSummary {
    let mut fastest: Option<(FireType, f64)> = None;
    let mut most_achievable = (FIRE_TYPE_PRIORITY[0], f64::NEG_INFINITY);
    for fire_type in FIRE_TYPE_PRIORITY {
        let target = result.result_for(fire_type);

        let years = target.years_remaining.as_years();
        if target.years_remaining.is_finite() && fastest.is_none_or(|(_, best)| years < best) {
            fastest = Some((fire_type, years));
        }

        let ratio = progress_ratio(current, target.target);
        if ratio > most_achievable.1 {
            most_achievable = (fire_type, ratio);
        }
    }

    let most_feasible = FIRE_TYPE_PRIORITY.into_iter().find(|&fire_type| {
        let gaps = &result.gap_analysis;
        match fire_type {
            FireType::Traditional => gaps.traditional.is_sufficient,
            FireType::Coast => gaps.coast.is_sufficient,
            FireType::Barista => gaps.barista.is_sufficient,
        }
    });

    FireSummary {
        fastest_to_reach: fastest.map(|(fire_type, _)| fire_type),
        most_achievable: most_achievable.0,
        most_feasible,
    }
}
