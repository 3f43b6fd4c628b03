mod cd;
mod engine;
mod primitives;
mod solver;
mod targets;
mod types;

pub use cd::{CdDateError, CompoundingFrequency, calculate_cd_accrual, calculate_cd_accrual_today};
pub use engine::{calculate_comprehensive_fire, investment_gap};
pub use primitives::{
    future_value, future_value_of_series, monthly_to_daily, present_value_needed, real_return,
};
pub use solver::{
    CoastConvergeParams, ConvergenceConfig, CrossoverSearch, barista_crossover_search,
    coast_fire_converge, monthly_payment_needed, years_to_target,
};
pub use targets::{
    BaristaInputs, BaristaTarget, FireTargets, InflationAdjustedTarget, barista_fire_target,
    barista_fire_target_with_inflation, coast_fire_target, coast_fire_target_with_inflation,
    compute_targets, traditional_fire_target, traditional_fire_target_with_inflation,
};
pub use types::{
    CalculationMethod, CdAccrualResult, CoastConvergence, ComprehensiveFireResult, FireMetadata,
    FireMethod, FireSummary, FireTargetResult, FireType, GapAnalyses, InputError,
    InvestmentGapAnalysis, UserFinancialInputs, YearsToTarget,
};
