use serde::Serialize;
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FireType {
    Traditional,
    Coast,
    Barista,
}

/// Order used to break ties between FIRE types in summaries.
pub const FIRE_TYPE_PRIORITY: [FireType; 3] =
    [FireType::Coast, FireType::Barista, FireType::Traditional];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CalculationMethod {
    Simple,
    InflationAdjusted,
}

/// Which formula produced a target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMethod {
    WithdrawalRule,
    WithdrawalRuleInflationAdjusted,
    GrowthOnlyDiscount,
    RealReturnDiscount,
    CrossoverSearch,
    CoastFallback,
    AnnuityFallback,
    /// No horizon to downshift over; the traditional figure is used as is.
    TraditionalFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserFinancialInputs {
    pub current_age: u32,
    pub target_retirement_age: u32,
    pub annual_expenses: f64,
    pub safe_withdrawal_rate: f64,
    pub expected_annual_return: f64,
    pub inflation_rate: f64,
    pub monthly_contribution: f64,
    pub monthly_barista_contribution: f64,
    pub current_portfolio_value: f64,
}

impl UserFinancialInputs {
    /// Required fields only; contributions, inflation and portfolio start at zero.
    pub fn new(
        current_age: u32,
        target_retirement_age: u32,
        annual_expenses: f64,
        safe_withdrawal_rate: f64,
        expected_annual_return: f64,
    ) -> Self {
        Self {
            current_age,
            target_retirement_age,
            annual_expenses,
            safe_withdrawal_rate,
            expected_annual_return,
            inflation_rate: 0.0,
            monthly_contribution: 0.0,
            monthly_barista_contribution: 0.0,
            current_portfolio_value: 0.0,
        }
    }

    pub fn years_to_retirement(&self) -> f64 {
        (i64::from(self.target_retirement_age) - i64::from(self.current_age)) as f64
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.target_retirement_age <= self.current_age {
            return Err(InputError::RetirementAgeNotAfterCurrentAge {
                current_age: self.current_age,
                retirement_age: self.target_retirement_age,
            });
        }
        if !self.annual_expenses.is_finite() || self.annual_expenses <= 0.0 {
            return Err(InputError::NonPositive("annual_expenses"));
        }
        if !(self.safe_withdrawal_rate > 0.0 && self.safe_withdrawal_rate < 1.0) {
            return Err(InputError::WithdrawalRateOutOfRange(
                self.safe_withdrawal_rate,
            ));
        }
        for (field, rate) in [
            ("expected_annual_return", self.expected_annual_return),
            ("inflation_rate", self.inflation_rate),
        ] {
            if !rate.is_finite() || rate <= -1.0 {
                return Err(InputError::RateOutOfRange { field, rate });
            }
        }
        for (field, amount) in [
            ("monthly_contribution", self.monthly_contribution),
            (
                "monthly_barista_contribution",
                self.monthly_barista_contribution,
            ),
            ("current_portfolio_value", self.current_portfolio_value),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(InputError::Negative(field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("target retirement age ({retirement_age}) must be greater than current age ({current_age})")]
    RetirementAgeNotAfterCurrentAge {
        current_age: u32,
        retirement_age: u32,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must be a positive amount")]
    NonPositive(&'static str),
    #[error("{0} must be a non-negative amount")]
    Negative(&'static str),
    #[error("safe withdrawal rate must be between 0 and 1 (exclusive), got {0}")]
    WithdrawalRateOutOfRange(f64),
    #[error("{field} must be greater than -100%, got {rate}")]
    RateOutOfRange { field: &'static str, rate: f64 },
}

/// Outcome of a time-to-target search.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "years", rename_all = "camelCase")]
pub enum YearsToTarget {
    Achieved,
    Years(f64),
    /// The target is not reached within the search ceiling.
    BeyondHorizon,
    /// No growth and no contributions: the target is never reached.
    Unreachable,
}

impl YearsToTarget {
    pub fn as_years(self) -> f64 {
        match self {
            YearsToTarget::Achieved => 0.0,
            YearsToTarget::Years(years) => years,
            YearsToTarget::BeyondHorizon | YearsToTarget::Unreachable => f64::INFINITY,
        }
    }

    pub fn is_finite(self) -> bool {
        matches!(self, YearsToTarget::Achieved | YearsToTarget::Years(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireTargetResult {
    pub fire_type: FireType,
    pub target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub future_target: Option<f64>,
    pub achieved: bool,
    pub progress_percentage: f64,
    pub years_remaining: YearsToTarget,
    pub monthly_investment_needed: f64,
    pub method: FireMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentGapAnalysis {
    pub current_monthly: f64,
    pub needed_monthly: f64,
    pub monthly_gap: f64,
    pub gap_percentage: f64,
    pub is_sufficient: bool,
    pub additional_needed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoastConvergence {
    pub possible: bool,
    pub years_saving: f64,
    pub coast_age: f64,
    pub portfolio_at_coast: f64,
    pub projected_final_value: f64,
    pub iterations_run: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalyses {
    pub traditional: InvestmentGapAnalysis,
    pub coast: InvestmentGapAnalysis,
    pub barista: InvestmentGapAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireSummary {
    pub fastest_to_reach: Option<FireType>,
    pub most_achievable: FireType,
    pub most_feasible: Option<FireType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireMetadata {
    pub years_to_retirement: f64,
    pub calculation_method: CalculationMethod,
    pub growth_rate_used: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveFireResult {
    pub traditional: FireTargetResult,
    pub coast: FireTargetResult,
    pub barista: FireTargetResult,
    pub gap_analysis: GapAnalyses,
    pub coast_convergence: CoastConvergence,
    pub summary: FireSummary,
    pub metadata: FireMetadata,
}

impl ComprehensiveFireResult {
    pub fn result_for(&self, fire_type: FireType) -> &FireTargetResult {
        match fire_type {
            FireType::Traditional => &self.traditional,
            FireType::Coast => &self.coast,
            FireType::Barista => &self.barista,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdAccrualResult {
    pub principal: f64,
    pub current_value: f64,
    pub accrued_interest: f64,
    pub elapsed_days: i64,
    pub total_days: i64,
    pub maturity_value: f64,
    /// Annual percentage yield, in percent.
    pub effective_annual_rate: f64,
    pub is_matured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
