use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::primitives::future_value;
use super::types::CdAccrualResult;

/// Day-count basis for converting elapsed days into years.
const DAYS_PER_YEAR_ACTUAL: f64 = 365.25;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundingFrequency {
    #[default]
    Daily,
    Monthly,
    Quarterly,
    #[serde(alias = "annual", alias = "yearly")]
    Annually,
}

impl CompoundingFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Daily => 365,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::Annually => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CdDateError {
    #[error("invalid {field} '{value}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
    Unparseable { field: &'static str, value: String },
    #[error("maturity_date {maturity} is before start_date {start}")]
    MaturityBeforeStart { start: NaiveDate, maturity: NaiveDate },
}

/// Interest accrued on a certificate of deposit as of `as_of`.
///
/// Never fails: unparseable or inverted dates produce a principal-only
/// result with `error` set.
pub fn calculate_cd_accrual(
    principal: f64,
    annual_rate_percent: f64,
    start_date: &str,
    maturity_date: &str,
    frequency: CompoundingFrequency,
    as_of: NaiveDate,
) -> CdAccrualResult {
    match parse_term(start_date, maturity_date) {
        Ok((start, maturity)) => {
            accrue(principal, annual_rate_percent, start, maturity, frequency, as_of)
        }
        Err(err) => {
            warn!(%err, "CD accrual falling back to principal");
            CdAccrualResult {
                principal,
                current_value: principal,
                accrued_interest: 0.0,
                elapsed_days: 0,
                total_days: 0,
                maturity_value: principal,
                effective_annual_rate: 0.0,
                is_matured: false,
                error: Some(err.to_string()),
            }
        }
    }
}

/// [`calculate_cd_accrual`] evaluated at today's local date.
pub fn calculate_cd_accrual_today(
    principal: f64,
    annual_rate_percent: f64,
    start_date: &str,
    maturity_date: &str,
    frequency: CompoundingFrequency,
) -> CdAccrualResult {
    calculate_cd_accrual(
        principal,
        annual_rate_percent,
        start_date,
        maturity_date,
        frequency,
        Local::now().date_naive(),
    )
}

fn accrue(
    principal: f64,
    annual_rate_percent: f64,
    start: NaiveDate,
    maturity: NaiveDate,
    frequency: CompoundingFrequency,
    as_of: NaiveDate,
) -> CdAccrualResult {
    let rate = annual_rate_percent / 100.0;
    let periods = frequency.periods_per_year();

    let total_days = (maturity - start).num_days();
    let elapsed_days = (as_of - start).num_days().min(total_days);

    let maturity_value = future_value(
        principal,
        rate,
        periods,
        total_days as f64 / DAYS_PER_YEAR_ACTUAL,
    );
    let current_value = if elapsed_days <= 0 {
        principal
    } else {
        future_value(
            principal,
            rate,
            periods,
            elapsed_days as f64 / DAYS_PER_YEAR_ACTUAL,
        )
    };

    let n = f64::from(periods);
    CdAccrualResult {
        principal,
        current_value,
        accrued_interest: current_value - principal,
        elapsed_days: elapsed_days.max(0),
        total_days,
        maturity_value,
        effective_annual_rate: ((1.0 + rate / n).powf(n) - 1.0) * 100.0,
        is_matured: as_of >= maturity,
        error: None,
    }
}

fn parse_term(
    start_date: &str,
    maturity_date: &str,
) -> Result<(NaiveDate, NaiveDate), CdDateError> {
    let start = parse_date("start_date", start_date)?;
    let maturity = parse_date("maturity_date", maturity_date)?;
    if maturity < start {
        return Err(CdDateError::MaturityBeforeStart { start, maturity });
    }
    Ok((start, maturity))
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, CdDateError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| CdDateError::Unparseable {
            field,
            value: value.to_string(),
        })
}
