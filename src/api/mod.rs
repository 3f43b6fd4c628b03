use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    CalculationMethod, CdAccrualResult, CompoundingFrequency, InputError, UserFinancialInputs,
    calculate_cd_accrual, calculate_comprehensive_fire,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode result: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Daily,
    Monthly,
    Quarterly,
    Annually,
}

impl From<CliFrequency> for CompoundingFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Daily => CompoundingFrequency::Daily,
            CliFrequency::Monthly => CompoundingFrequency::Monthly,
            CliFrequency::Quarterly => CompoundingFrequency::Quarterly,
            CliFrequency::Annually => CompoundingFrequency::Annually,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fire-tracker",
    about = "FIRE target projections (Traditional, Coast, Barista) and CD interest accrual"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project FIRE targets and print them as JSON
    Fire(FireArgs),
    /// Accrue interest on a certificate of deposit and print it as JSON
    Cd(CdArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FireArgs {
    #[arg(long)]
    current_age: u32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(long)]
    annual_expenses: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Safe withdrawal rate in percent, e.g. 4"
    )]
    withdrawal_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual return in percent, e.g. 7"
    )]
    expected_return: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual inflation in percent; only used with --inflation-adjusted"
    )]
    inflation_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Reduced monthly contribution after downshifting to barista work"
    )]
    monthly_barista_contribution: f64,
    #[arg(long, default_value_t = 0.0)]
    portfolio_value: f64,
    #[arg(long, default_value_t = false)]
    inflation_adjusted: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CdArgs {
    #[arg(long)]
    principal: f64,
    #[arg(long, help = "Annual rate in percent, e.g. 4.5")]
    annual_rate: f64,
    #[arg(long, help = "Start date, YYYY-MM-DD")]
    start_date: String,
    #[arg(long, help = "Maturity date, YYYY-MM-DD")]
    maturity_date: String,
    #[arg(long, value_enum, default_value_t = CliFrequency::Daily)]
    frequency: CliFrequency,
    #[arg(long, help = "Valuation date, YYYY-MM-DD; defaults to today")]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FirePayload {
    current_age: Option<u32>,
    #[serde(alias = "targetRetirementAge")]
    retirement_age: Option<u32>,
    annual_expenses: Option<f64>,
    #[serde(alias = "safeWithdrawalRate")]
    withdrawal_rate: Option<f64>,
    #[serde(alias = "expectedAnnualReturn")]
    expected_return: Option<f64>,
    inflation_rate: Option<f64>,
    monthly_contribution: Option<f64>,
    monthly_barista_contribution: Option<f64>,
    #[serde(alias = "currentPortfolioValue")]
    portfolio_value: Option<f64>,
    inflation_adjusted: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CdPayload {
    principal: Option<f64>,
    annual_rate: Option<f64>,
    start_date: Option<String>,
    maturity_date: Option<String>,
    #[serde(alias = "frequency")]
    compounding_frequency: Option<CompoundingFrequency>,
    as_of: Option<NaiveDate>,
}

#[derive(Debug, PartialEq)]
struct FireRequest {
    inputs: UserFinancialInputs,
    method: CalculationMethod,
}

#[derive(Debug, PartialEq)]
struct CdRequest {
    principal: f64,
    annual_rate_percent: f64,
    start_date: String,
    maturity_date: String,
    frequency: CompoundingFrequency,
    as_of: NaiveDate,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve { port } => run_http_server(port).await?,
        Command::Fire(args) => {
            let request = build_fire_request(args)?;
            let result = calculate_comprehensive_fire(&request.inputs, request.method);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Cd(args) => {
            let request = build_cd_request(args)?;
            println!("{}", serde_json::to_string_pretty(&accrue_cd(&request))?);
        }
    }
    Ok(())
}

fn build_fire_request(args: FireArgs) -> Result<FireRequest, InputError> {
    let mut inputs = UserFinancialInputs::new(
        args.current_age,
        args.retirement_age,
        args.annual_expenses,
        args.withdrawal_rate / 100.0,
        args.expected_return / 100.0,
    );
    inputs.inflation_rate = args.inflation_rate / 100.0;
    inputs.monthly_contribution = args.monthly_contribution;
    inputs.monthly_barista_contribution = args.monthly_barista_contribution;
    inputs.current_portfolio_value = args.portfolio_value;
    inputs.validate()?;

    let method = if args.inflation_adjusted {
        CalculationMethod::InflationAdjusted
    } else {
        CalculationMethod::Simple
    };
    Ok(FireRequest { inputs, method })
}

fn build_cd_request(args: CdArgs) -> Result<CdRequest, InputError> {
    if !args.principal.is_finite() || args.principal < 0.0 {
        return Err(InputError::Negative("principal"));
    }
    if !args.annual_rate.is_finite() || args.annual_rate <= -100.0 {
        return Err(InputError::RateOutOfRange {
            field: "annual_rate",
            rate: args.annual_rate,
        });
    }
    Ok(CdRequest {
        principal: args.principal,
        annual_rate_percent: args.annual_rate,
        start_date: args.start_date,
        maturity_date: args.maturity_date,
        frequency: args.frequency.into(),
        as_of: args.as_of.unwrap_or_else(|| Local::now().date_naive()),
    })
}

fn accrue_cd(request: &CdRequest) -> CdAccrualResult {
    calculate_cd_accrual(
        request.principal,
        request.annual_rate_percent,
        &request.start_date,
        &request.maturity_date,
        request.frequency,
        request.as_of,
    )
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/fire", get(fire_get_handler).post(fire_post_handler))
        .route("/api/cd", get(cd_get_handler).post(cd_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn fire_get_handler(Query(payload): Query<FirePayload>) -> Response {
    fire_handler_impl(payload).await
}

async fn fire_post_handler(Json(payload): Json<FirePayload>) -> Response {
    fire_handler_impl(payload).await
}

async fn fire_handler_impl(payload: FirePayload) -> Response {
    let request = match fire_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };

    debug!(
        current_age = request.inputs.current_age,
        retirement_age = request.inputs.target_retirement_age,
        method = ?request.method,
        "computing FIRE projection"
    );
    let result = calculate_comprehensive_fire(&request.inputs, request.method);
    json_response(StatusCode::OK, result)
}

async fn cd_get_handler(Query(payload): Query<CdPayload>) -> Response {
    cd_handler_impl(payload).await
}

async fn cd_post_handler(Json(payload): Json<CdPayload>) -> Response {
    cd_handler_impl(payload).await
}

async fn cd_handler_impl(payload: CdPayload) -> Response {
    let request = match cd_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };

    debug!(
        principal = request.principal,
        frequency = ?request.frequency,
        as_of = %request.as_of,
        "computing CD accrual"
    );
    json_response(StatusCode::OK, accrue_cd(&request))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn default_fire_args_for_api() -> FireArgs {
    FireArgs {
        current_age: 30,
        retirement_age: 60,
        annual_expenses: 40_000.0,
        withdrawal_rate: 4.0,
        expected_return: 7.0,
        inflation_rate: 3.0,
        monthly_contribution: 0.0,
        monthly_barista_contribution: 0.0,
        portfolio_value: 0.0,
        inflation_adjusted: false,
    }
}

fn fire_request_from_payload(payload: FirePayload) -> Result<FireRequest, InputError> {
    let mut args = default_fire_args_for_api();

    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        args.retirement_age = v;
    }
    if let Some(v) = payload.annual_expenses {
        args.annual_expenses = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        args.withdrawal_rate = v;
    }
    if let Some(v) = payload.expected_return {
        args.expected_return = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.monthly_barista_contribution {
        args.monthly_barista_contribution = v;
    }
    if let Some(v) = payload.portfolio_value {
        args.portfolio_value = v;
    }
    if let Some(v) = payload.inflation_adjusted {
        args.inflation_adjusted = v;
    }

    build_fire_request(args)
}

fn cd_request_from_payload(payload: CdPayload) -> Result<CdRequest, InputError> {
    let args = CdArgs {
        principal: payload.principal.ok_or(InputError::Missing("principal"))?,
        annual_rate: payload.annual_rate.ok_or(InputError::Missing("annualRate"))?,
        start_date: payload.start_date.ok_or(InputError::Missing("startDate"))?,
        maturity_date: payload
            .maturity_date
            .ok_or(InputError::Missing("maturityDate"))?,
        frequency: CliFrequency::Daily,
        as_of: payload.as_of,
    };
    let mut request = build_cd_request(args)?;
    if let Some(frequency) = payload.compounding_frequency {
        request.frequency = frequency;
    }
    Ok(request)
}

#[cfg(test)]
fn fire_request_from_json(json: &str) -> Result<FireRequest, String> {
    let payload = serde_json::from_str::<FirePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    fire_request_from_payload(payload).map_err(|e| e.to_string())
}

#[cfg(test)]
fn cd_request_from_json(json: &str) -> Result<CdRequest, String> {
    let payload = serde_json::from_str::<CdPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    cd_request_from_payload(payload).map_err(|e| e.to_string())
}
