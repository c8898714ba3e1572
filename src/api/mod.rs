use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    AdjustedRunway, AnchorMarker, DEFAULT_SURVIVAL_SIMULATIONS, KpiSnapshot, LeverState,
    PercentileBand, RunwayBaseline, ScenarioAnchor, ScenarioAnchors, ScenarioName, ScenarioOutlook,
    SimulationConfig, SimulationInput, SurvivalReport, anchor_markers, derive_drift, recompute,
    recompute_on, simulate, simulate_with_rng, stress_test, survival_analysis,
};

mod cli;
mod error;

pub use cli::{Cli, Command, run};
pub use error::{ApiError, Result};

const MAX_PATH_COUNT: usize = 20_000;
const MAX_HORIZON_STEPS: usize = 520;
const MAX_SURVIVAL_SIMULATIONS: u32 = 50_000;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(long, help = "Revenue at step 0")]
    pub start_value: f64,
    #[arg(long, help = "Base scenario target six steps ahead; drives the drift")]
    pub base_target6: Option<f64>,
    #[arg(long, help = "Bear scenario target six steps ahead (annotation only)")]
    pub bear_target6: Option<f64>,
    #[arg(long, help = "Bull scenario target six steps ahead (annotation only)")]
    pub bull_target6: Option<f64>,
    #[arg(long, default_value_t = SimulationConfig::default().horizon_steps)]
    pub horizon_steps: usize,
    #[arg(long, default_value_t = SimulationConfig::default().path_count)]
    pub path_count: usize,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Per-step volatility in percent, e.g. 8"
    )]
    pub volatility: f64,
    #[arg(long, help = "Seed for a reproducible run; omitted means ambient randomness")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct LeverArgs {
    #[arg(long)]
    pub months_runway: f64,
    #[arg(long, default_value_t = 0.0)]
    pub weekly_burn: f64,
    #[arg(long, default_value_t = 0.0)]
    pub weekly_revenue: f64,
    #[arg(long, default_value_t = 0.0, help = "Burn cut in percent (0-60)")]
    pub burn_cut: f64,
    #[arg(long, default_value_t = 0.0, help = "Revenue growth in percent (0-100)")]
    pub revenue_growth: f64,
    #[arg(long, help = "Projection start date (YYYY-MM-DD); defaults to today")]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulateRequest {
    pub input: SimulationInput,
    pub anchors: Option<ScenarioAnchors>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct LeverRequest {
    pub baseline: RunwayBaseline,
    pub levers: LeverState,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct StressRequest {
    pub snapshots: Vec<KpiSnapshot>,
    pub simulations: u32,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    start_value: Option<f64>,
    base_target6: Option<f64>,
    bear_target6: Option<f64>,
    bull_target6: Option<f64>,
    horizon_steps: Option<usize>,
    path_count: Option<usize>,
    volatility: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LeverPayload {
    months_runway: Option<f64>,
    weekly_burn: Option<f64>,
    weekly_revenue: Option<f64>,
    burn_cut_pct: Option<f64>,
    revenue_growth_pct: Option<f64>,
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressPayload {
    pub snapshots: Vec<KpiSnapshot>,
    #[serde(default)]
    pub simulations: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub start_value: f64,
    pub horizon_steps: usize,
    pub path_count: usize,
    pub volatility_per_step: f64,
    pub drift_per_step: Option<f64>,
    pub anchor_markers: Vec<AnchorMarker>,
    pub bands: Vec<PercentileBand>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverResponse {
    pub baseline: RunwayBaseline,
    pub levers: LeverState,
    #[serde(flatten)]
    pub adjusted: AdjustedRunway,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResponse {
    pub scenarios: Vec<ScenarioOutlook>,
    pub anchors: ScenarioAnchors,
    pub baseline: Option<RunwayBaseline>,
    pub survival: Option<SurvivalReport>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn require_finite(value: f64, flag: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ApiError::invalid(format!("{flag} must be a finite number")))
    }
}

fn optional_anchor(value: Option<f64>, flag: &str) -> Result<Option<ScenarioAnchor>> {
    value
        .map(|target6| require_finite(target6, flag).map(|target6| ScenarioAnchor { target6 }))
        .transpose()
}

pub fn build_simulation(args: SimulateArgs) -> Result<SimulateRequest> {
    let start_value = require_finite(args.start_value, "--start-value")?;
    let volatility = require_finite(args.volatility, "--volatility")?;
    if volatility < 0.0 {
        return Err(ApiError::invalid("--volatility must be >= 0"));
    }
    if args.path_count == 0 || args.path_count > MAX_PATH_COUNT {
        return Err(ApiError::invalid(format!(
            "--path-count must be between 1 and {MAX_PATH_COUNT}"
        )));
    }
    if args.horizon_steps > MAX_HORIZON_STEPS {
        return Err(ApiError::invalid(format!(
            "--horizon-steps must be <= {MAX_HORIZON_STEPS}"
        )));
    }

    let anchors = ScenarioAnchors {
        bear: optional_anchor(args.bear_target6, "--bear-target6")?,
        base: optional_anchor(args.base_target6, "--base-target6")?,
        bull: optional_anchor(args.bull_target6, "--bull-target6")?,
    };
    let anchors = (anchors != ScenarioAnchors::default()).then_some(anchors);

    Ok(SimulateRequest {
        input: SimulationInput {
            start_value,
            horizon_steps: args.horizon_steps,
            drift_per_step: 0.0,
            volatility_per_step: volatility / 100.0,
            path_count: args.path_count,
        },
        anchors,
        seed: args.seed,
    })
}

pub fn build_levers(args: LeverArgs) -> Result<LeverRequest> {
    let baseline = RunwayBaseline {
        months_runway: require_finite(args.months_runway, "--months-runway")?,
        weekly_burn: require_finite(args.weekly_burn, "--weekly-burn")?,
        weekly_revenue: require_finite(args.weekly_revenue, "--weekly-revenue")?,
    };
    let burn_cut = require_finite(args.burn_cut, "--burn-cut")?;
    let revenue_growth = require_finite(args.revenue_growth, "--revenue-growth")?;

    Ok(LeverRequest {
        baseline,
        levers: LeverState::new(burn_cut, revenue_growth),
        today: args.today,
    })
}

pub fn build_stress(payload: StressPayload) -> Result<StressRequest> {
    let simulations = payload.simulations.unwrap_or(DEFAULT_SURVIVAL_SIMULATIONS);
    if simulations == 0 || simulations > MAX_SURVIVAL_SIMULATIONS {
        return Err(ApiError::invalid(format!(
            "simulations must be between 1 and {MAX_SURVIVAL_SIMULATIONS}"
        )));
    }
    for (i, snapshot) in payload.snapshots.iter().enumerate() {
        if !snapshot.mrr.is_finite() || !snapshot.burn_rate.is_finite() {
            return Err(ApiError::invalid(format!(
                "snapshot {i} must have finite mrr and burnRate"
            )));
        }
    }

    Ok(StressRequest {
        snapshots: payload.snapshots,
        simulations,
        seed: payload.seed,
    })
}

pub fn run_simulation(request: &SimulateRequest) -> SimulateResponse {
    let input = &request.input;
    let anchors = request.anchors.as_ref();
    let bands = match request.seed {
        Some(seed) => simulate_with_rng(input, anchors, &mut StdRng::seed_from_u64(seed)),
        None => simulate(input, anchors),
    };
    let drift_per_step = anchors
        .and_then(|a| a.base)
        .filter(|_| !bands.is_empty())
        .map(|base| derive_drift(input.start_value, base.target6));
    let anchor_markers = match (anchors, bands.is_empty()) {
        (Some(a), false) => anchor_markers(a, input.horizon_steps),
        _ => Vec::new(),
    };

    SimulateResponse {
        start_value: input.start_value,
        horizon_steps: input.horizon_steps,
        path_count: input.path_count,
        volatility_per_step: input.volatility_per_step,
        drift_per_step,
        anchor_markers,
        bands,
    }
}

pub fn run_levers(request: &LeverRequest) -> LeverResponse {
    let adjusted = match request.today {
        Some(today) => recompute_on(&request.baseline, &request.levers, today),
        None => recompute(&request.baseline, &request.levers),
    };
    LeverResponse {
        baseline: request.baseline,
        levers: request.levers,
        adjusted,
    }
}

pub fn run_stress(request: &StressRequest) -> StressResponse {
    let scenarios = stress_test(&request.snapshots);
    let anchors = ScenarioAnchors::from_outlooks(&scenarios);
    let baseline = scenarios
        .iter()
        .find(|o| o.scenario == ScenarioName::Base)
        .map(RunwayBaseline::from_outlook);
    let survival = match request.seed {
        Some(seed) => survival_analysis(
            &request.snapshots,
            request.simulations,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => survival_analysis(
            &request.snapshots,
            request.simulations,
            &mut rand::thread_rng(),
        ),
    };

    StressResponse {
        scenarios,
        anchors,
        baseline,
        survival,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "runway HTTP API listening");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/levers",
            get(levers_get_handler).post(levers_post_handler),
        )
        .route("/api/stress", post(stress_handler))
        .fallback(not_found_handler)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match simulate_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected simulate request");
            return err.into_response();
        }
    };
    json_response(StatusCode::OK, run_simulation(&request))
}

async fn levers_get_handler(Query(payload): Query<LeverPayload>) -> Response {
    levers_handler_impl(payload)
}

async fn levers_post_handler(Json(payload): Json<LeverPayload>) -> Response {
    levers_handler_impl(payload)
}

fn levers_handler_impl(payload: LeverPayload) -> Response {
    match lever_request_from_payload(payload) {
        Ok(request) => json_response(StatusCode::OK, run_levers(&request)),
        Err(err) => {
            warn!(error = %err, "rejected levers request");
            err.into_response()
        }
    }
}

async fn stress_handler(Json(payload): Json<StressPayload>) -> Response {
    match build_stress(payload) {
        Ok(request) => json_response(StatusCode::OK, run_stress(&request)),
        Err(err) => {
            warn!(error = %err, "rejected stress request");
            err.into_response()
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

fn default_simulate_args() -> SimulateArgs {
    let config = SimulationConfig::default();
    SimulateArgs {
        start_value: 0.0,
        base_target6: None,
        bear_target6: None,
        bull_target6: None,
        horizon_steps: config.horizon_steps,
        path_count: config.path_count,
        volatility: config.volatility_per_step * 100.0,
        seed: None,
    }
}

fn default_lever_args() -> LeverArgs {
    LeverArgs {
        months_runway: 0.0,
        weekly_burn: 0.0,
        weekly_revenue: 0.0,
        burn_cut: 0.0,
        revenue_growth: 0.0,
        today: None,
    }
}

fn simulate_request_from_payload(payload: SimulatePayload) -> Result<SimulateRequest> {
    let mut args = default_simulate_args();
    if let Some(v) = payload.start_value {
        args.start_value = v;
    }
    args.base_target6 = payload.base_target6;
    args.bear_target6 = payload.bear_target6;
    args.bull_target6 = payload.bull_target6;
    if let Some(v) = payload.horizon_steps {
        args.horizon_steps = v;
    }
    if let Some(v) = payload.path_count {
        args.path_count = v;
    }
    if let Some(v) = payload.volatility {
        args.volatility = v;
    }
    args.seed = payload.seed;

    build_simulation(args)
}

fn lever_request_from_payload(payload: LeverPayload) -> Result<LeverRequest> {
    let mut args = default_lever_args();
    let Some(months) = payload.months_runway else {
        return Err(ApiError::invalid("monthsRunway is required"));
    };
    args.months_runway = months;
    if let Some(v) = payload.weekly_burn {
        args.weekly_burn = v;
    }
    if let Some(v) = payload.weekly_revenue {
        args.weekly_revenue = v;
    }
    if let Some(v) = payload.burn_cut_pct {
        args.burn_cut = v;
    }
    if let Some(v) = payload.revenue_growth_pct {
        args.revenue_growth = v;
    }
    args.today = payload.today;

    build_levers(args)
}
