//! HTTP handler functions for the dashboard API.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use getaround_delay::DelayError;
use getaround_delay::stats::{self, DEFAULT_BIN_WIDTH};
use getaround_delay_models::SweepKind;
use getaround_server_models::{
    ApiError, ApiHealth, DistributionParams, FlexibilityParams, RentalsParams,
};

use crate::AppState;

/// Rows returned by `GET /api/rentals` without a `limit`.
const DEFAULT_RENTALS_LIMIT: usize = 100;

fn error_response(context: &str, e: &DelayError) -> HttpResponse {
    let status = match e {
        DelayError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        log::error!("{context}: {e}");
    } else {
        log::warn!("{context}: {e}");
    }

    HttpResponse::build(status).json(ApiError::new(e))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/rentals`
pub async fn rentals(
    state: web::Data<AppState>,
    params: web::Query<RentalsParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(DEFAULT_RENTALS_LIMIT);
    let rows = state.dataset.table.head(limit);
    log::debug!("Serving {} of {} rentals", rows.len(), state.dataset.table.len());
    HttpResponse::Ok().json(rows)
}

/// `GET /api/documentation`
pub async fn documentation(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.dataset.documentation)
}

/// `GET /api/overview`
pub async fn overview(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(stats::overview(&state.dataset.table))
}

/// `GET /api/distributions`
pub async fn distributions(
    state: web::Data<AppState>,
    params: web::Query<DistributionParams>,
) -> HttpResponse {
    let bin_width = params.bin_width.unwrap_or(DEFAULT_BIN_WIDTH);
    match stats::distributions(&state.dataset.table, bin_width) {
        Ok(distributions) => HttpResponse::Ok().json(distributions),
        Err(e) => error_response("Distributions failed", &e),
    }
}

/// `GET /api/cancelation-rates`
pub async fn cancelation_rates(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(stats::cancelation_rates(&state.dataset.table))
}

/// Computes (or reuses) one sweep on the blocking pool.
async fn sweep(state: web::Data<AppState>, kind: SweepKind, flexibility: u32) -> HttpResponse {
    let result = tokio::task::spawn_blocking(move || {
        state
            .cache
            .get_or_compute(&state.dataset.table, kind, flexibility)
    })
    .await;

    match result {
        Ok(Ok(sweep)) => HttpResponse::Ok().json(sweep.as_ref()),
        Ok(Err(e)) => error_response(&format!("{kind} sweep failed"), &e),
        Err(e) => {
            log::error!("Sweep task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Sweep task failed"))
        }
    }
}

/// `GET /api/sweeps/solved`
pub async fn sweep_solved(state: web::Data<AppState>) -> HttpResponse {
    sweep(state, SweepKind::Solved, 0).await
}

/// `GET /api/sweeps/affected`
pub async fn sweep_affected(
    state: web::Data<AppState>,
    params: web::Query<FlexibilityParams>,
) -> HttpResponse {
    let flexibility = params.flexibility.unwrap_or(SweepKind::DEFAULT_FLEXIBILITY);
    sweep(state, SweepKind::Affected, flexibility).await
}

/// `GET /api/sweeps/successful`
pub async fn sweep_successful(
    state: web::Data<AppState>,
    params: web::Query<FlexibilityParams>,
) -> HttpResponse {
    let flexibility = params.flexibility.unwrap_or(SweepKind::DEFAULT_FLEXIBILITY);
    sweep(state, SweepKind::Successful, flexibility).await
}
