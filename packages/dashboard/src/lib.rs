#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API behind the Getaround delay-analysis dashboard.
//!
//! The rental events workbook is downloaded and derived once at start-up.
//! Handlers read the shared table; threshold sweeps are computed on a
//! blocking thread and memoized per `(kind, flexibility)`.

mod handlers;
pub mod interactive;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use getaround_delay::DelayDataset;
use getaround_delay::cache::SweepCache;
use getaround_server_models::ApiError;
use getaround_source::DataLocation;

/// Hosted delay-analysis workbook.
pub const DELAY_DATA_URL: &str =
    "https://jedha-getaround-project.s3.amazonaws.com/get_around_delay_analysis.xlsx";

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8501;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Derived rental table and documentation sheet.
    pub dataset: DelayDataset,
    /// Sweeps already computed for `dataset.table`.
    pub cache: SweepCache,
}

impl AppState {
    #[must_use]
    pub fn new(dataset: DelayDataset) -> Self {
        Self {
            dataset,
            cache: SweepCache::new(),
        }
    }
}

/// Reads `DELAY_DATA_URL`, falling back to the hosted workbook.
#[must_use]
pub fn data_location_from_env() -> DataLocation {
    std::env::var("DELAY_DATA_URL")
        .map_or_else(|_| DataLocation::parse(DELAY_DATA_URL), |v| DataLocation::parse(&v))
}

/// Registers the `/api` routes and the query/body error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected query string: {err}");
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        actix_web::error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {err}");
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        actix_web::error::InternalError::from_response(err, response).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/rentals", web::get().to(handlers::rentals))
            .route("/documentation", web::get().to(handlers::documentation))
            .route("/overview", web::get().to(handlers::overview))
            .route("/distributions", web::get().to(handlers::distributions))
            .route("/cancelation-rates", web::get().to(handlers::cancelation_rates))
            .route("/sweeps/solved", web::get().to(handlers::sweep_solved))
            .route("/sweeps/affected", web::get().to(handlers::sweep_affected))
            .route("/sweeps/successful", web::get().to(handlers::sweep_successful)),
    );
}

/// Loads the workbook and starts the dashboard API.
///
/// Reads `BIND_ADDR` and `PORT` (default `127.0.0.1:8501`), the workbook
/// location from `DELAY_DATA_URL`, and the static asset directory from
/// `DASHBOARD_ASSETS_DIR` (default `assets`). This is a regular async
/// function; the caller provides the actix runtime.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the workbook cannot be loaded or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let location = data_location_from_env();
    log::info!("Loading rental events from {location}");

    let dataset = DelayDataset::fetch(&location).await.map_err(|e| {
        log::error!("Failed to load delay workbook: {e}");
        std::io::Error::other(e.to_string())
    })?;
    log::info!(
        "Derived {} rentals, {} documented fields",
        dataset.table.len(),
        dataset.documentation.len()
    );
    let state = web::Data::new(AppState::new(dataset));

    let assets_dir = std::env::var("DASHBOARD_ASSETS_DIR")
        .map_or_else(|_| PathBuf::from("assets"), PathBuf::from);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!(
        "Starting dashboard API on {bind_addr}:{port}, assets from {}",
        assets_dir.display()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            .service(Files::new("/assets", assets_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
