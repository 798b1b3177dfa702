#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API for Getaround rental-price prediction.
//!
//! Serves read-only lookups over the hosted listings CSV (random preview,
//! search by model, car type, or fuel) and a prediction endpoint backed by
//! the preprocessor and SVR artifacts on local disk. Nothing is cached:
//! every lookup re-downloads the dataset and every prediction re-reads the
//! artifacts.

mod handlers;
pub mod interactive;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use getaround_server_models::ApiError;
use getaround_source::DataLocation;

/// Hosted pricing dataset.
pub const PRICING_DATA_URL: &str =
    "https://jedha-getaround-project.s3.amazonaws.com/pricing_data_cleaned.csv";

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 4000;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Listings CSV, remote or local.
    pub data_location: DataLocation,
    /// Directory holding `preprocessor.json` and `svr_model.json`.
    pub artifact_dir: PathBuf,
}

impl AppState {
    /// Reads `PRICING_DATA_URL` and `ARTIFACT_DIR`, falling back to the
    /// hosted dataset and the working directory.
    #[must_use]
    pub fn from_env() -> Self {
        let data_location = std::env::var("PRICING_DATA_URL")
            .map_or_else(|_| DataLocation::parse(PRICING_DATA_URL), |v| DataLocation::parse(&v));
        let artifact_dir = std::env::var("ARTIFACT_DIR")
            .map_or_else(|_| PathBuf::from("."), PathBuf::from);
        Self {
            data_location,
            artifact_dir,
        }
    }
}

/// Registers every route and the query string and JSON body error
/// handlers.
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
    .route("/", web::get().to(handlers::index))
    .route("/docs", web::get().to(handlers::docs))
    .route("/health", web::get().to(handlers::health))
    .route("/preview", web::get().to(handlers::preview))
    .route("/Search_model/{model_key}", web::get().to(handlers::search_model))
    .route("/Search_type/{car_type}", web::get().to(handlers::search_type))
    .route("/Search_fuel/{fuel}", web::get().to(handlers::search_fuel))
    .route("/predict", web::post().to(handlers::predict));
}

/// Starts the prediction API.
///
/// Reads `BIND_ADDR` and `PORT` (default `127.0.0.1:4000`) plus the
/// variables read by [`AppState::from_env`]. This is a regular async
/// function; the caller provides the actix runtime.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let state = AppState::from_env();
    log::info!(
        "Serving listings from {} with artifacts in {}",
        state.data_location,
        state.artifact_dir.display()
    );
    let state = web::Data::new(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting pricing API on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use getaround_pricing::artifacts::fit_pipeline;
    use getaround_pricing::dataset::ListingTable;
    use getaround_pricing::svr::SvrParams;
    use getaround_pricing_models::{CarType, Fuel, ListingCategory as _, ModelKey};
    use serde_json::{Value, json};

    use super::*;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/listings.csv");

    fn state(artifact_dir: &Path) -> web::Data<AppState> {
        web::Data::new(AppState {
            data_location: DataLocation::parse(FIXTURE),
            artifact_dir: artifact_dir.to_path_buf(),
        })
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "getaround_server_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn fitted_artifacts(name: &str) -> PathBuf {
        let dir = temp_dir(name);
        let bytes = std::fs::read(FIXTURE).unwrap();
        let table = ListingTable::from_csv_bytes(&bytes).unwrap();
        fit_pipeline(table.listings(), &SvrParams::default())
            .unwrap()
            .save(&dir)
            .unwrap();
        dir
    }

    fn porsche() -> Value {
        json!({
            "model_key": "Porsche",
            "mileage": 30000,
            "engine_power": 220,
            "fuel": "diesel",
            "paint_color": "black",
            "car_type": "sedan",
            "private_parking_available": true,
            "has_gps": false,
            "has_air_conditioning": true,
            "automatic_car": false,
            "has_getaround_connect": true,
            "has_speed_regulator": true,
            "winter_tires": true
        })
    }

    fn row_count(body: &Value) -> usize {
        body["model_key"].as_object().map_or(0, serde_json::Map::len)
    }

    fn encode(segment: &str) -> String {
        segment.replace(' ', "%20").replace('ë', "%C3%AB")
    }

    #[actix_web::test]
    async fn index_returns_greeting_string() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert!(body.as_str().unwrap().starts_with("Welcome to the Getaround API!"));
    }

    #[actix_web::test]
    async fn preview_returns_ten_rows() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/preview").to_request(),
        )
        .await;
        assert_eq!(row_count(&body), 10);
    }

    #[actix_web::test]
    async fn seeded_preview_is_reproducible() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let first: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/preview?seed=3").to_request(),
        )
        .await;
        let second: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/preview?seed=3").to_request(),
        )
        .await;
        assert_eq!(first, second);
    }

    #[actix_web::test]
    async fn malformed_seed_is_a_json_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/preview?seed=abc").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn docs_list_every_route_once() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/docs").to_request())
                .await;
        let listed: Vec<(String, String)> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| {
                (
                    e["method"].as_str().unwrap().to_string(),
                    e["path"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        let expected = [
            ("GET", "/"),
            ("GET", "/docs"),
            ("GET", "/preview"),
            ("GET", "/Search_model/{model_key}"),
            ("GET", "/Search_type/{car_type}"),
            ("GET", "/Search_fuel/{fuel}"),
            ("POST", "/predict"),
            ("GET", "/health"),
        ];
        assert_eq!(listed.len(), expected.len());
        for (method, path) in expected {
            assert!(
                listed.iter().any(|(m, p)| m == method && p == path),
                "{method} {path} missing from /docs"
            );
        }
    }

    #[actix_web::test]
    async fn every_allowed_model_filters_exactly() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        for model in ModelKey::all() {
            let uri = format!("/Search_model/{}", encode(model.as_ref()));
            let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request())
                .await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            if let Some(keys) = body["model_key"].as_object() {
                assert!(keys.values().all(|v| v == model.as_ref()));
            }
        }
    }

    #[actix_web::test]
    async fn car_type_and_fuel_searches_filter_exactly() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        for car_type in CarType::all() {
            let uri = format!("/Search_type/{}", car_type.as_ref());
            let body: Value =
                test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                    .await;
            let values = body["car_type"].as_object().unwrap();
            assert!(values.values().all(|v| v == car_type.as_ref()));
        }
        for fuel in Fuel::all() {
            let uri = format!("/Search_fuel/{}", fuel.as_ref());
            let body: Value =
                test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                    .await;
            let values = body["fuel"].as_object().unwrap();
            assert!(values.values().all(|v| v == fuel.as_ref()));
        }
    }

    #[actix_web::test]
    async fn search_keeps_source_row_indices() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/Search_model/BMW").to_request(),
        )
        .await;
        assert_eq!(body["model_key"], json!({"5": "BMW", "6": "BMW"}));
    }

    #[actix_web::test]
    async fn invalid_categories_are_bad_requests() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let cases = [
            ("/Search_model/Tesla", "You entered an input outside the allowed list of keys"),
            ("/Search_model/bmw", "You entered an input outside the allowed list of keys"),
            ("/Search_type/truck", "You entered an input outside the allowed list of car types"),
            ("/Search_fuel/kerosene", "You entered an input outside the allowed list of car types"),
        ];
        for (uri, message) in cases {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request())
                .await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"error": message}));
        }
    }

    #[actix_web::test]
    async fn unreachable_dataset_is_bad_gateway() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    data_location: DataLocation::parse("/nonexistent/listings.csv"),
                    artifact_dir: PathBuf::from("."),
                }))
                .configure(configure),
        )
        .await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/Search_fuel/diesel").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn prediction_is_two_decimal_and_stable() {
        let dir = fitted_artifacts("predict");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;

        let mut predictions = Vec::new();
        for _ in 0..2 {
            let resp = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/predict")
                    .set_json(porsche())
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            predictions.push(body["prediction"].as_f64().unwrap());
        }

        assert!((predictions[0] - predictions[1]).abs() < f64::EPSILON);
        let cents = predictions[0] * 100.0;
        assert!((cents - cents.round()).abs() < 1e-6);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[actix_web::test]
    async fn missing_artifacts_are_service_unavailable() {
        let dir = temp_dir("missing");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(configure)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/predict")
                .set_json(porsche())
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn malformed_body_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let mut payload = porsche();
        payload["mileage"] = json!("a lot");
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/predict")
                .set_json(payload)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(
            App::new()
                .app_data(state(Path::new(".")))
                .configure(configure),
        )
        .await;
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
