//! HTTP handler functions for the pricing API.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use getaround_pricing::PricingError;
use getaround_pricing::artifacts::predict_price;
use getaround_pricing::dataset::{self, ListingTable, PREVIEW_ROWS};
use getaround_pricing_models::{CarType, Fuel, ListingCategory, ModelKey, PredictionFeatures};
use getaround_server_models::{ApiError, ApiHealth, PredictionResponse, PreviewParams};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::AppState;

const GREETING: &str = "Welcome to the Getaround API!🚗 \n
    To discover more on car-sharing and rental price optimization, check out documentation of the api at `/docs`.";

#[derive(Serialize)]
struct EndpointDoc {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

const ENDPOINTS: &[EndpointDoc] = &[
    EndpointDoc {
        method: "GET",
        path: "/",
        description: "Greeting that points to this documentation.",
    },
    EndpointDoc {
        method: "GET",
        path: "/docs",
        description: "This list of routes.",
    },
    EndpointDoc {
        method: "GET",
        path: "/preview",
        description: "Ten random listings. Pass ?seed=<integer> for a reproducible sample.",
    },
    EndpointDoc {
        method: "GET",
        path: "/Search_model/{model_key}",
        description: "Listings of one car model.",
    },
    EndpointDoc {
        method: "GET",
        path: "/Search_type/{car_type}",
        description: "Listings of one car type.",
    },
    EndpointDoc {
        method: "GET",
        path: "/Search_fuel/{fuel}",
        description: "Listings of one fuel type.",
    },
    EndpointDoc {
        method: "POST",
        path: "/predict",
        description: "Predicted daily rental price of the car described in the body.",
    },
    EndpointDoc {
        method: "GET",
        path: "/health",
        description: "Service health and version.",
    },
];

/// Maps a pipeline or dataset failure to a status code and `{"error"}` body.
fn error_response(context: &str, e: &PricingError) -> HttpResponse {
    let status = match e {
        PricingError::InvalidCategory(_) => StatusCode::BAD_REQUEST,
        PricingError::Source(_) | PricingError::Csv(_) => StatusCode::BAD_GATEWAY,
        PricingError::Artifact { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PricingError::Transform { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PricingError::Prediction { .. }
        | PricingError::ArtifactWrite { .. }
        | PricingError::Scaling(_)
        | PricingError::Svm(_)
        | PricingError::Fit { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        log::error!("{context}: {e}");
    } else {
        log::warn!("{context}: {e}");
    }

    HttpResponse::build(status).json(ApiError::new(e))
}

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(GREETING)
}

/// `GET /docs`
pub async fn docs() -> HttpResponse {
    HttpResponse::Ok().json(ENDPOINTS)
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /preview`
///
/// Samples [`PREVIEW_ROWS`] listings without replacement.
pub async fn preview(
    state: web::Data<AppState>,
    params: web::Query<PreviewParams>,
) -> HttpResponse {
    let table = match ListingTable::fetch(&state.data_location).await {
        Ok(table) => table,
        Err(e) => return error_response("Failed to load listings", &e),
    };

    let sample = match params.seed {
        Some(seed) => table.sample(PREVIEW_ROWS, &mut StdRng::seed_from_u64(seed)),
        None => table.sample(PREVIEW_ROWS, &mut rand::thread_rng()),
    };
    HttpResponse::Ok().json(sample.columns())
}

async fn search<C: ListingCategory>(state: &AppState, raw: &str) -> HttpResponse {
    match dataset::search::<C>(&state.data_location, raw).await {
        Ok(table) => {
            log::debug!("{} = {raw}: {} rows", C::COLUMN, table.len());
            HttpResponse::Ok().json(table.columns())
        }
        Err(e) => error_response(&format!("Search on {} failed", C::COLUMN), &e),
    }
}

/// `GET /Search_model/{model_key}`
pub async fn search_model(
    state: web::Data<AppState>,
    model_key: web::Path<String>,
) -> HttpResponse {
    search::<ModelKey>(&state, &model_key).await
}

/// `GET /Search_type/{car_type}`
pub async fn search_type(state: web::Data<AppState>, car_type: web::Path<String>) -> HttpResponse {
    search::<CarType>(&state, &car_type).await
}

/// `GET /Search_fuel/{fuel}`
pub async fn search_fuel(state: web::Data<AppState>, fuel: web::Path<String>) -> HttpResponse {
    search::<Fuel>(&state, &fuel).await
}

/// `POST /predict`
///
/// Reloads both artifacts, encodes the body, and returns the predicted
/// daily price rounded to two decimals.
pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<PredictionFeatures>,
) -> HttpResponse {
    let dir = state.artifact_dir.clone();
    let features = body.into_inner();

    match tokio::task::spawn_blocking(move || predict_price(&dir, &features)).await {
        Ok(Ok(prediction)) => HttpResponse::Ok().json(PredictionResponse { prediction }),
        Ok(Err(e)) => error_response("Prediction failed", &e),
        Err(e) => {
            log::error!("Prediction task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Prediction task failed"))
        }
    }
}
