//! Fits the preprocessor and price model and writes both artifacts.

use std::path::{Path, PathBuf};

use dialoguer::Input;
use getaround_pricing::artifacts::{MODEL_FILE, PREPROCESSOR_FILE, fit_pipeline};
use getaround_pricing::dataset::ListingTable;
use getaround_pricing::svr::SvrParams;
use getaround_source::DataLocation;

/// Default hyper-parameters with the given box constraint and tube width.
pub fn params(c: f64, epsilon: f64) -> SvrParams {
    SvrParams {
        c,
        epsilon,
        ..SvrParams::default()
    }
}

/// Loads the listings at `location`, fits the pipeline, and saves the
/// artifacts to `output`.
pub async fn run(
    location: &DataLocation,
    output: &Path,
    params: SvrParams,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Loading listings from {location}");
    let table = ListingTable::fetch(location).await?;
    log::info!("Fitting on {} listings (C={}, epsilon={})", table.len(), params.c, params.epsilon);

    let output = output.to_path_buf();
    let dir = output.clone();
    tokio::task::spawn_blocking(move || {
        fit_pipeline(table.listings(), &params)?.save(&dir)
    })
    .await??;

    log::info!(
        "Wrote {} and {} to {}",
        PREPROCESSOR_FILE,
        MODEL_FILE,
        output.display()
    );
    Ok(())
}

/// Prompts for the dataset and output directory, then trains.
pub async fn interactive() -> Result<(), Box<dyn std::error::Error>> {
    let data: String = Input::new()
        .with_prompt("Listings CSV URL or path")
        .default(getaround_server::PRICING_DATA_URL.to_string())
        .interact_text()?;

    let output: String = Input::new()
        .with_prompt("Artifact directory")
        .default(".".to_string())
        .interact_text()?;

    let defaults = SvrParams::default();
    run(
        &DataLocation::parse(&data),
        &PathBuf::from(output),
        params(defaults.c, defaults.epsilon),
    )
    .await
}
