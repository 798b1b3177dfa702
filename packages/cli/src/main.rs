#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front-end for the Getaround toolchain.
//!
//! Starts the pricing API or the delay dashboard, fits prediction
//! artifacts, or prints a delay report. Without a subcommand, prompts for
//! the tool to run and its configuration.

mod report;
mod train;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use getaround_source::DataLocation;

#[derive(Parser)]
#[command(name = "getaround_cli", about = "Getaround pricing and delay-analysis tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the rental-price prediction API
    Api,
    /// Start the delay-analysis dashboard API
    Dashboard,
    /// Fit the preprocessor and price model and write both artifacts
    Train {
        /// Listings CSV URL or path
        #[arg(long, default_value = getaround_server::PRICING_DATA_URL)]
        data: String,
        /// Directory receiving `preprocessor.json` and `svr_model.json`
        #[arg(long, default_value = ".")]
        output: PathBuf,
        /// SVR box constraint
        #[arg(long, default_value_t = 1.0)]
        c: f64,
        /// SVR insensitive tube width
        #[arg(long, default_value_t = 0.1)]
        epsilon: f64,
    },
    /// Print delay-analysis statistics
    Report {
        /// Delay workbook URL or path
        #[arg(long, default_value = getaround_dashboard::DELAY_DATA_URL)]
        data: String,
        /// Flexibility used for the affected and successful sweeps
        #[arg(long, default_value_t = getaround_delay_models::SweepKind::DEFAULT_FLEXIBILITY)]
        flexibility: u32,
    },
}

/// Top-level tool selection for the interactive menu.
enum Tool {
    Api,
    Dashboard,
    Train,
    Report,
}

impl Tool {
    const ALL: &[Self] = &[Self::Api, Self::Dashboard, Self::Train, Self::Report];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Api => "Start pricing API",
            Self::Dashboard => "Start delay dashboard",
            Self::Train => "Train price model",
            Self::Report => "Print delay report",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Api) => run_actix(getaround_server::run_server).await?,
        Some(Commands::Dashboard) => run_actix(getaround_dashboard::run_server).await?,
        Some(Commands::Train {
            data,
            output,
            c,
            epsilon,
        }) => {
            let params = train::params(c, epsilon);
            train::run(&DataLocation::parse(&data), &output, params).await?;
        }
        Some(Commands::Report { data, flexibility }) => {
            report::run(&DataLocation::parse(&data), flexibility).await?;
        }
        None => interactive().await?,
    }

    Ok(())
}

async fn interactive() -> Result<(), Box<dyn std::error::Error>> {
    println!("Getaround Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Api => run_actix(getaround_server::interactive::run).await?,
        Tool::Dashboard => run_actix(getaround_dashboard::interactive::run).await?,
        Tool::Train => train::interactive().await?,
        Tool::Report => report::interactive().await?,
    }

    Ok(())
}

/// Runs an actix server future on its own system, off the tokio runtime
/// driving the CLI.
async fn run_actix<F, Fut>(server: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<()>>,
{
    tokio::task::spawn_blocking(move || actix_web::rt::System::new().block_on(server()))
        .await??;
    Ok(())
}
