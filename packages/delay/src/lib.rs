#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Checkout-delay analysis over the rental events workbook.
//!
//! [`workbook`] reads the two sheets, [`derive`] joins each rental to its
//! predecessor and classifies lateness, [`stats`] computes the descriptive
//! counts and histograms, and [`sweep`] runs the threshold simulations.
//! [`cache::SweepCache`] memoizes sweep results for a long-lived table.

pub mod cache;
pub mod derive;
pub mod stats;
pub mod sweep;
pub mod workbook;

use getaround_delay_models::DocumentationEntry;
use getaround_source::{DataLocation, SourceError};

use crate::derive::RentalTable;
use crate::workbook::DelayWorkbook;

/// Errors that can occur while loading or analysing the delay dataset.
#[derive(Debug, thiserror::Error)]
pub enum DelayError {
    /// Workbook could not be downloaded or read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Workbook is not a readable xlsx file or lacks a sheet.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// A required header is absent from a sheet.
    #[error("Sheet '{sheet}' has no column '{column}'")]
    MissingColumn {
        /// Sheet name.
        sheet: &'static str,
        /// Expected header.
        column: &'static str,
    },

    /// A cell could not be converted to the column's type.
    #[error("Sheet '{sheet}' row {row}, column '{column}': unexpected value {value}")]
    InvalidCell {
        /// Sheet name.
        sheet: &'static str,
        /// One-based spreadsheet row.
        row: usize,
        /// Column header.
        column: &'static str,
        /// Debug rendering of the cell.
        value: String,
    },

    /// A self-join key occurs more than once.
    #[error("Duplicate {column} {id}: the previous-rental join requires unique keys")]
    DuplicateJoinKey {
        /// Key column.
        column: &'static str,
        /// Duplicated identifier.
        id: i64,
    },

    /// A request parameter is outside its accepted range.
    #[error("{parameter} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Parameter name.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
}

/// The derived rental table and the documentation sheet, as served by the
/// dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelayDataset {
    pub table: RentalTable,
    pub documentation: Vec<DocumentationEntry>,
}

impl DelayDataset {
    /// Derives the rental table from a parsed workbook.
    ///
    /// # Errors
    ///
    /// Returns [`DelayError::DuplicateJoinKey`] if the self-join keys are
    /// not unique.
    pub fn from_workbook(workbook: DelayWorkbook) -> Result<Self, DelayError> {
        Ok(Self {
            table: RentalTable::derive(workbook.rentals)?,
            documentation: workbook.documentation,
        })
    }

    /// Downloads (or reads) the workbook and derives the rental table.
    ///
    /// # Errors
    ///
    /// Returns [`DelayError`] if fetching, parsing, or deriving fails.
    pub async fn fetch(location: &DataLocation) -> Result<Self, DelayError> {
        Self::from_workbook(DelayWorkbook::fetch(location).await?)
    }
}
