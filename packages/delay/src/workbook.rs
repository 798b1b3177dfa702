//! Reading the `rentals_data` and `Documentation` sheets.

use std::io::Cursor;
use std::str::FromStr;

use calamine::{Data, Reader as _, Xlsx};
use getaround_delay_models::{DocumentationEntry, RentalEvent};
use getaround_source::DataLocation;

use crate::DelayError;

/// Sheet holding one row per rental.
pub const RENTALS_SHEET: &str = "rentals_data";

/// Sheet describing each rental column.
pub const DOCUMENTATION_SHEET: &str = "Documentation";

/// Raw contents of the delay workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayWorkbook {
    pub rentals: Vec<RentalEvent>,
    pub documentation: Vec<DocumentationEntry>,
}

impl DelayWorkbook {
    /// Parses an xlsx file held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`DelayError::Workbook`] if the bytes are not an xlsx file or
    /// a sheet is missing, and a column or cell error if `rentals_data`
    /// does not have the expected shape.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DelayError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

        let rentals_range = workbook.worksheet_range(RENTALS_SHEET)?;
        let rentals = parse_rentals(rentals_range.rows())?;

        let documentation_range = workbook.worksheet_range(DOCUMENTATION_SHEET)?;
        let documentation = parse_documentation(documentation_range.rows());

        Ok(Self {
            rentals,
            documentation,
        })
    }

    /// Downloads (or reads) and parses the workbook.
    ///
    /// # Errors
    ///
    /// Returns [`DelayError::Source`] if the fetch fails, otherwise see
    /// [`Self::from_bytes`].
    pub async fn fetch(location: &DataLocation) -> Result<Self, DelayError> {
        let bytes = location.fetch_bytes().await?;
        let workbook = Self::from_bytes(bytes)?;
        log::info!(
            "Loaded {} rentals and {} documentation rows from {location}",
            workbook.rentals.len(),
            workbook.documentation.len()
        );
        Ok(workbook)
    }
}

struct RentalColumns {
    rental_id: usize,
    car_id: usize,
    checkin_type: usize,
    state: usize,
    delay: usize,
    previous_id: usize,
    time_delta: usize,
}

impl RentalColumns {
    fn locate(header: &[Data]) -> Result<Self, DelayError> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|cell| matches!(cell, Data::String(s) if s.trim() == column))
                .ok_or(DelayError::MissingColumn {
                    sheet: RENTALS_SHEET,
                    column,
                })
        };

        Ok(Self {
            rental_id: find("rental_id")?,
            car_id: find("car_id")?,
            checkin_type: find("checkin_type")?,
            state: find("state")?,
            delay: find("delay_at_checkout_in_minutes")?,
            previous_id: find("previous_ended_rental_id")?,
            time_delta: find("time_delta_with_previous_rental_in_minutes")?,
        })
    }
}

/// Parses `rentals_data` rows, the first of which is the header.
///
/// # Errors
///
/// Returns [`DelayError::MissingColumn`] or [`DelayError::InvalidCell`].
pub fn parse_rentals<'a>(
    mut rows: impl Iterator<Item = &'a [Data]>,
) -> Result<Vec<RentalEvent>, DelayError> {
    let header = rows.next().unwrap_or_default();
    let columns = RentalColumns::locate(header)?;

    let mut rentals = Vec::new();
    // Spreadsheet rows are one-based and the header is row 1.
    for (row_number, row) in (2..).zip(rows) {
        if row.iter().all(is_blank) {
            continue;
        }
        let cell = CellReader { row, row_number };
        rentals.push(RentalEvent {
            rental_id: cell.required(columns.rental_id, "rental_id", as_id)?,
            car_id: cell.required(columns.car_id, "car_id", as_id)?,
            checkin_type: cell.required(columns.checkin_type, "checkin_type", as_enum)?,
            state: cell.required(columns.state, "state", as_enum)?,
            delay_at_checkout_in_minutes: cell.optional(
                columns.delay,
                "delay_at_checkout_in_minutes",
                as_minutes,
            )?,
            previous_ended_rental_id: cell.optional(
                columns.previous_id,
                "previous_ended_rental_id",
                as_id,
            )?,
            time_delta_with_previous_rental_in_minutes: cell.optional(
                columns.time_delta,
                "time_delta_with_previous_rental_in_minutes",
                as_minutes,
            )?,
        });
    }

    Ok(rentals)
}

/// Parses `Documentation` rows as `(field, comment)` pairs, skipping the
/// header and blank rows.
pub fn parse_documentation<'a>(rows: impl Iterator<Item = &'a [Data]>) -> Vec<DocumentationEntry> {
    rows.skip(1)
        .filter(|row| !row.iter().take(2).all(is_blank))
        .map(|row| DocumentationEntry {
            field: row.first().map(as_text).unwrap_or_default(),
            comment: row.get(1).map(as_text).unwrap_or_default(),
        })
        .collect()
}

struct CellReader<'a> {
    row: &'a [Data],
    row_number: usize,
}

impl CellReader<'_> {
    fn optional<T>(
        &self,
        index: usize,
        column: &'static str,
        convert: fn(&Data) -> Option<T>,
    ) -> Result<Option<T>, DelayError> {
        match self.row.get(index) {
            None => Ok(None),
            Some(cell) if is_blank(cell) => Ok(None),
            Some(cell) => convert(cell).map(Some).ok_or_else(|| DelayError::InvalidCell {
                sheet: RENTALS_SHEET,
                row: self.row_number,
                column,
                value: format!("{cell:?}"),
            }),
        }
    }

    fn required<T>(
        &self,
        index: usize,
        column: &'static str,
        convert: fn(&Data) -> Option<T>,
    ) -> Result<T, DelayError> {
        self.optional(index, column, convert)?
            .ok_or(DelayError::InvalidCell {
                sheet: RENTALS_SHEET,
                row: self.row_number,
                column,
                value: "empty".to_string(),
            })
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => {
            let s = s.trim();
            s.is_empty() || s.eq_ignore_ascii_case("nan")
        }
        _ => false,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_id(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_minutes(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        _ => None,
    }
}

fn as_enum<T: FromStr>(cell: &Data) -> Option<T> {
    match cell {
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use getaround_delay_models::{CheckinType, RentalState};

    use super::*;

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    pub(crate) fn header() -> Vec<Data> {
        vec![
            s("rental_id"),
            s("car_id"),
            s("checkin_type"),
            s("state"),
            s("delay_at_checkout_in_minutes"),
            s("previous_ended_rental_id"),
            s("time_delta_with_previous_rental_in_minutes"),
        ]
    }

    fn parse(rows: &[Vec<Data>]) -> Result<Vec<RentalEvent>, DelayError> {
        parse_rentals(rows.iter().map(Vec::as_slice))
    }

    #[test]
    fn parses_excel_typed_cells() {
        let rows = vec![
            header(),
            vec![
                Data::Float(505_000.0),
                Data::Float(363_965.0),
                s("mobile"),
                s("canceled"),
                Data::Empty,
                Data::Empty,
                Data::Empty,
            ],
            vec![
                Data::Int(507_750),
                Data::Int(269_550),
                s("connect"),
                s("ended"),
                Data::Float(-81.0),
                Data::Float(505_000.0),
                Data::Int(30),
            ],
        ];

        let rentals = parse(&rows).unwrap();
        assert_eq!(rentals.len(), 2);
        assert_eq!(rentals[0].rental_id, 505_000);
        assert_eq!(rentals[0].state, RentalState::Canceled);
        assert_eq!(rentals[0].delay_at_checkout_in_minutes, None);
        assert_eq!(rentals[1].checkin_type, CheckinType::Connect);
        assert_eq!(rentals[1].previous_ended_rental_id, Some(505_000));
        assert_eq!(rentals[1].time_delta_with_previous_rental_in_minutes, Some(30.0));
    }

    #[test]
    fn header_order_does_not_matter() {
        let mut head = header();
        head.reverse();
        let rows = vec![
            head,
            vec![
                Data::Empty,
                Data::Empty,
                Data::Float(12.0),
                s("ended"),
                s("mobile"),
                Data::Int(2),
                Data::Int(1),
            ],
        ];
        let rentals = parse(&rows).unwrap();
        assert_eq!(rentals[0].rental_id, 1);
        assert_eq!(rentals[0].car_id, 2);
        assert_eq!(rentals[0].delay_at_checkout_in_minutes, Some(12.0));
    }

    #[test]
    fn missing_column_is_reported() {
        let rows = vec![header()[..6].to_vec()];
        assert!(matches!(
            parse(&rows),
            Err(DelayError::MissingColumn {
                column: "time_delta_with_previous_rental_in_minutes",
                ..
            })
        ));
    }

    #[test]
    fn invalid_cell_names_row_and_column() {
        let rows = vec![
            header(),
            vec![
                Data::Int(1),
                Data::Int(2),
                s("scooter"),
                s("ended"),
                Data::Empty,
                Data::Empty,
                Data::Empty,
            ],
        ];
        match parse(&rows) {
            Err(DelayError::InvalidCell { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "checkin_type");
            }
            other => panic!("expected invalid cell, got {other:?}"),
        }
    }

    #[test]
    fn blank_rows_are_skipped() {
        let rows = vec![header(), vec![Data::Empty; 7]];
        assert!(parse(&rows).unwrap().is_empty());
    }

    #[test]
    fn documentation_pairs() {
        let rows = vec![
            vec![s("field name"), s("Comment")],
            vec![s("rental_id"), s("Unique identifier of the rental")],
            vec![Data::Empty, Data::Empty],
            vec![s("state"), s("canceled means that the rental did not happen")],
        ];
        let docs = parse_documentation(rows.iter().map(Vec::as_slice));
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].field, "rental_id");
        assert_eq!(docs[1].comment, "canceled means that the rental did not happen");
    }

    #[test]
    fn rejects_non_xlsx_bytes() {
        assert!(matches!(
            DelayWorkbook::from_bytes(b"not a zip archive".to_vec()),
            Err(DelayError::Workbook(_))
        ));
    }
}
