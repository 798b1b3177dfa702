//! The pricing dataset: download, parse, filter, sample, and serialize.
//!
//! A [`ListingTable`] keeps each row's position in the source file so that
//! filtered and sampled tables still report the original row indices when
//! serialized column-wise.

use getaround_pricing_models::{LISTING_COLUMNS, ListingCategory, VehicleListing};
use getaround_source::DataLocation;
use rand::Rng;
use serde::Serialize;
use serde::ser::SerializeMap as _;

use crate::PricingError;

/// Number of rows returned by the preview endpoint.
pub const PREVIEW_ROWS: usize = 10;

/// A listing together with its zero-based row position in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    /// Row position in the source file.
    pub index: usize,
    /// The listing itself.
    pub listing: VehicleListing,
}

/// An in-memory slice of the pricing dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingTable {
    rows: Vec<ListingRow>,
}

impl ListingTable {
    /// Builds a table from listings, numbering rows from zero.
    #[must_use]
    pub fn from_listings(listings: Vec<VehicleListing>) -> Self {
        Self {
            rows: listings
                .into_iter()
                .enumerate()
                .map(|(index, listing)| ListingRow { index, listing })
                .collect(),
        }
    }

    /// Parses a CSV file with a header row.
    ///
    /// Columns not used by [`VehicleListing`] (such as a leading unnamed
    /// index column) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Csv`] if the header is missing a required
    /// column or any row fails to parse.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, PricingError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let listings = reader
            .deserialize::<VehicleListing>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_listings(listings))
    }

    /// Downloads (or reads) and parses the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if the fetch or the CSV parse fails.
    pub async fn fetch(location: &DataLocation) -> Result<Self, PricingError> {
        let bytes = location.fetch_bytes().await?;
        let table = Self::from_csv_bytes(&bytes)?;
        log::info!("Loaded {} listings from {location}", table.len());
        Ok(table)
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[ListingRow] {
        &self.rows
    }

    /// Iterates over the listings in table order.
    pub fn listings(&self) -> impl Iterator<Item = &VehicleListing> {
        self.rows.iter().map(|r| &r.listing)
    }

    /// Keeps the rows whose categorical `column` equals `value` exactly.
    ///
    /// Unknown or non-categorical columns match nothing.
    #[must_use]
    pub fn filter_column(&self, column: &str, value: &str) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|r| r.listing.category_value(column) == Some(value))
                .cloned()
                .collect(),
        }
    }

    /// Keeps the rows matching an allow-listed category value.
    #[must_use]
    pub fn filter_category<C: ListingCategory>(&self, value: C) -> Self {
        self.filter_column(C::COLUMN, value.as_ref())
    }

    /// Draws `n` rows uniformly without replacement, in draw order.
    ///
    /// Returns every row (shuffled) if the table has fewer than `n` rows.
    #[must_use]
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Self {
        let amount = n.min(self.rows.len());
        Self {
            rows: rand::seq::index::sample(rng, self.rows.len(), amount)
                .into_iter()
                .map(|i| self.rows[i].clone())
                .collect(),
        }
    }

    /// Column-oriented view: `{column: {row index: value}}`.
    #[must_use]
    pub fn columns(&self) -> ColumnOriented<'_> {
        ColumnOriented { rows: &self.rows }
    }
}

/// Validates `raw` against the allow-list of `C`, then downloads the
/// dataset and keeps the matching rows.
///
/// Validation happens before any network access.
///
/// # Errors
///
/// Returns [`PricingError::InvalidCategory`] for values outside the
/// allow-list, or a fetch/parse error from [`ListingTable::fetch`].
pub async fn search<C: ListingCategory>(
    location: &DataLocation,
    raw: &str,
) -> Result<ListingTable, PricingError> {
    let value = C::parse_allowed(raw)?;
    let table = ListingTable::fetch(location).await?;
    let filtered = table.filter_category(value);
    log::debug!(
        "{} = {raw}: {} of {} rows",
        C::COLUMN,
        filtered.len(),
        table.len()
    );
    Ok(filtered)
}

/// Serializes a table as `{column: {row index: value}}`, columns in
/// dataset order and indices in table order.
pub struct ColumnOriented<'a> {
    rows: &'a [ListingRow],
}

impl Serialize for ColumnOriented<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LISTING_COLUMNS.len()))?;
        for column in LISTING_COLUMNS {
            map.serialize_entry(
                column,
                &ColumnCells {
                    column,
                    rows: self.rows,
                },
            )?;
        }
        map.end()
    }
}

struct ColumnCells<'a> {
    column: &'static str,
    rows: &'a [ListingRow],
}

impl Serialize for ColumnCells<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for row in self.rows {
            map.serialize_entry(&row.index, &cell(&row.listing, self.column))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Cell<'a> {
    Text(&'a str),
    Integer(i64),
    Number(f64),
    Flag(bool),
}

/// Whole values keep the integer form the CSV stores them in.
#[allow(clippy::cast_possible_truncation)]
fn number<'a>(value: f64) -> Cell<'a> {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < EXACT {
        Cell::Integer(value as i64)
    } else {
        Cell::Number(value)
    }
}

fn cell<'a>(listing: &'a VehicleListing, column: &str) -> Cell<'a> {
    match column {
        "mileage" => number(listing.mileage),
        "engine_power" => number(listing.engine_power),
        "rental_price_per_day" => number(listing.rental_price_per_day),
        "private_parking_available" => Cell::Flag(listing.private_parking_available),
        "has_gps" => Cell::Flag(listing.has_gps),
        "has_air_conditioning" => Cell::Flag(listing.has_air_conditioning),
        "automatic_car" => Cell::Flag(listing.automatic_car),
        "has_getaround_connect" => Cell::Flag(listing.has_getaround_connect),
        "has_speed_regulator" => Cell::Flag(listing.has_speed_regulator),
        "winter_tires" => Cell::Flag(listing.winter_tires),
        other => Cell::Text(listing.category_value(other).unwrap_or_default()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use getaround_pricing_models::{CarType, Fuel, ModelKey};
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    pub(crate) const SAMPLE_CSV: &str = "\
,model_key,mileage,engine_power,fuel,paint_color,car_type,private_parking_available,has_gps,has_air_conditioning,automatic_car,has_getaround_connect,has_speed_regulator,winter_tires,rental_price_per_day
0,Citroën,140411,100,diesel,black,convertible,True,True,False,False,True,True,True,106
1,Citroën,13929,317,petrol,grey,convertible,True,True,False,False,False,True,True,264
2,Peugeot,183297,120,diesel,white,convertible,False,False,False,False,True,False,True,101
3,Renault,128035,135,diesel,red,convertible,True,True,False,False,True,True,True,158
4,Porsche,30000,220,diesel,black,sedan,True,False,True,False,True,True,True,187
5,BMW,97097,160,diesel,silver,sedan,True,True,False,False,False,True,True,170
6,BMW,152352,225,petrol,black,suv,True,True,False,False,True,False,True,210
7,Audi,205219,145,hybrid_petrol,grey,estate,False,True,False,True,False,True,True,148
8,Renault,41010,90,electro,white,hatchback,False,False,True,True,True,False,True,98
9,Peugeot,72019,110,petrol,blue,van,True,False,False,False,False,False,True,115
10,Mercedes,81522,190,diesel,black,suv,True,True,True,True,True,True,True,202
11,Citroën,119360,110,diesel,white,van,False,True,False,False,False,True,True,112
";

    pub(crate) fn sample_table() -> ListingTable {
        ListingTable::from_csv_bytes(SAMPLE_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn parses_pandas_csv() {
        let table = sample_table();
        assert_eq!(table.len(), 12);
        let first = &table.rows()[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.listing.model_key, "Citroën");
        assert!(first.listing.private_parking_available);
        assert!(!first.listing.has_air_conditioning);
        assert!((first.listing.rental_price_per_day - 106.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_csv_missing_a_column() {
        let csv = "model_key,mileage\nBMW,10\n";
        assert!(matches!(
            ListingTable::from_csv_bytes(csv.as_bytes()),
            Err(PricingError::Csv(_))
        ));
    }

    #[test]
    fn filters_keep_original_indices() {
        let table = sample_table();
        let bmw = table.filter_category(ModelKey::Bmw);
        let indices: Vec<usize> = bmw.rows().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![5, 6]);

        for car_type in CarType::all() {
            let filtered = table.filter_category(*car_type);
            assert!(filtered.listings().all(|l| l.car_type == car_type.as_ref()));
        }
        for fuel in Fuel::all() {
            let filtered = table.filter_category(*fuel);
            assert!(filtered.listings().all(|l| l.fuel == fuel.as_ref()));
        }
    }

    #[test]
    fn filter_on_unknown_column_is_empty() {
        assert!(sample_table().filter_column("mileage", "30000").is_empty());
    }

    #[test]
    fn sample_draws_distinct_rows() {
        let table = sample_table();
        let mut rng = StdRng::seed_from_u64(7);
        let sample = table.sample(PREVIEW_ROWS, &mut rng);
        assert_eq!(sample.len(), PREVIEW_ROWS);

        let mut indices: Vec<usize> = sample.rows().iter().map(|r| r.index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), PREVIEW_ROWS);
    }

    #[test]
    fn sample_with_same_seed_is_reproducible() {
        let table = sample_table();
        let a = table.sample(PREVIEW_ROWS, &mut StdRng::seed_from_u64(42));
        let b = table.sample(PREVIEW_ROWS, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn sample_larger_than_table_returns_everything() {
        let table = sample_table().filter_category(ModelKey::Bmw);
        let sample = table.sample(PREVIEW_ROWS, &mut StdRng::seed_from_u64(1));
        assert_eq!(sample.len(), 2);
    }

    #[test]
    fn column_oriented_shape() {
        let table = sample_table().filter_category(ModelKey::Bmw);
        let value = serde_json::to_value(table.columns()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), LISTING_COLUMNS.len());
        assert_eq!(value["model_key"]["5"], "BMW");
        assert_eq!(value["car_type"]["6"], "suv");
        assert_eq!(value["has_gps"]["5"], true);
        assert_eq!(value["engine_power"]["6"], 225.0);
        assert_eq!(value["rental_price_per_day"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let mut listings: Vec<VehicleListing> = sample_table().listings().cloned().collect();
        listings[1].mileage = 13_929.5;
        let table = ListingTable::from_listings(listings);
        let text = serde_json::to_string(&table.columns()).unwrap();
        assert!(text.contains("\"0\":140411,"), "{text}");
        assert!(!text.contains("140411.0"));

        let value = serde_json::to_value(table.columns()).unwrap();
        assert!(value["mileage"]["0"].is_u64());
        assert!(value["engine_power"]["0"].is_u64());
        assert!(value["rental_price_per_day"]["0"].is_u64());
        assert_eq!(value["mileage"]["1"], 13_929.5);
    }

    #[test]
    fn column_oriented_preserves_column_order() {
        let table = sample_table();
        let text = serde_json::to_string(&table.columns()).unwrap();
        let model_pos = text.find("\"model_key\"").unwrap();
        let price_pos = text.find("\"rental_price_per_day\"").unwrap();
        assert!(model_pos < price_pos);
    }
}
