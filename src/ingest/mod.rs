// CSV ingest for the pop-up event dataset and the GeoNames city reference

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{CityRecord, PopupRecord};
use crate::error::{PipelineError, Result};

/// Date layouts accepted in the event dataset, tried in order.
/// Day-first layouts come first because that is how the source exports.
const DATE_FORMATS: [&str; 3] = ["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d"];

/// Per-load diagnostics, also mirrored into the log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows: usize,
    pub unparsable_start_dates: usize,
    pub unparsable_end_dates: usize,
}

#[derive(Debug, Deserialize)]
struct RawPopupRow {
    event_id: String,
    brand: String,
    region: String,
    city: String,
    location_type: String,
    event_type: String,
    start_date: String,
    end_date: String,
    lease_length_days: String,
    sku: String,
    product_name: String,
    price_usd: String,
    avg_daily_footfall: String,
    units_sold: String,
    sell_through_pct: String,
}

#[derive(Debug, Deserialize)]
struct RawCityRow {
    geoname_id: String,
    name: String,
    country_code: String,
    population: String,
}

/// Read the pop-up event CSV into typed records.
///
/// Dates are parsed tolerantly: blank and placeholder values become `None`,
/// unparsable non-blank values also become `None` but are counted in the
/// report. Numeric fields parse strictly and fail the load when malformed.
pub fn load_popups(path: &Path) -> Result<(Vec<PopupRecord>, LoadReport)> {
    let content = read_utf8(path)?;
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for (row, result) in reader.deserialize::<RawPopupRow>().enumerate() {
        let raw = result?;
        let record_no = row + 1;

        let start_date = parse_date(&raw.start_date);
        if start_date.is_none() && !is_placeholder(&raw.start_date) {
            report.unparsable_start_dates += 1;
            warn!(record = record_no, value = %raw.start_date, "unparsable start_date");
        }
        let end_date = parse_date(&raw.end_date);
        if end_date.is_none() && !is_placeholder(&raw.end_date) {
            report.unparsable_end_dates += 1;
            warn!(record = record_no, value = %raw.end_date, "unparsable end_date");
        }

        let lease_length_days = if is_placeholder(&raw.lease_length_days) {
            None
        } else {
            Some(parse_i64(&raw.lease_length_days).ok_or_else(|| {
                parse_error("popup", record_no, "lease_length_days", &raw.lease_length_days)
            })?)
        };

        records.push(PopupRecord {
            event_id: clean_text(&raw.event_id),
            brand: clean_text(&raw.brand),
            region: clean_text(&raw.region),
            city: optional_text(&raw.city),
            location_type: clean_text(&raw.location_type),
            event_type: clean_text(&raw.event_type),
            start_date,
            end_date,
            lease_length_days,
            sku: clean_text(&raw.sku),
            product_name: clean_text(&raw.product_name),
            price_usd: raw
                .price_usd
                .trim()
                .parse::<Decimal>()
                .map_err(|_| parse_error("popup", record_no, "price_usd", &raw.price_usd))?,
            avg_daily_footfall: parse_i64(&raw.avg_daily_footfall).ok_or_else(|| {
                parse_error("popup", record_no, "avg_daily_footfall", &raw.avg_daily_footfall)
            })?,
            units_sold: parse_i64(&raw.units_sold)
                .ok_or_else(|| parse_error("popup", record_no, "units_sold", &raw.units_sold))?,
            sell_through_pct: raw.sell_through_pct.trim().parse::<f64>().map_err(|_| {
                parse_error("popup", record_no, "sell_through_pct", &raw.sell_through_pct)
            })?,
        });
    }

    report.rows = records.len();
    info!(
        rows = report.rows,
        unparsable_start = report.unparsable_start_dates,
        unparsable_end = report.unparsable_end_dates,
        "pop-up dataset loaded"
    );
    Ok((records, report))
}

/// Read the GeoNames reference CSV into typed records.
/// Blank population is a legitimate null; anything else parses strictly.
pub fn load_cities(path: &Path) -> Result<Vec<CityRecord>> {
    let content = read_utf8(path)?;
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<RawCityRow>().enumerate() {
        let raw = result?;
        let record_no = row + 1;

        let population = if is_placeholder(&raw.population) {
            None
        } else {
            Some(raw.population.trim().parse::<u64>().map_err(|_| {
                parse_error("city", record_no, "population", &raw.population)
            })?)
        };

        records.push(CityRecord {
            geoname_id: parse_i64(&raw.geoname_id)
                .ok_or_else(|| parse_error("city", record_no, "geoname_id", &raw.geoname_id))?,
            name: clean_text(&raw.name),
            country_code: clean_text(&raw.country_code),
            population,
        });
    }

    info!(rows = records.len(), "city reference loaded");
    Ok(records)
}

/// Read a whole file as UTF-8, tolerating the BOM Excel-flavoured exports
/// put before the first header
fn read_utf8(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)?;
    match content.strip_prefix('\u{feff}') {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(content),
    }
}

fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || matches!(trimmed.to_lowercase().as_str(), "nan" | "none" | "null")
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

fn parse_i64(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Collapse interior whitespace runs to single spaces
fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn optional_text(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() || is_placeholder(&cleaned) {
        None
    } else {
        Some(cleaned)
    }
}

fn parse_error(dataset: &str, record: usize, field: &str, value: &str) -> PipelineError {
    PipelineError::Parse {
        message: format!("{dataset} record {record}: invalid {field} '{value}'"),
    }
}
