use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupRecord {
    pub event_id: String,
    pub brand: String,
    pub region: String,
    pub city: Option<String>,
    pub location_type: String,
    pub event_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub lease_length_days: Option<i64>,
    pub sku: String,
    pub product_name: String,
    pub price_usd: Decimal,
    pub avg_daily_footfall: i64,
    pub units_sold: i64,
    pub sell_through_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    pub geoname_id: i64,
    pub name: String,
    pub country_code: String,
    pub population: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub resolved_end_date: NaiveDate,
    pub total_popup_days: i64,
    pub total_revenue_usd: Decimal,
    pub revenue_per_day_usd: Option<Decimal>,
    pub total_footfall: i64,
    pub conversion_per_1000: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: PopupRecord,
    pub resolved_population: Option<u64>,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}
