use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::EnrichedRecord;

/// Violation tally for one predicate: how many records tripped it and which
#[derive(Debug, Clone, Default, Serialize)]
pub struct QcFinding {
    pub count: usize,
    pub event_ids: Vec<String>,
}

impl QcFinding {
    fn flag(&mut self, event_id: &str) {
        self.count += 1;
        self.event_ids.push(event_id.to_string());
    }
}

/// Post-run sanity report over the enriched dataset.
///
/// Purely observational: a record can trip any number of predicates and
/// still ships in the output. Event ids within each finding follow the
/// output order, so identical runs produce identical reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QcReport {
    pub records_checked: usize,
    /// price_usd is zero or negative
    pub bad_price: QcFinding,
    /// total_popup_days is zero or negative
    pub bad_days: QcFinding,
    /// units_sold is negative
    pub negative_units: QcFinding,
    /// avg_daily_footfall is negative
    pub negative_footfall: QcFinding,
    /// sell_through_pct is outside 0..=100
    pub sell_through_out_of_range: QcFinding,
    /// no reference population resolved for the record's city
    pub unmatched_city: QcFinding,
}

impl QcReport {
    pub fn check(records: &[EnrichedRecord]) -> Self {
        let mut report = QcReport {
            records_checked: records.len(),
            ..Default::default()
        };

        for enriched in records {
            let record = &enriched.record;
            if record.price_usd <= Decimal::ZERO {
                report.bad_price.flag(&record.event_id);
            }
            if enriched.metrics.total_popup_days <= 0 {
                report.bad_days.flag(&record.event_id);
            }
            if record.units_sold < 0 {
                report.negative_units.flag(&record.event_id);
            }
            if record.avg_daily_footfall < 0 {
                report.negative_footfall.flag(&record.event_id);
            }
            if !(0.0..=100.0).contains(&record.sell_through_pct) {
                report.sell_through_out_of_range.flag(&record.event_id);
            }
            if enriched.resolved_population.is_none() {
                report.unmatched_city.flag(&record.event_id);
            }
        }

        report
    }

    /// Findings paired with their predicate names, for printing
    pub fn findings(&self) -> [(&'static str, &QcFinding); 6] {
        [
            ("bad_price", &self.bad_price),
            ("bad_days", &self.bad_days),
            ("negative_units", &self.negative_units),
            ("negative_footfall", &self.negative_footfall),
            ("sell_through_out_of_range", &self.sell_through_out_of_range),
            ("unmatched_city", &self.unmatched_city),
        ]
    }

    pub fn total_anomalies(&self) -> usize {
        self.findings().iter().map(|(_, finding)| finding.count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_anomalies() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DerivedMetrics, PopupRecord};
    use chrono::NaiveDate;

    fn enriched(event_id: &str) -> EnrichedRecord {
        EnrichedRecord {
            record: PopupRecord {
                event_id: event_id.to_string(),
                brand: "Glowessence".to_string(),
                region: "EMEA".to_string(),
                city: Some("Berlin".to_string()),
                location_type: "Shopping Mall".to_string(),
                event_type: "Product Launch".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 11),
                lease_length_days: Some(10),
                sku: "SKU-001".to_string(),
                product_name: "Velvet Lip Tint".to_string(),
                price_usd: Decimal::new(5000, 2),
                avg_daily_footfall: 100,
                units_sold: 20,
                sell_through_pct: 55.0,
            },
            resolved_population: Some(3_700_000),
            metrics: DerivedMetrics {
                resolved_end_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
                total_popup_days: 10,
                total_revenue_usd: Decimal::new(100000, 2),
                revenue_per_day_usd: Some(Decimal::new(10000, 2)),
                total_footfall: 1000,
                conversion_per_1000: Some(20.0),
            },
        }
    }

    #[test]
    fn test_clean_batch_reports_no_anomalies() {
        let records = vec![enriched("E1"), enriched("E2")];

        let report = QcReport::check(&records);

        assert_eq!(report.records_checked, 2);
        assert!(report.is_clean());
        assert_eq!(report.total_anomalies(), 0);
    }

    #[test]
    fn test_nonpositive_price_is_flagged() {
        let mut bad = enriched("E1");
        bad.record.price_usd = Decimal::new(-500, 2);

        let report = QcReport::check(&[bad, enriched("E2")]);

        assert_eq!(report.bad_price.count, 1);
        assert_eq!(report.bad_price.event_ids, vec!["E1"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_one_record_can_trip_several_predicates() {
        let mut bad = enriched("E1");
        bad.record.price_usd = Decimal::ZERO;
        bad.record.units_sold = -4;
        bad.record.sell_through_pct = 130.0;
        bad.resolved_population = None;

        let report = QcReport::check(&[bad]);

        assert_eq!(report.bad_price.count, 1);
        assert_eq!(report.negative_units.count, 1);
        assert_eq!(report.sell_through_out_of_range.count, 1);
        assert_eq!(report.unmatched_city.count, 1);
        assert_eq!(report.total_anomalies(), 4);
    }

    #[test]
    fn test_zero_day_event_is_flagged_as_bad_days() {
        let mut zero_day = enriched("E1");
        zero_day.metrics.total_popup_days = 0;
        zero_day.metrics.revenue_per_day_usd = None;
        zero_day.metrics.total_footfall = 0;
        zero_day.metrics.conversion_per_1000 = None;

        let report = QcReport::check(&[zero_day]);

        assert_eq!(report.bad_days.count, 1);
    }

    #[test]
    fn test_out_of_range_sell_through_includes_nan() {
        let mut nan_record = enriched("E1");
        nan_record.record.sell_through_pct = f64::NAN;

        let report = QcReport::check(&[nan_record]);

        assert_eq!(report.sell_through_out_of_range.count, 1);
    }

    #[test]
    fn test_report_is_deterministic_across_reruns() {
        let mut bad = enriched("E1");
        bad.resolved_population = None;
        let records = vec![bad, enriched("E2"), enriched("E3")];

        let first = serde_json::to_string(&QcReport::check(&records)).unwrap();
        let second = serde_json::to_string(&QcReport::check(&records)).unwrap();

        assert_eq!(first, second);
    }
}
