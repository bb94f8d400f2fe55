use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{CityRecord, DerivedMetrics, EnrichedRecord, PopupRecord};
use crate::error::{PipelineError, Result};

/// Derives the business metrics for one joined pop-up record.
///
/// Pure per-record computation: the output depends only on the record and
/// its reference match, never on neighbouring records or the clock.
pub struct MetricEngine;

impl MetricEngine {
    /// Compute derived metrics for a single record.
    ///
    /// Fails the record (not the batch) when the start date is missing,
    /// when neither an end date nor a lease length is available, or when
    /// the resolved end date precedes the start date.
    pub fn enrich(popup: &PopupRecord, matched: Option<&CityRecord>) -> Result<EnrichedRecord> {
        let start = popup
            .start_date
            .ok_or(PipelineError::MissingField("start_date"))?;
        let resolved_end_date = Self::resolve_end_date(popup, start)?;
        if resolved_end_date < start {
            return Err(PipelineError::InvalidDateRange {
                start,
                end: resolved_end_date,
            });
        }

        let total_popup_days = (resolved_end_date - start).num_days();

        let total_revenue_usd = Decimal::from(popup.units_sold)
            .checked_mul(popup.price_usd)
            .ok_or_else(|| PipelineError::Parse {
                message: format!(
                    "total revenue overflows: {} units at {}",
                    popup.units_sold, popup.price_usd
                ),
            })?;
        let revenue_per_day_usd = (total_popup_days != 0)
            .then(|| (total_revenue_usd / Decimal::from(total_popup_days)).round_dp(2));

        let total_footfall = popup
            .avg_daily_footfall
            .checked_mul(total_popup_days)
            .ok_or_else(|| PipelineError::Parse {
                message: format!(
                    "total footfall overflows: {} daily over {} days",
                    popup.avg_daily_footfall, total_popup_days
                ),
            })?;
        let conversion_per_1000 = (total_footfall != 0)
            .then(|| popup.units_sold as f64 / total_footfall as f64 * 1000.0);

        Ok(EnrichedRecord {
            record: popup.clone(),
            resolved_population: matched.and_then(|city| city.population),
            metrics: DerivedMetrics {
                resolved_end_date,
                total_popup_days,
                total_revenue_usd,
                revenue_per_day_usd,
                total_footfall,
                conversion_per_1000,
            },
        })
    }

    /// An explicit end date always wins; otherwise start + lease length.
    fn resolve_end_date(popup: &PopupRecord, start: NaiveDate) -> Result<NaiveDate> {
        if let Some(end) = popup.end_date {
            return Ok(end);
        }
        let lease = popup
            .lease_length_days
            .ok_or(PipelineError::MissingField("end_date or lease_length_days"))?;
        let span = Duration::try_days(lease).ok_or_else(|| PipelineError::Parse {
            message: format!("lease_length_days {lease} is outside the calendar range"),
        })?;
        start
            .checked_add_signed(span)
            .ok_or_else(|| PipelineError::Parse {
                message: format!("lease_length_days {lease} does not resolve to a date"),
            })
    }
}
