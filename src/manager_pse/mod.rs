pub mod errors;
mod models;

use std::time::Duration;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use crate::initialization::Apis;
use crate::manager_pse::errors::PseError;
use crate::manager_pse::models::{PseRow, ValueResponse};
use crate::models::GenerationRecord;
use crate::retry::get_with_retry;

const SELECT_COLUMNS: &str = "plan_dtime,fcst_pv_tot_gen";
const TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Manager for the PSE day-ahead PV generation report.
pub struct Pse {
    client: Client,
    base_url: String,
}

impl Pse {
    /// Returns a new instance of Pse
    ///
    /// # Arguments
    ///
    /// * 'apis' - upstream API configuration carrying the report base URL
    pub fn new(apis: &Apis) -> Result<Self, PseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base_url: apis.pse_url.clone() })
    }

    /// Fetches the generation report for every business date in the range,
    /// one request per day, and concatenates the rows.
    ///
    /// # Arguments
    ///
    /// * 'start_date' - first day of the range, inclusive
    /// * 'end_date' - last day of the range, inclusive
    pub async fn fetch_generation(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<GenerationRecord>, PseError> {
        let mut rows = Vec::new();

        let mut current = start_date;
        while current <= end_date {
            rows.extend(self.fetch_day(current).await?);
            current = current
                .succ_opt()
                .ok_or_else(|| PseError::Other("date range overflow".to_string()))?;
        }

        Ok(rows)
    }

    async fn fetch_day(&self, business_date: NaiveDate) -> Result<Vec<GenerationRecord>, PseError> {
        let query = [
            (
                "$filter",
                format!("business_date eq '{}'", business_date.format("%Y-%m-%d")),
            ),
            ("$select", SELECT_COLUMNS.to_string()),
        ];

        let response = get_with_retry(&self.client, &self.base_url, &query).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PseError::Api(format!("{:?}", status)));
        }

        let json = response.text().await?;
        let envelope: ValueResponse = serde_json::from_str(&json)?;

        match envelope.value {
            Some(rows) => transform_rows(rows),
            None => Ok(Vec::new()),
        }
    }
}

/// Transforms report rows into generation records.
///
/// # Arguments
///
/// * 'rows' - the rows to transform
fn transform_rows(rows: Vec<PseRow>) -> Result<Vec<GenerationRecord>, PseError> {
    let mut result = Vec::with_capacity(rows.len());

    for row in rows {
        result.push(GenerationRecord {
            plan_dtime: parse_time(&row.plan_dtime)?,
            fcst_pv_tot_gen: row.fcst_pv_tot_gen,
        });
    }

    Ok(result)
}

fn parse_time(value: &str) -> Result<NaiveDateTime, PseError> {
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .ok_or_else(|| PseError::Document(format!("invalid plan_dtime '{}'", value)))
}
