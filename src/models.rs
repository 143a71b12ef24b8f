use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hourly weather variables requested from OpenMeteo, in request order.
pub const METEO_HOURLY_COLUMNS: [&str; 11] = [
    "temperature_2m",
    "cloud_cover",
    "wind_speed_10m",
    "wind_gusts_10m",
    "relative_humidity_2m",
    "shortwave_radiation",
    "direct_radiation",
    "diffuse_radiation",
    "global_tilted_irradiance",
    "direct_normal_irradiance",
    "terrestrial_radiation",
];

pub const GENERATION_COLUMNS: [&str; 2] = ["plan_dtime", "fcst_pv_tot_gen"];

/// One hour of weather data, historical or forecast.
///
/// Variables can be missing in OpenMeteo responses (recent archive hours in
/// particular), hence the options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoRecord {
    pub time: NaiveDateTime,
    pub temperature_2m: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_gusts_10m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub shortwave_radiation: Option<f64>,
    pub direct_radiation: Option<f64>,
    pub diffuse_radiation: Option<f64>,
    pub global_tilted_irradiance: Option<f64>,
    pub direct_normal_irradiance: Option<f64>,
    pub terrestrial_radiation: Option<f64>,
}

impl MeteoRecord {
    pub fn business_date(&self) -> NaiveDate {
        self.time.date()
    }
}

/// One timestamp of PV generation, fetched from PSE or uploaded from file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub plan_dtime: NaiveDateTime,
    pub fcst_pv_tot_gen: f64,
}

impl GenerationRecord {
    pub fn business_date(&self) -> NaiveDate {
        self.plan_dtime.date()
    }
}

/// One predicted hour of PV output.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastPoint {
    pub plan_dtime: NaiveDateTime,
    pub pv_output: f64,
}

/// Row count per business date, used by the aggregation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCount {
    pub business_date: NaiveDate,
    pub cnt: i64,
}

/// JSON body returned by the import endpoints: column names plus the first
/// few records of the imported batch.
#[derive(Debug, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub preview: Vec<Value>,
}

impl TablePreview {
    pub fn from_records<T: Serialize>(columns: &[&str], rows: &[T]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            preview: rows
                .iter()
                .take(5)
                .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
                .collect(),
        }
    }
}
