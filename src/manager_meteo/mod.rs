pub mod errors;
mod models;

use std::time::Duration;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use crate::initialization::Apis;
use crate::manager_meteo::errors::MeteoError;
use crate::manager_meteo::models::{HourlyBlock, HourlyResponse};
use crate::models::{MeteoRecord, METEO_HOURLY_COLUMNS};
use crate::retry::get_with_retry;

const TIMEZONE: &str = "Europe/Berlin";
const TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// OpenMeteo manager, covering the historical archive and the forecast API.
pub struct Meteo {
    client: Client,
    hist_url: String,
    frcst_url: String,
}

impl Meteo {
    /// Returns a new instance of Meteo
    ///
    /// # Arguments
    ///
    /// * 'apis' - upstream API configuration carrying the two base URLs
    pub fn new(apis: &Apis) -> Result<Self, MeteoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            hist_url: apis.meteo_hist_url.clone(),
            frcst_url: apis.meteo_frcst_url.clone(),
        })
    }

    /// Returns hourly archive weather for the given date range and location.
    ///
    /// # Arguments
    ///
    /// * 'start_date' - first day of the range, inclusive
    /// * 'end_date' - last day of the range, inclusive
    /// * 'latitude' - location latitude
    /// * 'longitude' - location longitude
    pub async fn fetch_history(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<MeteoRecord>, MeteoError> {
        let mut query = base_query(latitude, longitude);
        query.push(("start_date", start_date.format("%Y-%m-%d").to_string()));
        query.push(("end_date", end_date.format("%Y-%m-%d").to_string()));

        self.fetch(&self.hist_url, &query).await
    }

    /// Returns hourly forecast weather for the given location.
    ///
    /// # Arguments
    ///
    /// * 'latitude' - location latitude
    /// * 'longitude' - location longitude
    pub async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<MeteoRecord>, MeteoError> {
        let query = base_query(latitude, longitude);

        self.fetch(&self.frcst_url, &query).await
    }

    async fn fetch(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<MeteoRecord>, MeteoError> {
        let response = get_with_retry(&self.client, url, query).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MeteoError(format!("{:?}", status)));
        }

        let json = response.text().await?;
        let envelope: HourlyResponse = serde_json::from_str(&json)?;

        match envelope.hourly {
            Some(hourly) => transform_hourly(hourly),
            None => Ok(Vec::new()),
        }
    }
}

fn base_query(latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
    vec![
        ("timezone", TIMEZONE.to_string()),
        ("latitude", latitude.to_string()),
        ("longitude", longitude.to_string()),
        ("hourly", METEO_HOURLY_COLUMNS.join(",")),
    ]
}

/// Transforms a column oriented hourly block into row records.
///
/// # Arguments
///
/// * 'hourly' - the block to transform
fn transform_hourly(hourly: HourlyBlock) -> Result<Vec<MeteoRecord>, MeteoError> {
    let mut result = Vec::with_capacity(hourly.time.len());

    for (i, time) in hourly.time.iter().enumerate() {
        result.push(MeteoRecord {
            time: parse_time(time)?,
            temperature_2m: column_value(&hourly.temperature_2m, i),
            cloud_cover: column_value(&hourly.cloud_cover, i),
            wind_speed_10m: column_value(&hourly.wind_speed_10m, i),
            wind_gusts_10m: column_value(&hourly.wind_gusts_10m, i),
            relative_humidity_2m: column_value(&hourly.relative_humidity_2m, i),
            shortwave_radiation: column_value(&hourly.shortwave_radiation, i),
            direct_radiation: column_value(&hourly.direct_radiation, i),
            diffuse_radiation: column_value(&hourly.diffuse_radiation, i),
            global_tilted_irradiance: column_value(&hourly.global_tilted_irradiance, i),
            direct_normal_irradiance: column_value(&hourly.direct_normal_irradiance, i),
            terrestrial_radiation: column_value(&hourly.terrestrial_radiation, i),
        });
    }

    Ok(result)
}

fn column_value(column: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    column.as_ref().and_then(|c| c.get(i).copied().flatten())
}

fn parse_time(value: &str) -> Result<NaiveDateTime, MeteoError> {
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .ok_or_else(|| MeteoError(format!("invalid hourly timestamp '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_apis(server_uri: &str) -> Apis {
        Apis {
            pse_url: format!("{}/pse", server_uri),
            meteo_hist_url: format!("{}/archive", server_uri),
            meteo_frcst_url: format!("{}/forecast", server_uri),
        }
    }

    #[actix_web::test]
    async fn history_is_fetched_and_transformed_to_rows() {
        let server = MockServer::start().await;

        let body = json!({
            "hourly": {
                "time": ["2024-06-01T10:00", "2024-06-01T11:00"],
                "temperature_2m": [20.5, null],
                "cloud_cover": [10.0, 35.0],
                "shortwave_radiation": [650.0, 700.0]
            }
        });
        Mock::given(method("GET"))
            .and(path("/archive"))
            .and(query_param("latitude", "52.2"))
            .and(query_param("longitude", "21.0"))
            .and(query_param("start_date", "2024-06-01"))
            .and(query_param("end_date", "2024-06-01"))
            .and(query_param("timezone", "Europe/Berlin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let meteo = Meteo::new(&test_apis(&server.uri())).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rows = meteo.fetch_history(date, date, 52.2, 21.0).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].temperature_2m, Some(20.5));
        assert_eq!(rows[1].temperature_2m, None);
        assert_eq!(rows[1].cloud_cover, Some(35.0));
        assert_eq!(
            rows[0].time,
            date.and_hms_opt(10, 0, 0).unwrap()
        );
    }

    #[actix_web::test]
    async fn response_without_hourly_block_is_an_empty_batch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reason": "none"})))
            .mount(&server)
            .await;

        let meteo = Meteo::new(&test_apis(&server.uri())).unwrap();
        let rows = meteo.fetch_forecast(52.2, 21.0).await.unwrap();

        assert!(rows.is_empty());
    }

    #[actix_web::test]
    async fn client_error_status_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let meteo = Meteo::new(&test_apis(&server.uri())).unwrap();
        let err = meteo.fetch_forecast(52.2, 21.0).await.unwrap_err();

        assert!(err.to_string().contains("400"));
    }
}
