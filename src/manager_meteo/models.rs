use serde::Deserialize;

/// Envelope of an OpenMeteo response. Responses without an `hourly` block
/// are treated as empty batches.
#[derive(Deserialize)]
pub struct HourlyResponse {
    pub hourly: Option<HourlyBlock>,
}

/// Column oriented hourly data: one `time` array plus one value array per
/// requested variable. Single values can be null.
#[derive(Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<String>,
    pub temperature_2m: Option<Vec<Option<f64>>>,
    pub cloud_cover: Option<Vec<Option<f64>>>,
    pub wind_speed_10m: Option<Vec<Option<f64>>>,
    pub wind_gusts_10m: Option<Vec<Option<f64>>>,
    pub relative_humidity_2m: Option<Vec<Option<f64>>>,
    pub shortwave_radiation: Option<Vec<Option<f64>>>,
    pub direct_radiation: Option<Vec<Option<f64>>>,
    pub diffuse_radiation: Option<Vec<Option<f64>>>,
    pub global_tilted_irradiance: Option<Vec<Option<f64>>>,
    pub direct_normal_irradiance: Option<Vec<Option<f64>>>,
    pub terrestrial_radiation: Option<Vec<Option<f64>>>,
}
