use serde::{Deserialize, Deserializer};
use serde::de::Error;
use serde_json::Value;

/// Envelope of a PSE report response. Days without a `value` array yield no
/// rows.
#[derive(Deserialize)]
pub struct ValueResponse {
    pub value: Option<Vec<PseRow>>,
}

#[derive(Deserialize)]
pub struct PseRow {
    pub plan_dtime: String,
    #[serde(deserialize_with = "deserialize_lenient_number")]
    pub fcst_pv_tot_gen: f64,
}

/// The report occasionally serializes numbers as strings, scientific
/// notation included.
fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where D: Deserializer<'de> {

    let v = Value::deserialize(deserializer)?;
    let x = v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| Error::custom("non-f64"))?;

    Ok(x)
}
