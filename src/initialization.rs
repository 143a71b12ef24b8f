use std::env;
use std::fs;
use crate::errors::UnrecoverableError;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_BIND_PORT: u16 = 8080;
pub const DEFAULT_METEO_HIST_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_METEO_FRCST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct WebServer {
    pub bind_address: String,
    pub bind_port: u16,
}

/// Base URLs of the three upstream APIs.
#[derive(Debug, Clone)]
pub struct Apis {
    pub pse_url: String,
    pub meteo_hist_url: String,
    pub meteo_frcst_url: String,
}

#[derive(Debug, Clone)]
pub struct Files {
    pub data_dir: String,
    pub db_path: String,
    pub model_path: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub web_server: WebServer,
    pub apis: Apis,
    pub files: Files,
}

/// Builds the runtime configuration from environment variables.
///
/// `API_URL_PSE` is required since the PSE report API carries no sensible
/// default. The OpenMeteo URLs and everything else fall back to defaults.
/// The data directory is created if missing.
pub fn config() -> Result<Config, UnrecoverableError> {
    let pse_url = match env::var("API_URL_PSE") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            return Err(UnrecoverableError(
                "API_URL_PSE must be set to the PSE generation report endpoint".to_string(),
            ))
        }
    };

    let meteo_hist_url =
        env::var("API_URL_METEO_HIST").unwrap_or_else(|_| DEFAULT_METEO_HIST_URL.to_string());
    let meteo_frcst_url =
        env::var("API_URL_METEO_FRCST").unwrap_or_else(|_| DEFAULT_METEO_FRCST_URL.to_string());

    let bind_address =
        env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let bind_port = env::var("BIND_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_BIND_PORT);

    let data_dir = env::var("DATA_DIR")
        .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string())
        .trim_end_matches('/')
        .to_string();
    fs::create_dir_all(&data_dir)?;

    let db_path = env::var("DB_PATH").unwrap_or_else(|_| format!("{}/app.db", data_dir));
    let model_path = env::var("MODEL_PATH").unwrap_or_else(|_| format!("{}/pv_model.bin", data_dir));

    Ok(Config {
        web_server: WebServer { bind_address, bind_port },
        apis: Apis { pse_url, meteo_hist_url, meteo_frcst_url },
        files: Files { data_dir, db_path, model_path },
    })
}
