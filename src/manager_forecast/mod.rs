pub mod errors;
mod features;
mod models;

use std::collections::HashMap;
use std::fs;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use crate::manager_forecast::errors::ForecastError;
use crate::manager_forecast::features::Scaler;
use crate::manager_forecast::models::{Regressor, SUPPORTED_MODELS};
use crate::models::{ForecastPoint, GenerationRecord, MeteoRecord};

pub const DEFAULT_MODEL: &str = "RandomForestRegressor";

/// One joined hour: generation target plus its weather values.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub time: NaiveDateTime,
    pub target: f64,
    pub weather: Vec<f64>,
}

/// Everything needed to score new hours, persisted as one blob.
#[derive(Serialize, Deserialize)]
pub struct ForecastPipeline {
    pub model_name: String,
    pub n_lags: usize,
    pub feature_names: Vec<String>,
    scaler: Scaler,
    model: Regressor,
}

impl ForecastPipeline {
    fn save(&self, path: &str) -> Result<(), ForecastError> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn load(path: &str) -> Result<Self, ForecastError> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[derive(Debug)]
pub struct TrainSummary {
    pub training_rows: usize,
    pub mae: f64,
    pub rmse: f64,
}

/// Validates a model name against the supported set.
pub fn ensure_supported(model_name: &str) -> Result<(), ForecastError> {
    if SUPPORTED_MODELS.contains(&model_name) {
        Ok(())
    } else {
        Err(ForecastError(format!(
            "unknown model name '{}', supported models: {}",
            model_name,
            SUPPORTED_MODELS.join(", ")
        )))
    }
}

/// Inner-joins the generation and weather series on timestamp.
///
/// Returns the joined training rows and the future weather, i.e. weather
/// hours with no matching generation timestamp, both sorted by time.
///
/// # Arguments
///
/// * 'generation' - the generation series
/// * 'meteo' - the weather series
pub fn join_series(
    generation: &[GenerationRecord],
    meteo: &[MeteoRecord],
) -> (Vec<TrainingRow>, Vec<MeteoRecord>) {
    let targets: HashMap<NaiveDateTime, f64> = generation
        .iter()
        .map(|g| (g.plan_dtime, g.fcst_pv_tot_gen))
        .collect();

    let mut joined = Vec::new();
    let mut future = Vec::new();

    for record in meteo {
        match targets.get(&record.time) {
            Some(&target) => joined.push(TrainingRow {
                time: record.time,
                target,
                weather: features::weather_values(record),
            }),
            None => future.push(record.clone()),
        }
    }

    joined.sort_by_key(|r| r.time);
    future.sort_by_key(|r| r.time);

    (joined, future)
}

/// Trains the named model on the joined rows and persists the fitted
/// pipeline.
///
/// # Arguments
///
/// * 'rows' - joined rows sorted by timestamp
/// * 'model_name' - one of the supported model names
/// * 'n_lags' - number of lagged target values per feature row
/// * 'model_path' - file to persist the pipeline to
pub fn train_and_save(
    rows: &[TrainingRow],
    model_name: &str,
    n_lags: usize,
    model_path: &str,
) -> Result<TrainSummary, ForecastError> {
    ensure_supported(model_name)?;
    if n_lags == 0 {
        return Err(ForecastError("n_lags must be at least 1".to_string()));
    }

    let (x_rows, y) = features::build_training_matrix(rows, n_lags);
    if x_rows.is_empty() {
        return Err(ForecastError(format!(
            "not enough joined rows to train: need more than {} rows with matching weather, have {}",
            n_lags,
            rows.len()
        )));
    }

    let scaler = Scaler::fit(&x_rows);
    let x = dense_matrix(&scaler.transform_matrix(&x_rows));

    let model = Regressor::fit(model_name, &x, &y)?;
    let fitted = model.predict(&x)?;
    let (mae, rmse) = training_metrics(&fitted, &y);

    let pipeline = ForecastPipeline {
        model_name: model_name.to_string(),
        n_lags,
        feature_names: features::feature_names(n_lags),
        scaler,
        model,
    };
    pipeline.save(model_path)?;

    Ok(TrainSummary { training_rows: y.len(), mae, rmse })
}

/// Predicts the next `steps` hours from the persisted pipeline.
///
/// Prediction is iterative: every predicted value is appended to the target
/// history so the lag window of the following step can see it.
///
/// # Arguments
///
/// * 'history' - joined rows the model was trained on, sorted by timestamp
/// * 'future' - future weather rows, sorted by timestamp
/// * 'steps' - number of hours to predict
/// * 'model_path' - file the pipeline was persisted to
pub fn predict_future(
    history: &[TrainingRow],
    future: &[MeteoRecord],
    steps: usize,
    model_path: &str,
) -> Result<Vec<ForecastPoint>, ForecastError> {
    let pipeline = ForecastPipeline::load(model_path)?;
    let n_lags = pipeline.n_lags;

    if future.len() < steps {
        return Err(ForecastError(format!(
            "cannot predict {} steps, only {} future weather hours are available",
            steps,
            future.len()
        )));
    }

    let mut targets: Vec<f64> = history.iter().map(|r| r.target).collect();
    if targets.len() < n_lags {
        return Err(ForecastError(format!(
            "lag window needs {} historical values, have {}",
            n_lags,
            targets.len()
        )));
    }

    let mut points = Vec::with_capacity(steps);
    for record in future.iter().take(steps) {
        let lags: Vec<f64> = (1..=n_lags).map(|j| targets[targets.len() - j]).collect();
        let row = features::build_row(&features::weather_values(record), record.time, &lags);
        let scaled = pipeline.scaler.transform_row(&row);

        let x = DenseMatrix::new(1, scaled.len(), scaled, false);
        let prediction = pipeline.model.predict(&x)?[0];

        points.push(ForecastPoint { plan_dtime: record.time, pv_output: prediction });
        targets.push(prediction);
    }

    Ok(points)
}

fn dense_matrix(rows: &[Vec<f64>]) -> DenseMatrix<f64> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();

    DenseMatrix::new(n_rows, n_cols, flat, false)
}

fn training_metrics(predictions: &[f64], targets: &[f64]) -> (f64, f64) {
    let n = targets.len() as f64;

    let mae = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / n;
    let mse = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n;

    (mae, mse.sqrt())
}
