use std::f64::consts::PI;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use crate::manager_forecast::TrainingRow;
use crate::models::{MeteoRecord, METEO_HOURLY_COLUMNS};

const CYCLICAL_FEATURES: [&str; 6] = [
    "dt_hour_sin",
    "dt_hour_cos",
    "dt_dayofyear_sin",
    "dt_dayofyear_cos",
    "dt_month_sin",
    "dt_month_cos",
];

/// Returns the weather variables of a record as a fixed order value vector,
/// missing values filled with zero.
pub fn weather_values(record: &MeteoRecord) -> Vec<f64> {
    [
        record.temperature_2m,
        record.cloud_cover,
        record.wind_speed_10m,
        record.wind_gusts_10m,
        record.relative_humidity_2m,
        record.shortwave_radiation,
        record.direct_radiation,
        record.diffuse_radiation,
        record.global_tilted_irradiance,
        record.direct_normal_irradiance,
        record.terrestrial_radiation,
    ]
    .iter()
    .map(|v| v.unwrap_or(0.0))
    .collect()
}

/// Cyclical sin/cos encodings of hour of day, day of year and month.
pub fn cyclical_time(time: NaiveDateTime) -> Vec<f64> {
    let hour = time.hour() as f64;
    let day_of_year = time.ordinal() as f64;
    let month = time.month() as f64;

    vec![
        (2.0 * PI * hour / 24.0).sin(),
        (2.0 * PI * hour / 24.0).cos(),
        (2.0 * PI * day_of_year / 365.0).sin(),
        (2.0 * PI * day_of_year / 365.0).cos(),
        (2.0 * PI * month / 12.0).sin(),
        (2.0 * PI * month / 12.0).cos(),
    ]
}

/// Names of the full feature vector, in build order.
pub fn feature_names(n_lags: usize) -> Vec<String> {
    METEO_HOURLY_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(CYCLICAL_FEATURES.iter().map(|c| c.to_string()))
        .chain((1..=n_lags).map(|i| format!("fcst_pv_tot_gen_lag_{}", i)))
        .collect()
}

/// Builds one feature row: weather variables, cyclical time encodings, then
/// the lag window ordered most recent first.
pub fn build_row(weather: &[f64], time: NaiveDateTime, lags: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(weather.len() + CYCLICAL_FEATURES.len() + lags.len());
    row.extend_from_slice(weather);
    row.extend(cyclical_time(time));
    row.extend_from_slice(lags);
    row
}

/// Builds the training matrix and target vector from joined rows.
///
/// The first `n_lags` rows have no full lag window and are dropped, matching
/// the lag construction used at prediction time.
///
/// # Arguments
///
/// * 'rows' - joined rows sorted by timestamp
/// * 'n_lags' - number of lagged target values per feature row
pub fn build_training_matrix(rows: &[TrainingRow], n_lags: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();

    for i in n_lags..rows.len() {
        let lags: Vec<f64> = (1..=n_lags).map(|j| rows[i - j].target).collect();
        x.push(build_row(&rows[i].weather, rows[i].time, &lags));
        y.push(rows[i].target);
    }

    (x, y)
}

/// Per column standardization fitted on the training matrix and reapplied
/// at prediction time.
#[derive(Debug, Serialize, Deserialize)]
pub struct Scaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Scaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n = rows.len() as f64;
        let width = rows.first().map(|r| r.len()).unwrap_or(0);

        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in means.iter_mut() {
            *m /= n;
        }

        let mut stds = vec![0.0; width];
        for row in rows {
            for ((s, m), v) in stds.iter_mut().zip(&means).zip(row) {
                *s += (v - m).powi(2);
            }
        }
        for s in stds.iter_mut() {
            *s = (*s / n).sqrt();
            // Constant columns pass through unscaled.
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, stds }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.stds)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }

    pub fn transform_matrix(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn rows(n: usize) -> Vec<TrainingRow> {
        (0..n)
            .map(|i| TrainingRow {
                time: at(i as u32 % 24),
                target: i as f64,
                weather: vec![0.0; 11],
            })
            .collect()
    }

    #[test]
    fn cyclical_encodings_stay_in_unit_range_and_wrap() {
        for hour in 0..24 {
            let encoded = cyclical_time(at(hour));
            assert_eq!(encoded.len(), 6);
            assert!(encoded.iter().all(|v| (-1.0..=1.0).contains(v)));
        }

        // Midnight and a full day later encode identically.
        let midnight = cyclical_time(at(0));
        assert!((midnight[0] - 0.0).abs() < 1e-12);
        assert!((midnight[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lag_window_drops_leading_rows() {
        let (x, y) = build_training_matrix(&rows(10), 3);

        assert_eq!(x.len(), 7);
        assert_eq!(y, vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        // First trainable row: lags of target 3.0 are [2.0, 1.0, 0.0].
        let lags = &x[0][x[0].len() - 3..];
        assert_eq!(lags, &[2.0, 1.0, 0.0]);
    }

    #[test]
    fn feature_names_match_row_width() {
        let (x, _) = build_training_matrix(&rows(5), 2);
        assert_eq!(feature_names(2).len(), x[0].len());
    }

    #[test]
    fn scaler_standardizes_columns() {
        let data = vec![vec![1.0, 10.0], vec![3.0, 10.0], vec![5.0, 10.0]];
        let scaler = Scaler::fit(&data);
        let scaled = scaler.transform_matrix(&data);

        // First column: mean 3, centered symmetric values.
        assert!((scaled[0][0] + scaled[2][0]).abs() < 1e-12);
        assert!(scaled[1][0].abs() < 1e-12);
        // Constant column passes through centered, not divided by zero.
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }
}
