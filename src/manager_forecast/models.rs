use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::lasso::{Lasso, LassoParameters};
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use smartcore::linear::ridge_regression::{RidgeRegression, RidgeRegressionParameters};
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_regressor::{KNNRegressor, KNNRegressorParameters};
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use crate::manager_forecast::errors::ForecastError;

pub const SUPPORTED_MODELS: [&str; 6] = [
    "LinearRegression",
    "Ridge",
    "Lasso",
    "DecisionTreeRegressor",
    "RandomForestRegressor",
    "KNNRegressor",
];

/// Regression model zoo, keyed by the names accepted on the forecast
/// endpoint.
#[derive(Serialize, Deserialize, Debug)]
pub enum Regressor {
    Linear(LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    Ridge(RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    Lasso(Lasso<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    DecisionTree(DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    Knn(KNNRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>, Euclidian<f64>>),
}

impl Regressor {
    /// Fits the named model on the given matrix and target.
    ///
    /// # Arguments
    ///
    /// * 'model_name' - one of `SUPPORTED_MODELS`
    /// * 'x' - scaled feature matrix
    /// * 'y' - target vector
    pub fn fit(
        model_name: &str,
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
    ) -> Result<Self, ForecastError> {
        let model = match model_name {
            "LinearRegression" => {
                Regressor::Linear(LinearRegression::fit(x, y, LinearRegressionParameters::default())?)
            }
            "Ridge" => {
                Regressor::Ridge(RidgeRegression::fit(x, y, RidgeRegressionParameters::default())?)
            }
            "Lasso" => Regressor::Lasso(Lasso::fit(x, y, LassoParameters::default())?),
            "DecisionTreeRegressor" => Regressor::DecisionTree(DecisionTreeRegressor::fit(
                x,
                y,
                DecisionTreeRegressorParameters::default(),
            )?),
            "RandomForestRegressor" => Regressor::RandomForest(RandomForestRegressor::fit(
                x,
                y,
                forest_parameters(),
            )?),
            "KNNRegressor" => {
                Regressor::Knn(KNNRegressor::fit(x, y, KNNRegressorParameters::default())?)
            }
            other => {
                return Err(ForecastError(format!(
                    "unknown model name '{}', supported models: {}",
                    other,
                    SUPPORTED_MODELS.join(", ")
                )))
            }
        };

        Ok(model)
    }

    pub fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, ForecastError> {
        let predictions = match self {
            Regressor::Linear(m) => m.predict(x)?,
            Regressor::Ridge(m) => m.predict(x)?,
            Regressor::Lasso(m) => m.predict(x)?,
            Regressor::DecisionTree(m) => m.predict(x)?,
            Regressor::RandomForest(m) => m.predict(x)?,
            Regressor::Knn(m) => m.predict(x)?,
        };

        Ok(predictions)
    }
}

/// Forest sizing kept moderate so training stays interactive on hourly
/// series of a few months.
fn forest_parameters() -> RandomForestRegressorParameters {
    RandomForestRegressorParameters {
        max_depth: Some(10),
        min_samples_leaf: 2,
        min_samples_split: 5,
        n_trees: 50,
        m: None,
        keep_samples: false,
        seed: 42,
    }
}
