use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Number of features the regression was fit on, in fixed order:
/// A_LC, B_MFR_S205, C_MFR_S206, D_MFR_S402C.
pub const FEATURE_COUNT: usize = 4;

/// Per-feature standardization parameters exported from the fitted scaler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Mean of each feature over the training set
    pub mean: Vec<f64>,

    /// Standard deviation of each feature over the training set
    pub scale: Vec<f64>,
}

/// Linear regression parameters exported from the fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionParams {
    /// Intercept term
    pub intercept: f64,

    /// One coefficient per scaled feature
    pub coefficients: Vec<f64>,
}

/// Pre-trained scaler + regression pair.
///
/// Loaded once at startup and held for the process lifetime. Prediction
/// itself has no error path: the input shape is guaranteed by the type, and
/// parameter shapes are checked at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predictor {
    scaler: ScalerParams,
    model: RegressionParams,
}

impl Predictor {
    /// Load predictor parameters from a JSON file.
    ///
    /// # Arguments
    /// * `path` - Path to the parameter file exported from the training
    ///   pipeline
    ///
    /// # Returns
    /// * `Result<Predictor, Box<dyn Error>>` - The predictor, or an error if
    ///   the file is unreadable, malformed, or the parameter shapes disagree
    ///   with the fixed feature count
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let file = File::open(path.as_ref()).map_err(|e| {
            format!("cannot open model file {}: {}", path.as_ref().display(), e)
        })?;
        let reader = BufReader::new(file);
        let predictor: Predictor = serde_json::from_reader(reader)?;
        predictor.check_shapes()?;
        Ok(predictor)
    }

    /// Build a predictor directly from parameter values.
    pub fn from_params(
        mean: Vec<f64>,
        scale: Vec<f64>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let predictor = Predictor {
            scaler: ScalerParams { mean, scale },
            model: RegressionParams {
                intercept,
                coefficients,
            },
        };
        predictor.check_shapes()?;
        Ok(predictor)
    }

    fn check_shapes(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.scaler.mean.len() != FEATURE_COUNT {
            return Err(format!(
                "scaler mean has {} entries, expected {}",
                self.scaler.mean.len(),
                FEATURE_COUNT
            )
            .into());
        }
        if self.scaler.scale.len() != FEATURE_COUNT {
            return Err(format!(
                "scaler scale has {} entries, expected {}",
                self.scaler.scale.len(),
                FEATURE_COUNT
            )
            .into());
        }
        if self.model.coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "model has {} coefficients, expected {}",
                self.model.coefficients.len(),
                FEATURE_COUNT
            )
            .into());
        }
        if self.scaler.scale.iter().any(|s| *s == 0.0) {
            return Err("scaler scale contains a zero entry".into());
        }
        Ok(())
    }

    /// Apply the scaler, then the regression, returning one scalar.
    pub fn predict(&self, features: [f64; FEATURE_COUNT]) -> f64 {
        let mut value = self.model.intercept;
        for i in 0..FEATURE_COUNT {
            let scaled = (features[i] - self.scaler.mean[i]) / self.scaler.scale[i];
            value += scaled * self.model.coefficients[i];
        }
        value
    }
}
