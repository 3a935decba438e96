/// Feature Transformer
///
/// Fits standardization and min-max normalization over the full catalog in
/// one pass, plus PCA when the feature space is wide enough, and keeps the
/// fitted parameters so single vectors (e.g. a user preference vector) can
/// be projected into the same space later. Produced by the builder before
/// any request is served; immutable afterwards.
use crate::error::{EngineError, Result};
use crate::services::features::FeatureTable;
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_reduction::Pca;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::{debug, info};

/// PCA kicks in above this many feature columns.
const REDUCTION_THRESHOLD: usize = 5;
const MIN_COMPONENTS: usize = 5;
const MAX_COMPONENTS: usize = 50;

pub struct FittedPipeline {
    means: Array1<f64>,
    stds: Array1<f64>,
    mins: Array1<f64>,
    ranges: Array1<f64>,
    reduction: Option<Pca<f64>>,
    /// Standardized matrix, replaced by its PCA projection when fitted.
    working: Array2<f64>,
    /// Min-max normalized matrix, always full dimensionality.
    normalized: Array2<f64>,
}

impl FittedPipeline {
    pub fn fit(table: &FeatureTable) -> Result<Self> {
        let matrix = table.matrix();
        let rows = matrix.nrows();
        if rows == 0 {
            return Err(EngineError::Preprocessing(
                "cannot fit transforms on an empty feature matrix".to_string(),
            ));
        }

        let means = matrix.mean_axis(Axis(0)).ok_or_else(|| {
            EngineError::Preprocessing("cannot fit transforms on an empty feature matrix".to_string())
        })?;
        // Population standard deviation; constant columns keep scale 1 so
        // they standardize to zero instead of dividing by zero.
        let stds = matrix
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < f64::EPSILON { 1.0 } else { s });

        let mins = matrix.fold_axis(Axis(0), f64::INFINITY, |acc, &x| acc.min(x));
        let maxs = matrix.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &x| acc.max(x));
        let ranges = (&maxs - &mins).mapv(|r| if r < f64::EPSILON { 1.0 } else { r });

        let standardized = (matrix - &means) / &stds;
        let normalized = (matrix - &mins) / &ranges;

        let n_features = matrix.ncols();
        let (reduction, working) = if n_features > REDUCTION_THRESHOLD {
            let n_components = (n_features / 2).clamp(MIN_COMPONENTS, MAX_COMPONENTS);
            if n_components > rows {
                return Err(EngineError::Preprocessing(format!(
                    "cannot reduce {} features to {} components with only {} tracks",
                    n_features, n_components, rows
                )));
            }

            let dataset = DatasetBase::from(standardized.clone());
            let pca = Pca::params(n_components).fit(&dataset).map_err(|e| {
                EngineError::Preprocessing(format!("PCA fitting failed: {}", e))
            })?;
            let projected = pca.predict(&standardized);

            info!(
                from = n_features,
                to = n_components,
                "PCA applied to standardized features"
            );

            (Some(pca), projected)
        } else {
            debug!(
                features = n_features,
                "feature space small enough, skipping reduction"
            );
            (None, standardized)
        };

        Ok(FittedPipeline {
            means,
            stds,
            mins,
            ranges,
            reduction,
            working,
            normalized,
        })
    }

    /// Standardized (possibly reduced) matrix all similarity-driven
    /// consumers read. Row i corresponds to track row i.
    pub fn working(&self) -> &Array2<f64> {
        &self.working
    }

    pub fn normalized(&self) -> &Array2<f64> {
        &self.normalized
    }

    pub fn working_dim(&self) -> usize {
        self.working.ncols()
    }

    pub fn is_reduced(&self) -> bool {
        self.reduction.is_some()
    }

    /// Project a vector of the original full dimensionality into the
    /// working space: standardize with the fitted parameters, then apply
    /// the fitted reduction when present.
    pub fn project_vector(&self, raw: ArrayView1<f64>) -> Result<Array1<f64>> {
        if raw.len() != self.means.len() {
            return Err(EngineError::Generation(format!(
                "vector has {} features, pipeline was fitted on {}",
                raw.len(),
                self.means.len()
            )));
        }

        let standardized = (&raw - &self.means) / &self.stds;
        match &self.reduction {
            Some(pca) => {
                let query = standardized.insert_axis(Axis(0));
                let projected = pca.predict(&query);
                Ok(projected.row(0).to_owned())
            }
            None => Ok(standardized),
        }
    }

    /// Min-max transform of a single full-dimensional vector with the
    /// fitted parameters.
    pub fn normalize_vector(&self, raw: ArrayView1<f64>) -> Result<Array1<f64>> {
        if raw.len() != self.mins.len() {
            return Err(EngineError::Generation(format!(
                "vector has {} features, pipeline was fitted on {}",
                raw.len(),
                self.mins.len()
            )));
        }
        Ok((&raw - &self.mins) / &self.ranges)
    }
}
