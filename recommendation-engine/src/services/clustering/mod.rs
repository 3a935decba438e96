/// Cluster Model
///
/// Partitions the working feature matrix with seeded k-means. Cluster ids
/// are descriptive metadata on formatted results; no recall strategy
/// filters by them.
use crate::error::{EngineError, Result};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::info;

/// Fixed seed so cluster assignments are reproducible across runs.
const CLUSTER_SEED: u64 = 42;
const MIN_CLUSTERS: usize = 5;
const MAX_CLUSTERS: usize = 20;
/// Catalog rows per additional cluster.
const ROWS_PER_CLUSTER: usize = 1000;

pub struct ClusterModel {
    assignments: Array1<usize>,
    n_clusters: usize,
}

impl ClusterModel {
    /// Number of clusters for a catalog of `rows` tracks. The clamp is
    /// additionally capped at the row count: centroid-based fitting cannot
    /// place more clusters than points.
    pub fn cluster_count(rows: usize) -> usize {
        (rows / ROWS_PER_CLUSTER).clamp(MIN_CLUSTERS, MAX_CLUSTERS).min(rows)
    }

    pub fn fit(working: &Array2<f64>) -> Result<Self> {
        let rows = working.nrows();
        if rows == 0 {
            return Err(EngineError::Preprocessing(
                "cannot cluster an empty feature matrix".to_string(),
            ));
        }

        let n_clusters = Self::cluster_count(rows);
        let rng = Xoshiro256Plus::seed_from_u64(CLUSTER_SEED);
        let dataset = DatasetBase::from(working.clone());

        let model = KMeans::params_with_rng(n_clusters, rng)
            .max_n_iterations(300)
            .fit(&dataset)
            .map_err(|e| EngineError::Preprocessing(format!("k-means fitting failed: {}", e)))?;

        let assignments = model.predict(working);

        info!(clusters = n_clusters, tracks = rows, "catalog clustered");

        Ok(ClusterModel {
            assignments,
            n_clusters,
        })
    }

    pub fn assignments(&self) -> &[usize] {
        self.assignments.as_slice().unwrap_or(&[])
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
