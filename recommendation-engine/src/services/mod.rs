pub mod clustering;
pub mod features;
pub mod preprocessing;
pub mod ranking;
pub mod recall;
pub mod similarity;

pub use clustering::ClusterModel;
pub use features::FeatureTable;
pub use preprocessing::FittedPipeline;
pub use ranking::FusionRanker;
pub use recall::{RecallContext, RecallLayer, RecallStrategy};
pub use similarity::SimilarityIndex;
