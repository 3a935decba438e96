pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::EngineConfig;
pub use engine::{EngineBuilder, RecommendationEngine};
pub use error::{EngineError, Result};
