use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Preprocessing error: {0}")]
    Preprocessing(String),

    #[error("Similarity index build error: {0}")]
    Build(String),

    #[error("Generation error: {0}")]
    Generation(String),
}

// Implement conversions from other error types
impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Data(format!("malformed request payload: {}", err))
    }
}
