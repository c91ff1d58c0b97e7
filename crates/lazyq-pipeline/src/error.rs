use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("query: {0}")]
    Query(#[from] lazyq_core::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
