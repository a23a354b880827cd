use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unavailable in embedded mode: {0}")]
    UnsupportedInEmbeddedMode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, StudioError>;
