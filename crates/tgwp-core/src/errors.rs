/// Core error type for the republisher.
///
/// Adapter crates map their transport errors into this type so the run loop
/// can tell "source unreachable" apart from platform failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message source error: {0}")]
    Source(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
