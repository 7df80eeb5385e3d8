use thiserror::Error;

#[derive(Error, Debug)]
pub enum DarkscoutError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("A scan for '{0}' is already running")]
    ScanAlreadyRunning(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
