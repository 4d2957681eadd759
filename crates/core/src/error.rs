use thiserror::Error;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Adaptor error: {0}")]
    Adaptor(String),
}
