use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown log format: {0}")]
    LogFormat(String),
}
