use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeBootError {
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("No supported package manager found (tried {0})")]
    NoPackageManager(String),
}

impl From<toml::de::Error> for NodeBootError {
    fn from(error: toml::de::Error) -> Self {
        Self::DeserializationError(error.to_string())
    }
}
