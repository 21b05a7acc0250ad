//! Errors raised while loading, validating and resolving experiment configurations.
use {
    std::path::PathBuf,
    thiserror::Error,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse {origin}: {reason}")]
    Parse {
        origin: String,
        reason: String,
    },

    #[error("Unsupported config format {0:?}, expected .yaml, .yml or .json")]
    UnsupportedFormat(String),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        field: String,
        reason: String,
    },

    #[error("Unknown config key `{0}`")]
    UnknownKey(String),

    #[error("Unknown agent `{0}`")]
    UnknownAgent(String),

    #[error("Agent `{0}` has no entry in the agent section")]
    MissingAgent(String),

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

impl ConfigError {
    pub fn invalid(
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(
        origin: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::Parse {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
