use thiserror::Error;

/// Errors raised while locating, reading, or validating a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory to locate the config file")]
    NoHomeDir,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
