use thiserror::Error;

/// Fatal, run-level configuration failures. Any of these aborts the run
/// before a single pipeline starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locations file {path}: {source}")]
    LocationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locations file: {0}")]
    LocationsFileParse(#[source] serde_json::Error),

    #[error("failed to read target file {path}: {source}")]
    TargetFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse target file: {0}")]
    TargetFileParse(#[source] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

/// Invalid shard parameters. Fatal: raised before any pipeline starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("total shard count must be at least 1")]
    NoShards,

    #[error("shard index {index} is outside 1..={total}")]
    IndexOutOfRange { index: usize, total: usize },
}
