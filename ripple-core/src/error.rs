//! Error types.
//!
//! The reactive core itself never returns these to callers of `get`/`set`:
//! persistence failures are reported through `tracing` and swallowed. They
//! surface from the storage and configuration APIs.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to encode value for key {key:?}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode stored value for key {key:?}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage file {} could not be accessed", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {} is not a JSON object of strings", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid cell config document")]
    Config(#[from] serde_json::Error),
    #[error("invalid cell config: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
