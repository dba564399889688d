use thiserror::Error;

use crate::format::Format;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, LsdError>;

/// Everything that can stop a transform. Any of these aborts the run without output.
#[derive(Error, Debug)]
pub enum LsdError {
    /// Input was not JSON and could not be read as YAML either
    #[error("error converting from yaml to json")]
    Conversion(#[source] BoxError),

    /// Input is structured data but not a secret-shaped mapping
    #[error("error parsing secret")]
    Parse(#[source] serde_json::Error),

    /// `items` is present but is not a list of objects
    #[error("could not convert list secrets: {0}")]
    Shape(String),

    /// A `data` entry holds something other than a string
    #[error("could not convert data key {key:?} to string")]
    Type { key: String },

    #[error("can not marshal secret to {format}")]
    Serialization {
        format: Format,
        #[source]
        source: BoxError,
    },
}
