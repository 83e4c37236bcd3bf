use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuidelineError {
    #[error("Failed to read guideline catalog {path:?}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse guideline catalog {path}: {message}")]
    CatalogParse { path: String, message: String },

    #[error("Rule '{rule}' has no entry in the guideline catalog")]
    UnknownGuideline { rule: String },

    #[error("Rule '{rule}' is registered more than once")]
    DuplicateRule { rule: String },

    #[error("{standard} guidelines are not yet implemented.")]
    NotImplemented { standard: String },

    #[error("The specified BIDS directory '{}' does not exist.", path.display())]
    DatasetMissing { path: PathBuf },

    #[error("The specified path '{}' is not a directory.", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed to index dataset {path:?}: {message}")]
    Index { path: PathBuf, message: String },

    #[error("Malformed sidecar {path:?}: {message}")]
    Sidecar { path: PathBuf, message: String },

    #[error("Rule panicked: {0}")]
    Panicked(String),

    #[error("Tally {tally} exceeds total {total}")]
    InvalidTally { tally: u64, total: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog conversion error: {0}")]
    Convert(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GuidelineError>;
