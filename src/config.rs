//! Course configuration and JSON input loading.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compat::CompatibilityTable;
use crate::limits::SearchLimits;
use crate::shift::ShiftQuery;

/// Failure to load a JSON input.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON of the expected shape.
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Course-level settings: who may teach with whom, how hard to search, and which shifts to attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instructor pairs allowed in preference requests.
    pub compatibility: CompatibilityTable,
    /// Search caps and deadline.
    pub limits: SearchLimits,
    /// Shifts to attempt when none are given on the command line.
    pub shifts: Vec<ShiftQuery>,
}

impl Config {
    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        load_json(path)
    }
}

/// Read and deserialize a JSON file, e.g. a request batch or a roster.
pub fn load_json<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}
