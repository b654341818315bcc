// src/store/mode.rs

use std::{fmt, str::FromStr};

use crate::error::IngestError;

/// What `ingest_db` does when the target table already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Drop and recreate the table.
    Replace,
    /// Add rows to the existing table, creating it if absent.
    Append,
    /// Refuse to touch an existing table.
    Fail,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Replace => "replace",
            WriteMode::Append => "append",
            WriteMode::Fail => "fail",
        }
    }
}

impl FromStr for WriteMode {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(WriteMode::Replace),
            "append" => Ok(WriteMode::Append),
            "fail" => Ok(WriteMode::Fail),
            _ => Err(IngestError::InvalidWriteMode(s.to_string())),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
