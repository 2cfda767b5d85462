//! Error types shared across the converter, the local store and the sync replayer.

use std::path::PathBuf;
use thiserror::Error;

/// A record could not be turned into INSERT statements
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("record in `{table}` is not a JSON object")]
    NotAnObject { table: String },

    #[error("field `{field}` of `{table}` holds an unsupported {kind} value")]
    UnsupportedValue {
        table: String,
        field: String,
        kind: &'static str,
    },

    #[error("field `{field}` of `{table}` mixes objects with other values")]
    MixedArray { table: String, field: String },

    #[error("field `{field}` of `{table}` contains a nested array")]
    NestedArray { table: String, field: String },

    #[error("field `{field}` of `{table}` nests child tables deeper than {max_depth} level(s)")]
    ChildTooDeep {
        table: String,
        field: String,
        max_depth: usize,
    },

    #[error("record in `{table}` has no columns to insert")]
    EmptyRecord { table: String },

    #[error("record in `{table}` is missing required field `{field}`")]
    MissingField { table: String, field: String },
}

/// Reading or writing one of the mirror's JSON/SQL files failed
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} must contain a JSON array", .path.display())]
    NotAnArray { path: PathBuf },
}

/// The export run was aborted; no script was written
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("{}, record {}: {}", .path.display(), .index, .source)]
    Record {
        path: PathBuf,
        index: usize,
        source: ConvertError,
    },

    #[error("`{}` ({}) is not a valid table name", .name, .path.display())]
    InvalidTableName { name: String, path: PathBuf },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("record for `{table}` is not a JSON object")]
    NotAnObject { table: String },

    #[error("record for `{table}` is missing field `{field}`")]
    MissingField { table: String, field: String },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{}: {}", .path.display(), .reason)]
    InvalidRequests { path: PathBuf, reason: String },
}
