//! Reading and atomically rewriting the mirror's files.

use crate::error::FileError;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Read a file that must hold a JSON array of records
pub fn read_array(path: &Path) -> Result<Vec<Value>, FileError> {
    match read_value(path)? {
        Value::Array(items) => Ok(items),
        _ => Err(FileError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}

pub fn read_value(path: &Path) -> Result<Value, FileError> {
    let text = fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| FileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print `value` with a two-space indent and replace `path` atomically
pub fn write_pretty(path: &Path, value: &Value) -> Result<(), FileError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| FileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, text.as_bytes())
}

/// Write `content` to a sibling temp file, sync it, then rename over `path`.
///
/// If any step fails the previous contents of `path` are left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FileError> {
    let wrap = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
    }

    let temp_path = temp_path_for(path);
    {
        let file = File::create(&temp_path).map_err(wrap)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content).map_err(wrap)?;
        writer.flush().map_err(wrap)?;
        writer.get_ref().sync_all().map_err(wrap)?;
    }

    fs::rename(&temp_path, path).map_err(wrap)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("actors.json");

        write_pretty(&path, &json!([{"uuid": "a1", "first_name": "Ada"}])).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {\n    \"uuid\": \"a1\""));
        let items = read_array(&path).unwrap();
        assert_eq!(items.len(), 1);
        assert!(!dir.path().join("nested").join("actors.json.tmp").exists());
    }

    #[test]
    fn test_read_array_rejects_objects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("games.json");
        fs::write(&path, "{\"uuid\": \"g1\"}").unwrap();

        assert!(matches!(read_array(&path), Err(FileError::NotAnArray { .. })));
    }

    #[test]
    fn test_read_reports_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("games.json");
        fs::write(&path, "[{\"uuid\": ").unwrap();

        let err = read_array(&path).unwrap_err();
        assert!(matches!(err, FileError::Json { .. }));
        assert!(err.to_string().contains("games.json"));
    }
}
