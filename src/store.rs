//! Local JSON mirror: one array file per table plus per-table translation files.
//!
//! Every mutation rewrites the whole table file atomically.

use crate::config::CatalogConfig;
use crate::error::{FileError, StoreError};
use crate::json_file;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub struct LocalStore {
    config: CatalogConfig,
}

impl LocalStore {
    pub fn new(config: CatalogConfig) -> Self {
        LocalStore { config }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// First-run scaffolding. Creates every table and translation file as
    /// `[]` when the mirror folder does not exist yet; returns whether
    /// anything was created.
    pub fn init(&self) -> Result<bool, StoreError> {
        if self.config.db_folder.exists() {
            debug!(path = %self.config.db_folder.display(), "Mirror already initialized");
            return Ok(false);
        }

        let translations_dir = self.config.translations_dir();
        fs::create_dir_all(&translations_dir).map_err(|source| FileError::Write {
            path: translations_dir.clone(),
            source,
        })?;

        for table in &self.config.tables {
            write_empty(&self.config.table_path(table))?;
        }
        for table in &self.config.translation_tables {
            write_empty(&self.config.translation_path(table))?;
        }

        info!(path = %self.config.data_dir().display(), "Created local mirror");
        Ok(true)
    }

    pub fn read_table(&self, table: &str) -> Result<Vec<Value>, StoreError> {
        Ok(json_file::read_array(&self.config.table_path(table))?)
    }

    pub fn read_translations(&self, table: &str) -> Result<Vec<Value>, StoreError> {
        Ok(json_file::read_array(&self.config.translation_path(table))?)
    }

    /// Append a record. On translatable tables the translatable fields are
    /// moved into a new translation record keyed by `<singular>_uuid`.
    pub fn insert(&self, table: &str, record: Value) -> Result<(), StoreError> {
        let record = into_object(table, record)?;

        let record = if self.config.is_translatable(table) {
            let (base, translation) = self.split_translation(table, record)?;
            self.insert_translation(table, Value::Object(translation))?;
            base
        } else {
            record
        };

        let mut data = self.read_table(table)?;
        data.push(Value::Object(record));
        self.write_table(table, data)
    }

    pub fn insert_translation(&self, table: &str, record: Value) -> Result<(), StoreError> {
        let mut data = self.read_translations(table)?;
        data.push(record);
        self.write_translations(table, data)
    }

    /// Merge `patch` into every record whose `uuid` matches `patch.uuid`
    pub fn update(&self, table: &str, patch: &Value) -> Result<usize, StoreError> {
        let uuid = required_str(table, patch, "uuid")?;
        let mut data = self.read_table(table)?;

        let updated =
            merge_matching(&mut data, patch, |item| str_field(item, "uuid") == Some(uuid));
        self.write_table(table, data)?;
        Ok(updated)
    }

    /// Merge `patch` into the translation matching its join key and language
    pub fn update_translation(&self, table: &str, patch: &Value) -> Result<usize, StoreError> {
        let key = self.config.translation_key(table);
        let uuid = required_str(table, patch, &key)?;
        let language = required_str(table, patch, "language")?;
        let mut data = self.read_translations(table)?;

        let updated = merge_matching(&mut data, patch, |item| {
            str_field(item, &key) == Some(uuid) && str_field(item, "language") == Some(language)
        });
        self.write_translations(table, data)?;
        Ok(updated)
    }

    pub fn delete(&self, table: &str, uuid: &str) -> Result<usize, StoreError> {
        let mut data = self.read_table(table)?;
        let before = data.len();
        data.retain(|item| str_field(item, "uuid") != Some(uuid));
        let removed = before - data.len();

        self.write_table(table, data)?;
        Ok(removed)
    }

    pub fn delete_translation(
        &self,
        table: &str,
        uuid: &str,
        language: &str,
    ) -> Result<usize, StoreError> {
        let key = self.config.translation_key(table);
        let mut data = self.read_translations(table)?;
        let before = data.len();
        data.retain(|item| {
            !(str_field(item, &key) == Some(uuid) && str_field(item, "language") == Some(language))
        });
        let removed = before - data.len();

        self.write_translations(table, data)?;
        Ok(removed)
    }

    fn split_translation(
        &self,
        table: &str,
        record: Map<String, Value>,
    ) -> Result<(Map<String, Value>, Map<String, Value>), StoreError> {
        let uuid = record
            .get("uuid")
            .cloned()
            .ok_or_else(|| StoreError::MissingField {
                table: table.to_string(),
                field: "uuid".to_string(),
            })?;

        let mut base = Map::new();
        let mut translation = Map::new();
        translation.insert(self.config.translation_key(table), uuid);

        for (key, value) in record {
            if self.config.is_translation_field(&key) {
                translation.insert(key, value);
            } else {
                base.insert(key, value);
            }
        }

        Ok((base, translation))
    }

    fn write_table(&self, table: &str, data: Vec<Value>) -> Result<(), StoreError> {
        Ok(json_file::write_pretty(&self.config.table_path(table), &Value::Array(data))?)
    }

    fn write_translations(&self, table: &str, data: Vec<Value>) -> Result<(), StoreError> {
        Ok(json_file::write_pretty(&self.config.translation_path(table), &Value::Array(data))?)
    }
}

fn write_empty(path: &Path) -> Result<(), StoreError> {
    Ok(json_file::write_atomic(path, b"[]")?)
}

fn into_object(table: &str, value: Value) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(obj) => Ok(obj),
        _ => Err(StoreError::NotAnObject {
            table: table.to_string(),
        }),
    }
}

fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

fn required_str<'a>(table: &str, value: &'a Value, field: &str) -> Result<&'a str, StoreError> {
    str_field(value, field).ok_or_else(|| StoreError::MissingField {
        table: table.to_string(),
        field: field.to_string(),
    })
}

fn merge_matching(data: &mut [Value], patch: &Value, matches: impl Fn(&Value) -> bool) -> usize {
    let Some(patch) = patch.as_object() else {
        return 0;
    };

    let mut updated = 0;
    for item in data.iter_mut() {
        if !matches(item) {
            continue;
        }
        if let Value::Object(obj) = item {
            for (key, value) in patch {
                obj.insert(key.clone(), value.clone());
            }
            updated += 1;
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let config = CatalogConfig {
            db_folder: dir.path().join("db"),
            ..CatalogConfig::default()
        };
        let store = LocalStore::new(config);
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn test_init_scaffolds_once() {
        let (_dir, store) = store();
        let config = store.config();

        for table in &config.tables {
            assert_eq!(fs::read_to_string(config.table_path(table)).unwrap(), "[]");
        }
        for table in &config.translation_tables {
            assert!(config.translation_path(table).exists());
        }

        store.insert("actors", json!({"uuid": "a1"})).unwrap();
        assert!(!store.init().unwrap());
        assert_eq!(store.read_table("actors").unwrap().len(), 1);
    }

    #[test]
    fn test_insert_plain_table() {
        let (_dir, store) = store();
        store
            .insert("actors", json!({"uuid": "a1", "first_name": "Millie", "name": "kept"}))
            .unwrap();

        assert_eq!(
            store.read_table("actors").unwrap(),
            vec![json!({"uuid": "a1", "first_name": "Millie", "name": "kept"})]
        );
    }

    #[test]
    fn test_insert_splits_translation_fields() {
        let (_dir, store) = store();
        store
            .insert(
                "episodes",
                json!({
                    "uuid": "e1",
                    "title": "The Vanishing",
                    "duration": 2940,
                    "language": "en",
                    "description": "Will disappears."
                }),
            )
            .unwrap();

        assert_eq!(
            store.read_table("episodes").unwrap(),
            vec![json!({"uuid": "e1", "duration": 2940})]
        );

        let translations = store.read_translations("episodes").unwrap();
        assert_eq!(translations.len(), 1);
        let keys: Vec<&str> = translations[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["episode_uuid", "title", "language", "description"]);
        assert_eq!(translations[0]["episode_uuid"], "e1");
    }

    #[test]
    fn test_insert_translatable_requires_uuid() {
        let (_dir, store) = store();
        let err = store.insert("games", json!({"name": "Zork"})).unwrap_err();

        assert!(matches!(err, StoreError::MissingField { ref field, .. } if field == "uuid"));
        assert!(store.read_translations("games").unwrap().is_empty());
    }

    #[test]
    fn test_update_merges_patch() {
        let (_dir, store) = store();
        store.insert("actors", json!({"uuid": "a1", "first_name": "Finn"})).unwrap();
        store.insert("actors", json!({"uuid": "a2", "first_name": "Gaten"})).unwrap();

        let updated = store
            .update("actors", &json!({"uuid": "a2", "last_name": "Matarazzo"}))
            .unwrap();

        assert_eq!(updated, 1);
        let data = store.read_table("actors").unwrap();
        assert_eq!(data[0], json!({"uuid": "a1", "first_name": "Finn"}));
        assert_eq!(data[1], json!({"uuid": "a2", "first_name": "Gaten", "last_name": "Matarazzo"}));
    }

    #[test]
    fn test_translation_update_and_delete() {
        let (_dir, store) = store();
        store
            .insert_translation(
                "seasons",
                json!({"season_uuid": "s1", "language": "en", "title": "One"}),
            )
            .unwrap();
        store
            .insert_translation(
                "seasons",
                json!({"season_uuid": "s1", "language": "pt", "title": "Um"}),
            )
            .unwrap();

        let updated = store
            .update_translation(
                "seasons",
                &json!({"season_uuid": "s1", "language": "pt", "title": "Temporada 1"}),
            )
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(store.read_translations("seasons").unwrap()[1]["title"], "Temporada 1");

        let removed = store.delete_translation("seasons", "s1", "en").unwrap();
        assert_eq!(removed, 1);
        let remaining = store.read_translations("seasons").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["language"], "pt");
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        store.insert("soundtracks", json!({"uuid": "t1", "name": "Should I Stay"})).unwrap();
        store.insert("soundtracks", json!({"uuid": "t2", "name": "Running Up"})).unwrap();

        assert_eq!(store.delete("soundtracks", "t1").unwrap(), 1);
        assert_eq!(store.delete("soundtracks", "missing").unwrap(), 0);
        assert_eq!(
            store.read_table("soundtracks").unwrap(),
            vec![json!({"uuid": "t2", "name": "Running Up"})]
        );
    }
}
