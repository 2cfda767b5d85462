//! Translation fan-out: renders pre-split translation records of a parent
//! into `<table>_translations` inserts.

use crate::config::CatalogConfig;
use crate::error::{ConvertError, FileError};
use crate::json_file;
use crate::sql::emit::SqlConverter;
use crate::sql::statement::InsertStatement;
use serde_json::Value;

/// All translation records of one translatable table, in file order
#[derive(Debug, Clone)]
pub struct TranslationSet {
    table: String,
    join_key: String,
    records: Vec<Value>,
}

impl TranslationSet {
    /// Load `translations/<table>_translations.json`
    pub fn load(config: &CatalogConfig, table: &str) -> Result<Self, FileError> {
        let records = json_file::read_array(&config.translation_path(table))?;
        Ok(Self::from_records(config, table, records))
    }

    pub fn from_records(config: &CatalogConfig, table: &str, records: Vec<Value>) -> Self {
        TranslationSet {
            table: config.translation_table(table),
            join_key: config.translation_key(table),
            records,
        }
    }

    /// Relation the rendered statements target
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Translation records joined to `uuid`, in file order
    pub fn matching<'a>(&'a self, uuid: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records
            .iter()
            .filter(move |record| record.get(&self.join_key).and_then(Value::as_str) == Some(uuid))
    }

    /// Render every translation of `uuid`; no match yields an empty list
    pub fn fan_out(
        &self,
        converter: &SqlConverter,
        uuid: &str,
    ) -> Result<Vec<InsertStatement>, ConvertError> {
        let mut statements = Vec::new();
        for record in self.matching(uuid) {
            statements.extend(converter.convert(&self.table, record)?);
        }
        Ok(statements)
    }
}
