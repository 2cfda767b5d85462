//! Export driver: walks every table file of the mirror and builds the SQL script.
//!
//! The run is all or nothing. Statements are buffered in memory and the
//! script is only replaced once every table converted cleanly.

use crate::config::CatalogConfig;
use crate::error::{ConvertError, ExportError, FileError};
use crate::json_file;
use crate::sql::emit::SqlConverter;
use crate::sql::statement::InsertStatement;
use crate::sql::translations::TranslationSet;
use crate::sql::writer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static TABLE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Summary of a successful export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStats {
    pub output_path: PathBuf,
    pub tables: usize,
    pub records: usize,
    pub statements: usize,
}

/// A table file discovered in the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub name: String,
    pub path: PathBuf,
}

pub struct Exporter {
    config: CatalogConfig,
    converter: SqlConverter,
}

impl Exporter {
    pub fn new(config: CatalogConfig) -> Self {
        let converter = SqlConverter::new(&config);
        Exporter { config, converter }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Convert the whole mirror and replace the output script
    pub fn export(&self) -> Result<ExportStats, ExportError> {
        let output_path = self.config.output_path();
        let (statements, tables, records) = self.render_all()?;

        writer::write_script(&output_path, &statements)?;

        info!(
            output = %output_path.display(),
            tables,
            records,
            statements = statements.len(),
            "Converted table files into SQL"
        );

        Ok(ExportStats {
            output_path,
            tables,
            records,
            statements: statements.len(),
        })
    }

    /// Every statement of the mirror, in table, record, then
    /// parent/children/translations order
    pub fn render(&self) -> Result<Vec<InsertStatement>, ExportError> {
        self.render_all().map(|(statements, _, _)| statements)
    }

    fn render_all(&self) -> Result<(Vec<InsertStatement>, usize, usize), ExportError> {
        let tables = self.table_files()?;
        let mut statements = Vec::new();
        let mut records = 0;

        for table in &tables {
            records += self.export_table(table, &mut statements)?;
        }

        Ok((statements, tables.len(), records))
    }

    /// Base table files, sorted by name. Directories (the translations and
    /// sql folders) and non-JSON files are skipped.
    pub fn table_files(&self) -> Result<Vec<TableFile>, ExportError> {
        let data_dir = self.config.data_dir();
        let read_err = |source| FileError::Read {
            path: data_dir.clone(),
            source,
        };

        let mut tables = Vec::new();
        for entry in fs::read_dir(&data_dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let path = entry.path();

            if entry.file_type().map_err(read_err)?.is_dir() {
                debug!(path = %path.display(), "Skipping directory");
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                debug!(path = %path.display(), "Skipping non-JSON file");
                continue;
            }

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if !TABLE_NAME_REGEX.is_match(&name) {
                return Err(ExportError::InvalidTableName { name, path });
            }

            tables.push(TableFile { name, path });
        }

        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    /// Append the statements of one table; returns the number of records
    fn export_table(
        &self,
        table: &TableFile,
        statements: &mut Vec<InsertStatement>,
    ) -> Result<usize, ExportError> {
        let records = json_file::read_array(&table.path)?;

        let translations = if self.config.is_translatable(&table.name) {
            Some(TranslationSet::load(&self.config, &table.name)?)
        } else {
            None
        };

        debug!(
            table = %table.name,
            records = records.len(),
            translations = translations.as_ref().map_or(0, |t| t.len()),
            "Converting table"
        );

        for (index, value) in records.iter().enumerate() {
            let rendered = self
                .convert_record(&table.name, value, translations.as_ref())
                .map_err(|source| record_error(&table.path, index, source))?;
            statements.extend(rendered);
        }

        Ok(records.len())
    }

    fn convert_record(
        &self,
        table: &str,
        value: &Value,
        translations: Option<&TranslationSet>,
    ) -> Result<Vec<InsertStatement>, ConvertError> {
        let uuid = value
            .get("uuid")
            .and_then(Value::as_str)
            .ok_or_else(|| ConvertError::MissingField {
                table: table.to_string(),
                field: "uuid".to_string(),
            })?;

        let mut statements = self.converter.convert(table, value)?;
        if let Some(translations) = translations {
            statements.extend(translations.fan_out(&self.converter, uuid)?);
        }
        Ok(statements)
    }
}

fn record_error(path: &Path, index: usize, source: ConvertError) -> ExportError {
    ExportError::Record {
        path: path.to_path_buf(),
        index,
        source,
    }
}
