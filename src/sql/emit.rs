use crate::config::CatalogConfig;
use crate::error::ConvertError;
use crate::sql::decompose::{DecomposedRecord, RecordDecomposer};
use crate::sql::statement::InsertStatement;
use crate::sql::types::Record;
use serde_json::Value;

/// Flatten a decomposed record into statements: the parent row first, then
/// every child batch in field order, each in element order.
pub fn emit(record: &DecomposedRecord) -> Vec<InsertStatement> {
    let mut statements = Vec::new();
    emit_into(record, &mut statements);
    statements
}

fn emit_into(record: &DecomposedRecord, statements: &mut Vec<InsertStatement>) {
    statements.push(record.row.clone());
    for batch in &record.children {
        for row in &batch.rows {
            emit_into(row, statements);
        }
    }
}

/// Turns JSON records into INSERT statements for a given table
#[derive(Debug, Clone)]
pub struct SqlConverter {
    decomposer: RecordDecomposer,
}

impl SqlConverter {
    pub fn new(config: &CatalogConfig) -> Self {
        SqlConverter {
            decomposer: RecordDecomposer::new(config),
        }
    }

    /// Convert one JSON record. Either every statement for the record is
    /// returned or an error is, never a partial set.
    pub fn convert(
        &self,
        table: &str,
        value: &Value,
    ) -> Result<Vec<InsertStatement>, ConvertError> {
        let record = Record::from_value(table, value)?;
        let decomposed = self.decomposer.decompose(table, &record)?;
        Ok(emit(&decomposed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(table: &str, value: Value) -> Vec<String> {
        SqlConverter::new(&CatalogConfig::default())
            .convert(table, &value)
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_games_record() {
        let statements = convert(
            "games",
            json!({"uuid": "u1", "name": "O'Brien", "genres": ["drama", "sci-fi"]}),
        );

        assert_eq!(
            statements,
            vec!["INSERT INTO games (uuid, name, genres) VALUES ('u1', 'O''Brien', {\"drama\", \"sci-fi\"});"]
        );
    }

    #[test]
    fn test_parent_before_children() {
        let statements = convert(
            "characters",
            json!({
                "uuid": "c1",
                "first_name": "Jim",
                "relatives": [
                    {"name": "Sara", "relation": "daughter"},
                    {"name": "Diane", "relation": "ex-wife"}
                ]
            }),
        );

        assert_eq!(
            statements,
            vec![
                "INSERT INTO characters (uuid, first_name) VALUES ('c1', 'Jim');",
                "INSERT INTO characters_relatives (name, relation) VALUES ('Sara', 'daughter');",
                "INSERT INTO characters_relatives (name, relation) VALUES ('Diane', 'ex-wife');",
            ]
        );
    }

    #[test]
    fn test_children_follow_field_then_element_order() {
        let statements = convert(
            "locations",
            json!({
                "uuid": "l1",
                "images": [{"url": "1"}, {"url": "2"}],
                "sources": [{"url": "3"}]
            }),
        );

        let tables: Vec<&str> = statements
            .iter()
            .map(|s| s.split(' ').nth(2).unwrap())
            .collect();
        assert_eq!(
            tables,
            vec!["locations", "locations_images", "locations_images", "locations_sources"]
        );
        assert!(statements[2].contains("'2'"));
    }

    #[test]
    fn test_failed_record_emits_nothing() {
        let converter = SqlConverter::new(&CatalogConfig::default());
        let result = converter.convert(
            "characters",
            &json!({"uuid": "c1", "relatives": [{"name": "x"}, {"bad": {"k": 1}}]}),
        );

        assert!(matches!(result, Err(ConvertError::UnsupportedValue { .. })));
    }
}
