use crate::config::{child_table, CatalogConfig};
use crate::error::ConvertError;
use crate::sql::encode::{column_name, encode_array, encode_scalar};
use crate::sql::statement::InsertStatement;
use crate::sql::types::{FieldValue, Record};

/// A record split into its parent row and its child-table rows
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedRecord {
    /// Parent row, columns in field order
    pub row: InsertStatement,

    /// One batch per array-of-object field, in field order
    pub children: Vec<ChildBatch>,
}

/// Rows materialized from one array-of-object field
#[derive(Debug, Clone, PartialEq)]
pub struct ChildBatch {
    /// Source field on the parent record
    pub field: String,

    /// Child relation name, e.g. "characters_relatives"
    pub table: String,

    pub rows: Vec<DecomposedRecord>,
}

/// Splits records into column/value pairs and child batches
#[derive(Debug, Clone)]
pub struct RecordDecomposer {
    special_names: Vec<String>,
    max_child_depth: usize,
}

impl RecordDecomposer {
    pub fn new(config: &CatalogConfig) -> Self {
        RecordDecomposer {
            special_names: config.special_names.clone(),
            max_child_depth: config.max_child_depth,
        }
    }

    /// Decompose `record` as a row of `table`
    pub fn decompose(
        &self,
        table: &str,
        record: &Record,
    ) -> Result<DecomposedRecord, ConvertError> {
        self.decompose_at(table, record, 0)
    }

    fn decompose_at(
        &self,
        table: &str,
        record: &Record,
        depth: usize,
    ) -> Result<DecomposedRecord, ConvertError> {
        let mut row = InsertStatement::new(table);
        let mut children = Vec::new();

        for (field, value) in record.fields() {
            match value {
                FieldValue::Scalar(scalar) => {
                    row.push(column_name(field, &self.special_names), encode_scalar(scalar));
                }
                FieldValue::ScalarArray(items) => {
                    row.push(column_name(field, &self.special_names), encode_array(items));
                }
                FieldValue::ObjectArray(elements) => {
                    if depth >= self.max_child_depth {
                        return Err(ConvertError::ChildTooDeep {
                            table: table.to_string(),
                            field: field.to_string(),
                            max_depth: self.max_child_depth,
                        });
                    }

                    let child = child_table(table, field);
                    let rows = elements
                        .iter()
                        .map(|element| self.decompose_at(&child, element, depth + 1))
                        .collect::<Result<Vec<_>, _>>()?;

                    children.push(ChildBatch {
                        field: field.to_string(),
                        table: child,
                        rows,
                    });
                }
            }
        }

        // A row made only of child batches would render as `() VALUES ()`
        if row.is_empty() {
            return Err(ConvertError::EmptyRecord {
                table: table.to_string(),
            });
        }

        Ok(DecomposedRecord { row, children })
    }
}
