use std::fmt;

/// A single `INSERT INTO ... VALUES (...);` statement.
///
/// Columns and encoded values are stored as pairs, so the two lists in the
/// rendered statement always line up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    table: String,
    pairs: Vec<(String, String)>,
}

impl InsertStatement {
    pub fn new(table: impl Into<String>) -> Self {
        InsertStatement {
            table: table.into(),
            pairs: Vec::new(),
        }
    }

    /// Append an already-quoted column name and an already-encoded literal
    pub fn push(&mut self, column: String, value: String) {
        self.pairs.push((column, value));
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(column, _)| column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<&str> = self.columns().collect();
        let values: Vec<&str> = self.values().collect();
        write!(
            f,
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            columns.join(", "),
            values.join(", ")
        )
    }
}
