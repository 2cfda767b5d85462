use crate::config::child_table;
use crate::error::ConvertError;
use serde_json::{Map, Number, Value};

/// A single JSON scalar that can become a SQL literal
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(Number),
    Bool(bool),
}

impl Scalar {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            _ => None,
        }
    }
}

/// The shapes a record field may take
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Becomes one column
    Scalar(Scalar),
    /// Becomes one native array column
    ScalarArray(Vec<Scalar>),
    /// Becomes a child table, one row per element
    ObjectArray(Vec<Record>),
}

/// One row of a logical table, fields kept in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Classify every field of a JSON record.
    ///
    /// `table` is only used to name the offending relation in errors.
    pub fn from_value(table: &str, value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Object(obj) => Self::from_object(table, obj),
            _ => Err(ConvertError::NotAnObject {
                table: table.to_string(),
            }),
        }
    }

    pub fn from_object(table: &str, obj: &Map<String, Value>) -> Result<Self, ConvertError> {
        let mut fields = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            let field = classify(table, key, value)?;
            fields.push((key.clone(), field));
        }
        Ok(Record { fields })
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Text value of a scalar field
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Scalar(Scalar::Text(s))) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn classify(table: &str, field: &str, value: &Value) -> Result<FieldValue, ConvertError> {
    if let Some(scalar) = Scalar::from_value(value) {
        return Ok(FieldValue::Scalar(scalar));
    }

    match value {
        Value::Array(items) => classify_array(table, field, items),
        Value::Object(_) => Err(unsupported(table, field, "object")),
        _ => Err(unsupported(table, field, "null")),
    }
}

/// Empty arrays carry no element type and are kept as an empty array column
fn classify_array(table: &str, field: &str, items: &[Value]) -> Result<FieldValue, ConvertError> {
    let mut scalars = Vec::new();
    let mut objects = Vec::new();

    for item in items {
        match item {
            Value::Object(obj) => objects.push(obj),
            Value::Array(_) => {
                return Err(ConvertError::NestedArray {
                    table: table.to_string(),
                    field: field.to_string(),
                })
            }
            Value::Null => return Err(unsupported(table, field, "null")),
            other => {
                if let Some(scalar) = Scalar::from_value(other) {
                    scalars.push(scalar);
                }
            }
        }
    }

    if !objects.is_empty() && !scalars.is_empty() {
        return Err(ConvertError::MixedArray {
            table: table.to_string(),
            field: field.to_string(),
        });
    }

    if objects.is_empty() {
        return Ok(FieldValue::ScalarArray(scalars));
    }

    let child = child_table(table, field);
    let rows = objects
        .into_iter()
        .map(|obj| Record::from_object(&child, obj))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FieldValue::ObjectArray(rows))
}

fn unsupported(table: &str, field: &str, kind: &'static str) -> ConvertError {
    ConvertError::UnsupportedValue {
        table: table.to_string(),
        field: field.to_string(),
        kind,
    }
}
