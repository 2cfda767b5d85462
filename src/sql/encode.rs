//! SQL literal encoding for scalars and scalar arrays.
//!
//! Only single quotes are escaped in top-level string literals (`'` becomes
//! `''`). Backslashes, control characters and newlines pass through as-is:
//! the output is a literal script, not a parameterized statement.

use crate::sql::types::Scalar;

/// Encode one scalar as a SQL literal
pub fn encode_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Scalar::Number(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }
}

/// Encode a scalar array as a native array literal, e.g. `{"drama", "sci-fi"}`.
///
/// String elements are double-quoted with `"` and `\` backslash-escaped;
/// numbers and booleans are bare.
pub fn encode_array(items: &[Scalar]) -> String {
    let elements: Vec<String> = items.iter().map(encode_array_element).collect();
    format!("{{{}}}", elements.join(", "))
}

fn encode_array_element(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Text(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
            out
        }
        other => encode_scalar(other),
    }
}

/// Column name as written in a statement; reserved words become quoted identifiers
pub fn column_name(field: &str, special_names: &[String]) -> String {
    if special_names.iter().any(|name| name == field) {
        format!("\"{}\"", field)
    } else {
        field.to_string()
    }
}
