use crate::error::SyncError;
use crate::json_file;
use serde_json::Value;
use std::path::Path;

/// Mutation kinds accepted in the requests file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Update,
    Delete,
}

impl Method {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "POST" => Some(Method::Post),
            "UPDATE" => Some(Method::Update),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

/// Queued bodies for one table under one method
#[derive(Debug, Clone, PartialEq)]
pub struct TableRequests {
    pub table: String,
    pub bodies: Vec<Value>,
}

/// All tables queued under one method name, as written in the file
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequests {
    pub method: String,
    pub tables: Vec<TableRequests>,
}

/// The queued mutations, in file order:
/// `{"POST": {"actors": [{...}]}, "UPDATE": {...}, "DELETE": {...}}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestQueue {
    pub methods: Vec<MethodRequests>,
}

impl RequestQueue {
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let value = json_file::read_value(path)?;
        Self::from_value(&value).map_err(|reason| SyncError::InvalidRequests {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Some(methods) = value.as_object() else {
            return Err("requests must be a JSON object keyed by method".to_string());
        };

        let mut queue = RequestQueue::default();
        for (method, tables) in methods {
            let Some(tables) = tables.as_object() else {
                return Err(format!("`{}` must map table names to arrays", method));
            };

            let mut entry = MethodRequests {
                method: method.clone(),
                tables: Vec::new(),
            };
            for (table, bodies) in tables {
                let Some(bodies) = bodies.as_array() else {
                    return Err(format!("`{}.{}` must be an array", method, table));
                };
                entry.tables.push(TableRequests {
                    table: table.clone(),
                    bodies: bodies.clone(),
                });
            }
            queue.methods.push(entry);
        }
        Ok(queue)
    }

    pub fn len(&self) -> usize {
        self.methods
            .iter()
            .flat_map(|m| &m.tables)
            .map(|t| t.bodies.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
