//! JSON to SQL conversion
//!
//! Turns the records of the local mirror into `INSERT` statements:
//!
//! - scalars become literals, scalar arrays become native array literals
//! - arrays of objects become rows of a `<table>_<field>` child table
//! - translatable tables fan out into `<table>_translations`
//!
//! `Exporter` drives the whole mirror; `SqlConverter` handles one record.

pub mod types;
pub mod encode;
pub mod statement;
pub mod decompose;
pub mod emit;
pub mod translations;
pub mod writer;
pub mod export;

pub use types::{FieldValue, Record, Scalar};
pub use encode::{column_name, encode_array, encode_scalar};
pub use statement::InsertStatement;
pub use decompose::{ChildBatch, DecomposedRecord, RecordDecomposer};
pub use emit::{emit, SqlConverter};
pub use translations::TranslationSet;
pub use writer::{render_script, write_script, ScriptWriter};
pub use export::{ExportStats, Exporter, TableFile};
