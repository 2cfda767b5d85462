//! # Catalog Mirror - local-first sync and SQL export for a content catalog
//!
//! Keeps a JSON-file mirror of a remote catalog API (actors, episodes,
//! games, ...) and turns it into a flat SQL script for bulk loading.
//!
//! ## Modules
//!
//! - **sql**: convert JSON records into `INSERT` statements and export the mirror
//! - **store**: read and mutate the local JSON mirror
//! - **sync**: replay queued mutations against the remote API
//!
//! ## Quick Start
//!
//! ```rust
//! use catalog_mirror::{CatalogConfig, SqlConverter};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let record = json!({
//!     "uuid": "c1",
//!     "first_name": "Jim",
//!     "relatives": [
//!         {"name": "Sara", "relation": "daughter"}
//!     ]
//! });
//!
//! let converter = SqlConverter::new(&CatalogConfig::default());
//! let statements = converter.convert("characters", &record)?;
//!
//! assert_eq!(
//!     statements[0].to_string(),
//!     "INSERT INTO characters (uuid, first_name) VALUES ('c1', 'Jim');"
//! );
//! assert_eq!(statements[1].table(), "characters_relatives");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};

pub mod config;
pub mod error;
pub mod json_file;
pub mod sql;
pub mod store;
pub mod sync;

// Re-export commonly used types for convenience
pub use config::{CatalogConfig, RemoteConfig};
pub use error::{ConvertError, ExportError, FileError, StoreError, SyncError};
pub use sql::{ExportStats, Exporter, InsertStatement, SqlConverter};
pub use store::LocalStore;

/// Main entry point: export the whole mirror described by `config` into its SQL script
pub fn export_sql(config: CatalogConfig) -> Result<ExportStats> {
    let data_dir = config.data_dir();
    Exporter::new(config)
        .export()
        .with_context(|| format!("Failed to export {}", data_dir.display()))
}
