//! # Servicos - Service-request ticket store
//!
//! Records, edits, and reports on waste-collection service requests.
//!
//! Servicos provides:
//! - SQLite-backed storage with scoped, transactional connections
//! - CPF (document number) validation and canonical formatting
//! - Duplicate-address detection over the (bairro, rua, numero, quadra, lote) key
//! - Filtered, paginated listing with an allow-listed filter and sort surface
//! - Spreadsheet (CSV) export and a printable service order

pub mod record;
pub mod document;
pub mod format;
pub mod storage;
pub mod export;
pub mod config;
pub mod output;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use record::{ServiceFields, ServiceRecord, ServiceStatus};
pub use storage::{AddressQuery, Database, Filters, ListQuery, ServicePage, ServiceStore, SortKey};

/// Result type alias for Servicos operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Servicos operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Cannot prepare database directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid sort key: {0}")]
    InvalidSortKey(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Export worker failed: {0}")]
    ExportWorker(String),
}
