//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite file with one table:
//! - servicos(id, data_solicitacao, cpf, nome, ..., status, execution metadata)
//!
//! Indexed on cpf, the address key, status and request date.

pub mod connection;
pub mod query;
pub mod schema;
pub mod sqlite;

pub use connection::Database;
pub use query::{AddressQuery, Filters, ListQuery, SearchField, ServicePage, SortColumn, SortDirection, SortKey};
pub use sqlite::ServiceStore;
