//! Schema/connection manager
//!
//! `Database` is only a path. Each unit of work opens its own connection,
//! runs inside one transaction, and closes the connection on the way out.

use super::schema;
use crate::{Error, Result};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a write waits on another writer's lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the on-disk servicos database
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Make sure the file, the table and its indexes exist.
    ///
    /// Creates the parent directory when needed. Safe to call on every start.
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| Error::Directory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let db = Self { path };
        db.acquire(|tx| {
            for stmt in schema::all_schema_statements() {
                tx.execute(stmt, [])?;
            }
            Ok(())
        })?;
        tracing::info!("Database ready at {}", db.path.display());
        Ok(db)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `work` as one scoped transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`, and
    /// always closes the connection before returning.
    pub fn acquire<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let tx = conn.transaction()?;
        tracing::debug!("Opened scoped connection to {}", self.path.display());

        match work(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!("Rollback failed after error ({}): {}", err, rollback_err);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(db: &Database, sql: &str) -> i64 {
        db.acquire(|tx| Ok(tx.query_row(sql, [], |row| row.get(0))?))
            .unwrap()
    }

    #[test]
    fn test_initialize_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("servicos.db");
        let db = Database::initialize(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servicos.db");
        Database::initialize(&path).unwrap();
        let db = Database::initialize(&path).unwrap();

        let tables = count(&db, "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'servicos'");
        let indexes = count(&db, "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'");
        assert_eq!(tables, 1);
        assert_eq!(indexes, 4);
    }

    #[test]
    fn test_failed_work_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::initialize(dir.path().join("servicos.db")).unwrap();

        let result: Result<()> = db.acquire(|tx| {
            tx.execute(
                "INSERT INTO servicos (data_solicitacao, cpf, nome, telefone, bairro, rua, numero)
                 VALUES ('2024-01-01 00:00:00', '1', 'Ana', '1', 'Centro', 'Rua A', '10')",
                [],
            )?;
            Err(Error::MissingField("nome"))
        });
        assert!(result.is_err());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM servicos"), 0);
    }

    #[test]
    fn test_successful_work_commits() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::initialize(dir.path().join("servicos.db")).unwrap();

        db.acquire(|tx| {
            tx.execute(
                "INSERT INTO servicos (data_solicitacao, cpf, nome, telefone, bairro, rua, numero)
                 VALUES ('2024-01-01 00:00:00', '1', 'Ana', '1', 'Centro', 'Rua A', '10')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&db, "SELECT COUNT(*) FROM servicos"), 1);
    }

    #[test]
    fn test_initialize_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let result = Database::initialize(blocker.join("servicos.db"));
        assert!(matches!(result, Err(Error::Directory { .. })));
    }
}
