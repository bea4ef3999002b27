//! # haven-db
//!
//! libSQL-backed store for Haven.
//!
//! Holds sessions, their event log, trusted contacts, user-contributed places,
//! place feedback and the derived place scores. [`service::HavenService`]
//! layers the session lifecycle, the expiry scanner and the change feed on
//! top of the raw [`HavenDb`] handle.

pub mod error;
pub mod feed;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod scanner;
pub mod service;

#[cfg(test)]
mod test_support;

use std::ops::Deref;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{Mutex, MutexGuard};

/// Central database handle.
///
/// Wraps a libSQL database and its single connection. Writes that span more
/// than one statement go through [`HavenDb::begin`], which serializes them.
pub struct HavenDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    write_lock: Mutex<()>,
}

impl HavenDb {
    /// Open a local database at the given path. `":memory:"` works for tests.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:"
            && let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Migration(format!("create {}: {e}", parent.display())))?;
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Foreign keys are per-connection in SQLite.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let haven_db = Self {
            db,
            conn,
            write_lock: Mutex::new(()),
        };
        haven_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(haven_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g. `"ses-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        generate_id(&self.conn, prefix).await
    }

    /// Start an immediate write transaction.
    ///
    /// Every path must end in [`WriteTx::finish`] so the transaction is either
    /// committed or rolled back before the write lock is released.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `BEGIN` fails.
    pub async fn begin(&self) -> Result<WriteTx<'_>, DatabaseError> {
        let guard = self.write_lock.lock().await;
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        Ok(WriteTx {
            _guard: guard,
            conn: &self.conn,
        })
    }
}

/// Generate a prefixed id on an arbitrary connection (inside a transaction too).
pub(crate) async fn generate_id(
    conn: &libsql::Connection,
    prefix: &str,
) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
            (),
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<String>(0)?)
}

/// An open write transaction holding the database write lock.
pub struct WriteTx<'a> {
    _guard: MutexGuard<'a, ()>,
    conn: &'a libsql::Connection,
}

impl WriteTx<'_> {
    /// Commit on `Ok`, roll back on `Err`, and hand the result back.
    ///
    /// # Errors
    ///
    /// Returns the original error, or the commit error if commit fails.
    pub async fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => match self.conn.execute("COMMIT", ()).await {
                Ok(_) => Ok(value),
                Err(error) => {
                    self.rollback().await;
                    Err(error.into())
                }
            },
            Err(error) => {
                self.rollback().await;
                Err(error)
            }
        }
    }

    async fn rollback(&self) {
        if let Err(error) = self.conn.execute("ROLLBACK", ()).await {
            tracing::warn!(%error, "rollback failed");
        }
    }
}

impl Deref for WriteTx<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}
