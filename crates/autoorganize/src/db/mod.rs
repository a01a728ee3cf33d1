//! Database module for persistent storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle: one writer
//! connection plus a small pool of reader connections. A reader/writer gate
//! lets reads run side by side while keeping them out of an in-flight write.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use rusqlite::{Connection, OpenFlags};

pub mod error;
pub mod migrations;
pub mod result_repo;
pub mod smart_match_repo;
pub mod store;

pub use error::DatabaseError;
pub use store::ResultStore;

const READER_CONNECTIONS: usize = 4;

struct Inner {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    gate: RwLock<()>,
}

/// Thread-safe database handle.
///
/// Cloning is cheap (inner `Arc`). Writes are serialized through the single
/// writer connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let writer = Connection::open(path)?;
        writer.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        migrations::run_all(&writer)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let readers = (0..READER_CONNECTIONS)
            .map(|_| -> Result<Mutex<Connection>, DatabaseError> {
                let conn = Connection::open_with_flags(path, flags)?;
                conn.execute_batch("PRAGMA busy_timeout=5000;")?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        log::info!("Database opened at {}", path.display());

        Ok(Self::from_parts(writer, readers))
    }

    /// Opens a private in-memory database. Runs all migrations.
    ///
    /// Readers share the writer's data through a uniquely named
    /// shared-cache URI; the database lives as long as the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let uri = format!(
            "file:autoorganize-{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let writer = Connection::open_with_flags(&uri, flags)?;
        migrations::run_all(&writer)?;

        let readers = (0..READER_CONNECTIONS)
            .map(|_| -> Result<Mutex<Connection>, DatabaseError> {
                Ok(Mutex::new(Connection::open_with_flags(&uri, flags)?))
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        Ok(Self::from_parts(writer, readers))
    }

    fn from_parts(writer: Connection, readers: Vec<Mutex<Connection>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(writer),
                readers,
                next_reader: AtomicUsize::new(0),
                gate: RwLock::new(()),
            }),
        }
    }

    /// Exclusive access to the writer connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let _gate = self
            .inner
            .gate
            .write()
            .map_err(|_| DatabaseError::LockPoisoned)?;
        let conn = self
            .inner
            .writer
            .lock()
            .map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// Shared access to one of the reader connections.
    pub fn with_read_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let _gate = self
            .inner
            .gate
            .read()
            .map_err(|_| DatabaseError::LockPoisoned)?;
        let index =
            self.inner.next_reader.fetch_add(1, Ordering::Relaxed) % self.inner.readers.len();
        let conn = self.inner.readers[index]
            .lock()
            .map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}
