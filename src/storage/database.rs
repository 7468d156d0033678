//! SQLite Database
//!
//! Durable storage for batch analysis records using rusqlite with r2d2
//! connection pooling. Structured columns are stored as JSON text.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use super::analysis_store::{timestamp_now, AnalysisStore};
use crate::models::analysis::{NewAnalysisRecord, StoredAnalysis};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::database_path;

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create an in-memory database for testing.
    ///
    /// A single pooled connection keeps every caller on the same in-memory
    /// database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open the database at the default location (~/.code-insight/analyses.db)
    pub fn new() -> AppResult<Self> {
        Self::open(&database_path()?)
    }

    /// Open or create a database file
    pub fn open(db_path: &Path) -> AppResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                files TEXT NOT NULL,
                analysis TEXT NOT NULL,
                suggestions TEXT NOT NULL,
                improved_code TEXT NOT NULL,
                output TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(created_at)",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<StoredRow> {
        Ok(StoredRow {
            id: row.get(0)?,
            files: row.get(1)?,
            analysis: row.get(2)?,
            suggestions: row.get(3)?,
            improved_code: row.get(4)?,
            output: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// Raw analysis row from the database
#[derive(Debug, Clone)]
struct StoredRow {
    id: i64,
    files: String,
    analysis: String,
    suggestions: String,
    improved_code: String,
    output: String,
    created_at: String,
}

impl StoredRow {
    fn decode(self) -> AppResult<StoredAnalysis> {
        Ok(StoredAnalysis {
            id: self.id,
            record: NewAnalysisRecord {
                files: serde_json::from_str(&self.files)?,
                analysis: serde_json::from_str(&self.analysis)?,
                suggestions: serde_json::from_str(&self.suggestions)?,
                improved_code: serde_json::from_str(&self.improved_code)?,
                output: serde_json::from_str(&self.output)?,
            },
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, files, analysis, suggestions, improved_code, output, created_at FROM analyses";

impl AnalysisStore for Database {
    fn save(&self, record: NewAnalysisRecord) -> AppResult<StoredAnalysis> {
        let created_at = timestamp_now();
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO analyses (files, analysis, suggestions, improved_code, output, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                serde_json::to_string(&record.files)?,
                serde_json::to_string(&record.analysis)?,
                serde_json::to_string(&record.suggestions)?,
                serde_json::to_string(&record.improved_code)?,
                serde_json::to_string(&record.output)?,
                created_at,
            ],
        )?;

        Ok(StoredAnalysis {
            id: conn.last_insert_rowid(),
            record,
            created_at,
        })
    }

    fn get(&self, id: i64) -> AppResult<Option<StoredAnalysis>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            Self::row_to_stored,
        );

        match result {
            Ok(row) => row.decode().map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    fn list_recent(&self, limit: usize) -> AppResult<Vec<StoredAnalysis>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], Self::row_to_stored)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::decode).collect()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.state().connections)
            .finish()
    }
}
