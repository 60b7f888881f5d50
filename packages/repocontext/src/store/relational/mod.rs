//! Relational index (RFC-102): tables for entries, call relations, and
//! the chunk registry, with batch/composite queries and a
//! prepared-statement cache.
//!
//! Grounded on `codegraph-ir`'s `SqliteChunkStore`
//! (features/storage/infrastructure/sqlite_store.rs): same
//! `Connection` behind a lock, same `CREATE TABLE IF NOT EXISTS` +
//! `CREATE INDEX IF NOT EXISTS` schema style, same row-to-struct mapping
//! by positional `row.get(n)`.

mod prepared;

pub use prepared::{PreparedStatementCache, QueryKind};

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection};

use crate::error::Result;
use crate::model::{CallRelation, IndexEntry};

/// The relational half of the hybrid store.
pub struct RelationalIndex {
    conn: Mutex<Connection>,
    prepared: PreparedStatementCache,
}

impl RelationalIndex {
    /// Open (or create) the database at `db_path` and ensure the schema
    /// and indexes exist.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let index = Self {
            conn: Mutex::new(conn),
            prepared: PreparedStatementCache::new(),
        };
        index.init_schema()?;
        Ok(index)
    }

    /// In-memory database, for tests and ephemeral use.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let index = Self {
            conn: Mutex::new(conn),
            prepared: PreparedStatementCache::new(),
        };
        index.init_schema()?;
        Ok(index)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                files TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS index_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                file_path TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                chunk_id TEXT NOT NULL REFERENCES chunks(chunk_id) ON DELETE CASCADE,
                signature TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS call_relations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                caller TEXT NOT NULL,
                callee TEXT NOT NULL,
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                caller_file TEXT NOT NULL
            )",
            [],
        )?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_entries_name ON index_entries(name)",
            "CREATE INDEX IF NOT EXISTS idx_entries_type ON index_entries(type)",
            "CREATE INDEX IF NOT EXISTS idx_entries_file ON index_entries(file_path)",
            "CREATE INDEX IF NOT EXISTS idx_entries_chunk ON index_entries(chunk_id)",
            "CREATE INDEX IF NOT EXISTS idx_entries_type_name ON index_entries(type, name)",
            "CREATE INDEX IF NOT EXISTS idx_entries_file_type ON index_entries(file_path, type)",
            "CREATE INDEX IF NOT EXISTS idx_entries_name_file ON index_entries(name, file_path)",
            "CREATE INDEX IF NOT EXISTS idx_entries_covering ON index_entries(type, name, file_path, chunk_id)",
            "CREATE INDEX IF NOT EXISTS idx_relations_caller ON call_relations(caller)",
            "CREATE INDEX IF NOT EXISTS idx_relations_callee ON call_relations(callee)",
            "CREATE INDEX IF NOT EXISTS idx_chunks_created_at ON chunks(created_at)",
        ] {
            conn.execute(stmt, [])?;
        }

        Ok(())
    }

    // -- writes -----------------------------------------------------

    /// Register a chunk row. `files` is stored comma-joined.
    pub fn insert_chunk(
        &self,
        chunk_id: &str,
        files: &[String],
        token_count: u32,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO chunks (chunk_id, files, token_count, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![chunk_id, files.join(","), token_count, created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert a batch of index entries in one transaction.
    pub fn insert_entries(&self, entries: &[IndexEntry]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for e in entries {
            tx.execute(
                "INSERT INTO index_entries (name, type, file_path, start_line, end_line, chunk_id, signature) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![e.name, e.entry_type, e.file, e.start_line, e.end_line, e.chunk_id, e.signature],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert a batch of call relations in one transaction.
    pub fn insert_call_relations(&self, relations: &[CallRelation]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for r in relations {
            tx.execute(
                "INSERT INTO call_relations (caller, callee, file, line, caller_file) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![r.caller, r.callee, r.file, r.line, r.caller_file],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // -- reads --------------------------------------------------------

    pub fn query_by_name(&self, name: &str) -> Result<Vec<IndexEntry>> {
        let sql = self.prepared.sql_for(QueryKind::QueryByName);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![name], row_to_entry)?;
        collect(rows)
    }

    pub fn query_by_type(&self, entry_type: &str) -> Result<Vec<IndexEntry>> {
        let sql = self.prepared.sql_for(QueryKind::QueryByType);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![entry_type], row_to_entry)?;
        collect(rows)
    }

    /// Batch variant: parameterised `IN (...)`, ordered by `(name)`.
    pub fn query_by_names(&self, names: &[String]) -> Result<Vec<IndexEntry>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = placeholder_list(names.len());
        let sql = format!(
            "SELECT name, type, file_path, start_line, end_line, chunk_id, signature \
             FROM index_entries WHERE name IN ({}) ORDER BY name",
            placeholders
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(names.iter()), row_to_entry)?;
        collect(rows)
    }

    /// Batch variant: parameterised `IN (...)`, ordered by `(type,name)`.
    pub fn query_by_types(&self, types: &[String]) -> Result<Vec<IndexEntry>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = placeholder_list(types.len());
        let sql = format!(
            "SELECT name, type, file_path, start_line, end_line, chunk_id, signature \
             FROM index_entries WHERE type IN ({}) ORDER BY type, name",
            placeholders
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(types.iter()), row_to_entry)?;
        collect(rows)
    }

    /// Exact file-path match (basename fallback is the query engine's
    /// responsibility, since it needs the full set of distinct paths).
    pub fn query_in_file(&self, file: &str) -> Result<Vec<IndexEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT name, type, file_path, start_line, end_line, chunk_id, signature \
             FROM index_entries WHERE file_path = ?1 ORDER BY start_line",
        )?;
        let rows = stmt.query_map(params![file], row_to_entry)?;
        collect(rows)
    }

    pub fn query_calls_from(&self, caller: &str) -> Result<Vec<CallRelation>> {
        let sql = self.prepared.sql_for(QueryKind::QueryCallsFrom);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![caller], row_to_relation)?;
        collect(rows)
    }

    pub fn query_calls_to(&self, callee: &str) -> Result<Vec<CallRelation>> {
        let sql = self.prepared.sql_for(QueryKind::QueryCallsTo);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![callee], row_to_relation)?;
        collect(rows)
    }

    /// Every entry of the given type, for pattern-search enumeration.
    pub fn list_all_of_type(&self, entry_type: &str) -> Result<Vec<IndexEntry>> {
        self.query_by_type(entry_type)
    }

    /// Distinct file paths known to the index, for basename search.
    pub fn distinct_files(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT DISTINCT file_path FROM index_entries")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Find the chunk owning `path`, by scanning `chunks.files`.
    pub fn find_chunk_owning_file(&self, path: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT chunk_id, files FROM chunks")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let chunk_id: String = row.get(0)?;
            let files: String = row.get(1)?;
            if files.split(',').any(|f| f == path) {
                return Ok(Some(chunk_id));
            }
        }
        Ok(None)
    }

    /// Cascading deletion: within one transaction, remove call relations
    /// touching any file the chunk covered, the chunk's index entries,
    /// and the chunk row itself.
    pub fn delete_chunk(&self, chunk_id: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let files: Option<String> = tx
            .query_row("SELECT files FROM chunks WHERE chunk_id = ?1", params![chunk_id], |row| row.get(0))
            .optional_or_none()?;

        if let Some(files) = files {
            for file in files.split(',').filter(|f| !f.is_empty()) {
                tx.execute(
                    "DELETE FROM call_relations WHERE file = ?1 OR caller_file = ?1",
                    params![file],
                )?;
            }
        }

        tx.execute("DELETE FROM index_entries WHERE chunk_id = ?1", params![chunk_id])?;
        tx.execute("DELETE FROM chunks WHERE chunk_id = ?1", params![chunk_id])?;

        tx.commit()?;
        Ok(())
    }

    /// Prepared-statement cache size, for diagnostics/tests.
    pub fn prepared_cache_len(&self) -> usize {
        self.prepared.len()
    }
}

/// Small helper trait bridging `rusqlite::Error::QueryReturnedNoRows`
/// into `Option<T>` without pulling in `OptionalExtension` for a single
/// call site that already holds a transaction borrow.
trait OptionalOrNone<T> {
    fn optional_or_none(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalOrNone<T> for rusqlite::Result<T> {
    fn optional_or_none(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn placeholder_list(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexEntry> {
    Ok(IndexEntry {
        name: row.get(0)?,
        entry_type: row.get(1)?,
        file: row.get(2)?,
        start_line: row.get(3)?,
        end_line: row.get(4)?,
        chunk_id: row.get(5)?,
        signature: row.get(6)?,
    })
}

fn row_to_relation(row: &rusqlite::Row<'_>) -> rusqlite::Result<CallRelation> {
    Ok(CallRelation {
        caller: row.get(0)?,
        callee: row.get(1)?,
        file: row.get(2)?,
        line: row.get(3)?,
        caller_file: row.get(4)?,
    })
}

fn collect<T>(rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
