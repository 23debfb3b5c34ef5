#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory holding source files and output databases for one test.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` to `name` under the workspace, creating parent
    /// folders as needed.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent folder");
        }
        fs::write(&path, contents).expect("write temp file");
        path
    }
}

/// Reads every row of `table` as text, with SQL NULL rendered as `NULL`.
pub fn dump_table(conn: &rusqlite::Connection, table: &str) -> Vec<Vec<String>> {
    let sql = format!("SELECT * FROM [{table}] ORDER BY rowid");
    let mut stmt = conn.prepare(&sql).expect("prepare select");
    let columns = stmt.column_count();
    let rows = stmt
        .query_map([], |row| {
            (0..columns)
                .map(|idx| {
                    let value: rusqlite::types::Value = row.get(idx)?;
                    Ok(match value {
                        rusqlite::types::Value::Null => "NULL".to_string(),
                        rusqlite::types::Value::Integer(i) => i.to_string(),
                        rusqlite::types::Value::Real(f) => f.to_string(),
                        rusqlite::types::Value::Text(t) => t,
                        rusqlite::types::Value::Blob(_) => "<blob>".to_string(),
                    })
                })
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .expect("query rows")
        .collect::<rusqlite::Result<Vec<_>>>()
        .expect("collect rows");
    rows
}

/// Returns `(name, declared type)` pairs for `table`.
pub fn table_columns(conn: &rusqlite::Connection, table: &str) -> Vec<(String, String)> {
    let sql = format!("PRAGMA table_info('{table}')");
    let mut stmt = conn.prepare(&sql).expect("prepare pragma");
    let columns = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .expect("query pragma")
        .collect::<rusqlite::Result<Vec<_>>>()
        .expect("collect pragma");
    columns
}
