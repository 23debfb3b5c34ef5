//! Destinations for generated DDL and DML.
//!
//! The loader only talks to the two narrow traits defined here. The SQLite
//! store executes statements against a real database; the script writer
//! appends them to any [`Write`] sink so they can be reviewed or replayed
//! against another server.

use std::{io::Write, path::Path};

use log::debug;
use rusqlite::Connection;
use thiserror::Error;

use crate::schema::{ResolvedColumn, SqlDialect, create_table_sql};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table '{0}' has no columns to create")]
    EmptyTable(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Materializes a table from its resolved column list.
pub trait SchemaStore {
    fn create_table(&mut self, table: &str, columns: &[ResolvedColumn]) -> StoreResult<()>;
}

/// Executes one literal SQL statement.
pub trait StatementExecutor {
    fn execute(&mut self, sql: &str) -> StoreResult<()>;
}

/// Executes DDL and INSERT statements against a SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SchemaStore for SqliteStore {
    fn create_table(&mut self, table: &str, columns: &[ResolvedColumn]) -> StoreResult<()> {
        if columns.is_empty() {
            return Err(StoreError::EmptyTable(table.to_string()));
        }
        let ddl = create_table_sql(table, columns, SqlDialect::Sqlite);
        debug!("{ddl}");
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }
}

impl StatementExecutor for SqliteStore {
    fn execute(&mut self, sql: &str) -> StoreResult<()> {
        self.conn.execute(sql, [])?;
        Ok(())
    }
}

/// Writes each statement followed by `;` and a newline.
pub struct ScriptWriter<W: Write> {
    out: W,
    dialect: SqlDialect,
    statements: usize,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(out: W, dialect: SqlDialect) -> Self {
        Self {
            out,
            dialect,
            statements: 0,
        }
    }

    /// Number of statements written so far.
    pub fn statements(&self) -> usize {
        self.statements
    }

    /// Flushes the sink and hands it back.
    pub fn finish(mut self) -> StoreResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_statement(&mut self, sql: &str) -> StoreResult<()> {
        writeln!(self.out, "{sql};")?;
        self.statements += 1;
        Ok(())
    }
}

impl<W: Write> SchemaStore for ScriptWriter<W> {
    fn create_table(&mut self, table: &str, columns: &[ResolvedColumn]) -> StoreResult<()> {
        if columns.is_empty() {
            return Err(StoreError::EmptyTable(table.to_string()));
        }
        let ddl = create_table_sql(table, columns, self.dialect);
        self.write_statement(&ddl)
    }
}

impl<W: Write> StatementExecutor for ScriptWriter<W> {
    fn execute(&mut self, sql: &str) -> StoreResult<()> {
        self.write_statement(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn columns() -> Vec<ResolvedColumn> {
        vec![
            ResolvedColumn {
                name: "id".to_string(),
                datatype: ColumnType::Integer,
            },
            ResolvedColumn {
                name: "name".to_string(),
                datatype: ColumnType::Text(50),
            },
        ]
    }

    #[test]
    fn sqlite_store_accepts_bracketed_ddl_and_inserts() {
        let mut store = SqliteStore::open_in_memory().expect("open sqlite");
        store.create_table("_csv_people", &columns()).expect("create");
        store
            .execute("INSERT INTO [_csv_people] ( [id], [name] ) VALUES ( 1, 'O''Brien' )")
            .expect("insert");
        let name: String = store
            .connection()
            .query_row("SELECT name FROM _csv_people WHERE id = 1", [], |row| {
                row.get(0)
            })
            .expect("select");
        assert_eq!(name, "O'Brien");
    }

    #[test]
    fn sqlite_store_reports_duplicate_tables() {
        let mut store = SqliteStore::open_in_memory().expect("open sqlite");
        store.create_table("t", &columns()).expect("first create");
        let err = store.create_table("t", &columns()).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn empty_column_lists_are_rejected() {
        let mut store = SqliteStore::open_in_memory().expect("open sqlite");
        let err = store.create_table("t", &[]).unwrap_err();
        assert!(matches!(err, StoreError::EmptyTable(name) if name == "t"));
    }

    #[test]
    fn script_writer_terminates_statements() {
        let mut writer = ScriptWriter::new(Vec::new(), SqlDialect::SqlServer);
        writer.create_table("t", &columns()).expect("ddl");
        writer.execute("INSERT INTO [t] ( [id], [name] ) VALUES ( 1, 'a' )").expect("dml");
        assert_eq!(writer.statements(), 2);
        let script = String::from_utf8(writer.finish().expect("flush")).expect("utf8");
        assert_eq!(
            script,
            "CREATE TABLE [t] ( [id] INT NULL, [name] VARCHAR(50) NULL );\n\
             INSERT INTO [t] ( [id], [name] ) VALUES ( 1, 'a' );\n"
        );
    }
}
