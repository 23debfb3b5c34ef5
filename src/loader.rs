use std::path::Path;

use anyhow::{Context, Result, ensure};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    config::ValidatedConfig,
    data::DateOrder,
    infer::infer_fields,
    io_utils,
    record::{Dataset, read_dataset},
    schema::TableSchema,
    sql::InsertTemplate,
    store::{SchemaStore, SqliteStore, StatementExecutor},
};

/// Per-file read settings.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub date_order: DateOrder,
}

/// Outcome of loading one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    pub columns: usize,
    pub rows: usize,
}

/// Derives `<prefix><file stem>` from a source path.
pub fn table_name(prefix: &str, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{prefix}{stem}")
}

/// Infers and resolves the column schema for a non-empty dataset.
pub fn resolve_schema(table: &str, dataset: &Dataset, order: DateOrder) -> Result<TableSchema> {
    ensure!(
        !dataset.is_empty(),
        "No data records found; cannot derive columns for table '{table}'"
    );
    let fields = infer_fields(&dataset.records, order);
    let schema = TableSchema::resolve(table, &fields);
    for column in &schema.columns {
        debug!("Column '{}' resolved to {}", column.name, column.datatype);
    }
    Ok(schema)
}

/// Creates `schema`'s table on `store`, naming the table in any error.
pub fn create_table<S>(store: &mut S, schema: &TableSchema) -> Result<()>
where
    S: SchemaStore + ?Sized,
{
    store
        .create_table(&schema.table, &schema.columns)
        .with_context(|| format!("Creating table '{}'", schema.table))
}

/// Executes one INSERT per record, in order. The first failure aborts the
/// remaining records.
pub fn insert_records<E>(
    executor: &mut E,
    schema: &TableSchema,
    dataset: &Dataset,
    order: DateOrder,
) -> Result<usize>
where
    E: StatementExecutor + ?Sized,
{
    let template = InsertTemplate::new(schema, order);
    for (row_idx, record) in dataset.records.iter().enumerate() {
        let statement = template.render(record);
        executor
            .execute(&statement)
            .with_context(|| format!("Inserting row {} into '{}'", row_idx + 2, schema.table))?;
    }
    Ok(dataset.len())
}

/// Runs the full pipeline for an already-buffered dataset.
pub fn load_dataset<T>(
    target: &mut T,
    table: &str,
    dataset: &Dataset,
    order: DateOrder,
) -> Result<LoadSummary>
where
    T: SchemaStore + StatementExecutor + ?Sized,
{
    let schema = resolve_schema(table, dataset, order)?;
    create_table(target, &schema)?;
    info!(
        "Created table '{}' with {} column(s)",
        schema.table,
        schema.columns.len()
    );
    let rows = insert_records(target, &schema, dataset, order)?;
    Ok(LoadSummary {
        table: schema.table,
        columns: schema.columns.len(),
        rows,
    })
}

/// Reads one file and loads it as `table`.
pub fn load_file<T>(
    target: &mut T,
    path: &Path,
    table: &str,
    options: &ReadOptions,
) -> Result<LoadSummary>
where
    T: SchemaStore + StatementExecutor + ?Sized,
{
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let dataset = read_dataset(path, delimiter, options.encoding)?;
    load_dataset(target, table, &dataset, options.date_order)
        .with_context(|| format!("Loading {path:?}"))
}

/// Loads every configured source file in order, stopping at the first
/// failure.
pub fn load_folder<T>(target: &mut T, config: &ValidatedConfig) -> Result<Vec<LoadSummary>>
where
    T: SchemaStore + StatementExecutor + ?Sized,
{
    let options = ReadOptions {
        delimiter: config.delimiter,
        encoding: io_utils::resolve_encoding(config.input_encoding.as_deref())?,
        date_order: config.date_order,
    };
    let mut summaries = Vec::with_capacity(config.files.len());
    for path in &config.files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Processing {file_name}...");
        let table = table_name(&config.table_prefix, path);
        let summary = load_file(target, path, &table, &options)?;
        info!("Inserted {} row(s) into '{}'", summary.rows, summary.table);
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Opens the configured SQLite database and loads every source file into it.
pub fn load_into_sqlite(config: &ValidatedConfig) -> Result<Vec<LoadSummary>> {
    let mut store = SqliteStore::open(&config.database)
        .with_context(|| format!("Opening database {:?}", config.database))?;
    load_folder(&mut store, config)
}
