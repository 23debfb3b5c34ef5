pub mod cli;
pub mod config;
pub mod data;
pub mod infer;
pub mod io_utils;
pub mod loader;
pub mod record;
pub mod schema;
pub mod sql;
pub mod store;

use std::{env, fmt::Write as _, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InferArgs, InputArgs, LoadArgs, ScriptArgs},
    config::LoaderConfig,
    infer::infer_fields,
    record::{Dataset, read_dataset},
    schema::TableSchema,
    store::ScriptWriter,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_to_sql", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => handle_infer(&args),
        Commands::Script(args) => handle_script(&args),
        Commands::Load(args) => handle_load(&args),
    }
}

fn read_input(args: &InputArgs) -> Result<(String, Dataset)> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = match &args.table {
        Some(name) => name.clone(),
        None if io_utils::is_dash(&args.input) => {
            return Err(anyhow!("--table is required when reading from stdin"));
        }
        None => loader::table_name(&args.prefix, &args.input),
    };
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let dataset = read_dataset(&args.input, delimiter, encoding)?;
    Ok((table, dataset))
}

fn handle_infer(args: &InferArgs) -> Result<()> {
    let (table, dataset) = read_input(&args.input)?;
    let fields = infer_fields(&dataset.records, args.input.date_order);
    let schema = TableSchema::resolve(table, &fields);

    let mut report = String::new();
    let name_width = schema
        .columns
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("column".len());
    let _ = writeln!(report, "{:<name_width$}  type", "column");
    for column in &schema.columns {
        let _ = writeln!(report, "{:<name_width$}  {}", column.name, column.datatype);
    }
    if let Some(dialect) = args.ddl {
        let _ = writeln!(report, "\n{};", schema.create_table_sql(dialect));
    }
    print!("{report}");

    if let Some(path) = &args.output {
        schema
            .save(path)
            .with_context(|| format!("Writing schema to {path:?}"))?;
        info!(
            "Resolved schema for {} column(s) written to {:?}",
            schema.columns.len(),
            path
        );
    }
    Ok(())
}

fn handle_script(args: &ScriptArgs) -> Result<()> {
    let (table, dataset) = read_input(&args.input)?;
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let out = io_utils::open_text_writer(args.output.as_deref(), encoding)?;
    let mut writer = ScriptWriter::new(out, args.dialect);
    let summary = loader::load_dataset(&mut writer, &table, &dataset, args.input.date_order)?;
    writer.finish().context("Flushing SQL script")?;
    info!(
        "Wrote CREATE TABLE and {} INSERT statement(s) for '{}'",
        summary.rows, summary.table
    );
    Ok(())
}

fn handle_load(args: &LoadArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };
    let config = base.merge(LoaderConfig {
        source_folder: args.source.clone(),
        database: args.database.clone(),
        table_prefix: args.prefix.clone(),
        delimiter: args.delimiter.clone(),
        input_encoding: args.input_encoding.clone(),
        date_order: args.date_order,
    });
    let validated = config.validate()?;
    info!(
        "Loading {} file(s) from {:?} into {:?}",
        validated.files.len(),
        validated.source_folder,
        validated.database
    );
    let summaries = loader::load_into_sqlite(&validated)?;
    let rows: usize = summaries.iter().map(|s| s.rows).sum();
    info!("Loaded {rows} row(s) into {} table(s)", summaries.len());
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
