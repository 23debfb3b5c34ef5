use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{data::DateOrder, schema::SqlDialect};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load delimited text files into SQL tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer column types for a file and print (or save) the resolved schema
    Infer(InferArgs),
    /// Write CREATE TABLE and INSERT statements for a file as a SQL script
    Script(ScriptArgs),
    /// Create and populate one table per *.csv file in a folder
    Load(LoadArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Explicit table name (defaults to prefix + file name)
    #[arg(long)]
    pub table: Option<String>,
    /// Prefix prepended to the file name when deriving the table name
    #[arg(long, default_value = crate::config::DEFAULT_TABLE_PREFIX)]
    pub prefix: String,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// How ambiguous numeric dates are read
    #[arg(long = "date-order", value_enum, default_value_t = DateOrder::MonthFirst)]
    pub date_order: DateOrder,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Save the resolved schema as YAML
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Also print the CREATE TABLE statement for this dialect
    #[arg(long, value_enum)]
    pub ddl: Option<SqlDialect>,
}

#[derive(Debug, Args)]
pub struct ScriptArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output SQL file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Target SQL dialect for column types
    #[arg(long, value_enum, default_value_t = SqlDialect::SqlServer)]
    pub dialect: SqlDialect,
    /// Character encoding for the script (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Folder containing the *.csv files to load
    #[arg(short = 's', long = "source")]
    pub source: Option<PathBuf>,
    /// SQLite database file to create tables in
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,
    /// Table name prefix (defaults to _csv_)
    #[arg(long)]
    pub prefix: Option<String>,
    /// Delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long)]
    pub delimiter: Option<String>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// How ambiguous numeric dates are read
    #[arg(long = "date-order", value_enum)]
    pub date_order: Option<DateOrder>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_aliases_resolve() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter("#"), Ok(b'#'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("\u{e9}").is_err());
    }

    #[test]
    fn cli_parses_script_flags() {
        let cli = Cli::try_parse_from([
            "csv-to-sql",
            "script",
            "-i",
            "people.csv",
            "--dialect",
            "sqlite",
            "--date-order",
            "day-first",
            "--delimiter",
            "tab",
        ])
        .expect("parse");
        let Commands::Script(args) = cli.command else {
            panic!("expected script command");
        };
        assert_eq!(args.dialect, SqlDialect::Sqlite);
        assert_eq!(args.input.date_order, DateOrder::DayFirst);
        assert_eq!(args.input.delimiter, Some(b'\t'));
        assert_eq!(args.input.prefix, "_csv_");
    }
}
