//! Resolved table schema, type precedence, and DDL rendering.
//!
//! This module turns frozen [`FieldDescriptor`]s into [`ResolvedColumn`]s
//! using a fixed precedence (integer, decimal, datetime, boolean, text) and
//! renders the matching `CREATE TABLE` statement for a [`SqlDialect`].
//! Resolved schemas can be saved to and loaded from YAML for review.

use std::{fmt, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow, ensure};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{infer::FieldDescriptor, sql::quote_identifier};

const DECIMAL_MAX_PRECISION: u32 = 38;

/// Padded widths at or above this limit become unbounded text.
pub const UNBOUNDED_TEXT_THRESHOLD: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalSpec {
    /// Every inferred decimal column uses this precision and scale.
    pub const DEFAULT: DecimalSpec = DecimalSpec {
        precision: 18,
        scale: 2,
    };

    pub fn new(precision: u32, scale: u32) -> Result<Self> {
        let spec = Self { precision, scale };
        spec.ensure_valid()?;
        Ok(spec)
    }

    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(self.precision > 0, "Decimal precision must be positive");
        ensure!(
            self.precision <= DECIMAL_MAX_PRECISION,
            "Decimal precision must be <= {}",
            DECIMAL_MAX_PRECISION
        );
        ensure!(
            self.scale <= self.precision,
            "Decimal scale ({}) cannot exceed precision ({})",
            self.scale,
            self.precision
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Decimal(DecimalSpec),
    DateTime,
    Boolean,
    Text(usize),
    TextUnbounded,
}

impl ColumnType {
    pub fn sql_type(&self, dialect: SqlDialect) -> String {
        match (self, dialect) {
            (ColumnType::Integer, SqlDialect::SqlServer) => "INT".to_string(),
            (ColumnType::Integer, SqlDialect::Sqlite) => "INTEGER".to_string(),
            (ColumnType::Decimal(spec), _) => {
                format!("DECIMAL({},{})", spec.precision, spec.scale)
            }
            (ColumnType::DateTime, _) => "DATETIME".to_string(),
            (ColumnType::Boolean, SqlDialect::SqlServer) => "BIT".to_string(),
            (ColumnType::Boolean, SqlDialect::Sqlite) => "BOOLEAN".to_string(),
            (ColumnType::Text(width), _) => format!("VARCHAR({width})"),
            (ColumnType::TextUnbounded, SqlDialect::SqlServer) => "VARCHAR(MAX)".to_string(),
            (ColumnType::TextUnbounded, SqlDialect::Sqlite) => "TEXT".to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("integer"),
            ColumnType::Decimal(spec) => write!(f, "decimal({},{})", spec.precision, spec.scale),
            ColumnType::DateTime => f.write_str("datetime"),
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::Text(width) => write!(f, "text({width})"),
            ColumnType::TextUnbounded => f.write_str("text"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if let Some(args) = parenthesized(&normalized, "decimal") {
            let (precision, scale) = args
                .split_once(',')
                .ok_or_else(|| anyhow!("Decimal type must look like decimal(18,2)"))?;
            let precision = precision
                .trim()
                .parse()
                .with_context(|| format!("Invalid decimal precision in '{value}'"))?;
            let scale = scale
                .trim()
                .parse()
                .with_context(|| format!("Invalid decimal scale in '{value}'"))?;
            return Ok(ColumnType::Decimal(DecimalSpec::new(precision, scale)?));
        }
        if let Some(args) = parenthesized(&normalized, "text") {
            let width: usize = args
                .trim()
                .parse()
                .with_context(|| format!("Invalid text width in '{value}'"))?;
            ensure!(width > 0, "Text width must be positive");
            return Ok(ColumnType::Text(width));
        }
        match normalized.as_str() {
            "integer" | "int" => Ok(ColumnType::Integer),
            "decimal" => Ok(ColumnType::Decimal(DecimalSpec::DEFAULT)),
            "datetime" => Ok(ColumnType::DateTime),
            "boolean" | "bool" | "bit" => Ok(ColumnType::Boolean),
            "text" => Ok(ColumnType::TextUnbounded),
            _ => Err(anyhow!("Unknown column type '{value}'")),
        }
    }
}

fn parenthesized<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value
        .strip_prefix(prefix)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum SqlDialect {
    #[default]
    SqlServer,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub datatype: ColumnType,
}

impl ResolvedColumn {
    pub fn resolve(field: &FieldDescriptor) -> Self {
        let datatype = if field.is_integer {
            ColumnType::Integer
        } else if field.is_decimal {
            ColumnType::Decimal(DecimalSpec::DEFAULT)
        } else if field.is_datetime {
            ColumnType::DateTime
        } else if field.is_boolean {
            ColumnType::Boolean
        } else {
            text_type(field.padded_width())
        };
        Self {
            name: field.name.clone(),
            datatype,
        }
    }
}

pub fn text_type(padded_width: usize) -> ColumnType {
    if padded_width >= UNBOUNDED_TEXT_THRESHOLD {
        ColumnType::TextUnbounded
    } else {
        ColumnType::Text(padded_width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ResolvedColumn>,
}

impl TableSchema {
    pub fn resolve(table: impl Into<String>, fields: &[FieldDescriptor]) -> Self {
        Self {
            table: table.into(),
            columns: fields.iter().map(ResolvedColumn::resolve).collect(),
        }
    }

    pub fn create_table_sql(&self, dialect: SqlDialect) -> String {
        create_table_sql(&self.table, &self.columns, dialect)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file =
            std::fs::File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let schema = serde_yaml::from_reader(std::io::BufReader::new(file))
            .context("Parsing schema YAML")?;
        Ok(schema)
    }
}

/// Renders `CREATE TABLE [table] ( [col] TYPE, ... )`. Every column is
/// nullable.
pub fn create_table_sql(table: &str, columns: &[ResolvedColumn], dialect: SqlDialect) -> String {
    let nullability = match dialect {
        SqlDialect::SqlServer => " NULL",
        SqlDialect::Sqlite => "",
    };
    let definitions = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}{}",
                quote_identifier(&column.name),
                column.datatype.sql_type(dialect),
                nullability
            )
        })
        .join(", ");
    format!("CREATE TABLE {} ( {definitions} )", quote_identifier(table))
}
