//! SQL literal rendering and INSERT statement synthesis.
//!
//! Statements are built as literal text with no parameter binding. Each
//! column type has one pure rendering function; typed columns degrade to
//! `NULL` for empty or unparsable input, while text columns always produce a
//! quoted string (`''` when empty).

use itertools::Itertools;

use crate::{
    data::{DateOrder, format_datetime, parse_boolean, parse_datetime, parse_decimal, parse_integer},
    record::Record,
    schema::{ColumnType, ResolvedColumn, TableSchema},
};

/// The SQL null literal.
pub const NULL_LITERAL: &str = "NULL";

/// Wraps an identifier in brackets, doubling any closing bracket.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Wraps text in single quotes, doubling any embedded quote.
pub fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

/// `1`/`0` for `true`/`false` in any case, otherwise `NULL`.
pub fn boolean_literal(raw: Option<&str>) -> String {
    match non_empty(raw).and_then(parse_boolean) {
        Some(true) => "1".to_string(),
        Some(false) => "0".to_string(),
        None => NULL_LITERAL.to_string(),
    }
}

pub fn datetime_literal(raw: Option<&str>, order: DateOrder) -> String {
    non_empty(raw)
        .and_then(|value| parse_datetime(value, order))
        .map(|parsed| quote_text(&format_datetime(&parsed)))
        .unwrap_or_else(|| NULL_LITERAL.to_string())
}

/// Canonical 32-bit integer, or `NULL`.
pub fn integer_literal(raw: Option<&str>) -> String {
    non_empty(raw)
        .and_then(parse_integer)
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|| NULL_LITERAL.to_string())
}

/// Canonical decimal with grouping removed, or `NULL`.
pub fn decimal_literal(raw: Option<&str>) -> String {
    non_empty(raw)
        .and_then(parse_decimal)
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|| NULL_LITERAL.to_string())
}

/// Trimmed quoted text; an absent value becomes `''`.
pub fn text_literal(raw: Option<&str>) -> String {
    quote_text(raw.map(str::trim).unwrap_or_default())
}

/// Renders one raw value as a literal for a column of `datatype`.
pub fn render_value(raw: Option<&str>, datatype: &ColumnType, order: DateOrder) -> String {
    match datatype {
        ColumnType::Boolean => boolean_literal(raw),
        ColumnType::DateTime => datetime_literal(raw, order),
        ColumnType::Integer => integer_literal(raw),
        ColumnType::Decimal(_) => decimal_literal(raw),
        ColumnType::Text(_) | ColumnType::TextUnbounded => text_literal(raw),
    }
}

/// Renders one record's values in column order. A column the record does not
/// carry is rendered as an absent value.
pub fn render_values(record: &Record, columns: &[ResolvedColumn], order: DateOrder) -> Vec<String> {
    columns
        .iter()
        .map(|column| render_value(record.get(&column.name), &column.datatype, order))
        .collect()
}

/// Precomputed `INSERT INTO [t] ( [a], [b] ) VALUES ` prefix for a table.
#[derive(Debug, Clone)]
pub struct InsertTemplate<'a> {
    schema: &'a TableSchema,
    prefix: String,
    order: DateOrder,
}

impl<'a> InsertTemplate<'a> {
    pub fn new(schema: &'a TableSchema, order: DateOrder) -> Self {
        let columns = schema
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .join(", ");
        let prefix = format!(
            "INSERT INTO {} ( {columns} ) VALUES ",
            quote_identifier(&schema.table)
        );
        Self {
            schema,
            prefix,
            order,
        }
    }

    pub fn render(&self, record: &Record) -> String {
        let values = render_values(record, &self.schema.columns, self.order).join(", ");
        format!("{}( {values} )", self.prefix)
    }
}

/// Renders a single INSERT for `record` without reusing a template.
pub fn insert_statement(schema: &TableSchema, record: &Record, order: DateOrder) -> String {
    InsertTemplate::new(schema, order).render(record)
}
