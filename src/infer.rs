//! Field type inference.
//!
//! Inference is a fold over the buffered records. Each field starts as a
//! candidate for every type and loses candidacy the first time a non-empty
//! value fails to parse; a lost flag is never regained.

use itertools::Itertools;

use crate::{
    data::{DateOrder, parse_boolean, parse_datetime, parse_decimal, parse_integer},
    record::Record,
};

/// Text widths are rounded up to the next multiple of this step.
pub const WIDTH_STEP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub max_observed_length: usize,
    pub is_integer: bool,
    pub is_decimal: bool,
    pub is_datetime: bool,
    pub is_boolean: bool,
}

impl FieldDescriptor {
    pub fn seed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_observed_length: 0,
            is_integer: true,
            is_decimal: true,
            is_datetime: true,
            is_boolean: true,
        }
    }

    /// Returns the descriptor after observing one raw value. Empty and absent
    /// values leave it unchanged.
    pub fn observe(&self, raw: Option<&str>, order: DateOrder) -> Self {
        let mut next = self.clone();
        let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return next;
        };

        next.max_observed_length = next.max_observed_length.max(value.chars().count());
        if next.is_datetime && parse_datetime(value, order).is_none() {
            next.is_datetime = false;
        }
        if next.is_boolean && parse_boolean(value).is_none() {
            next.is_boolean = false;
        }
        if next.is_integer && parse_integer(value).is_none() {
            next.is_integer = false;
        }
        if next.is_decimal && parse_decimal(value).is_none() {
            next.is_decimal = false;
        }
        next
    }

    pub fn padded_width(&self) -> usize {
        padded_width(self.max_observed_length)
    }

    /// True when every flag set on `self` is also set on `earlier`.
    pub fn narrows(&self, earlier: &FieldDescriptor) -> bool {
        (!self.is_integer || earlier.is_integer)
            && (!self.is_decimal || earlier.is_decimal)
            && (!self.is_datetime || earlier.is_datetime)
            && (!self.is_boolean || earlier.is_boolean)
    }
}

/// Rounds `length` up to the next multiple of [`WIDTH_STEP`]. Exact multiples,
/// zero included, still gain a full step of headroom.
pub fn padded_width(length: usize) -> usize {
    length + WIDTH_STEP - (length % WIDTH_STEP)
}

/// Seeds one descriptor per distinct header key of the first record.
pub fn seed_fields(first: &Record) -> Vec<FieldDescriptor> {
    first.keys().unique().map(FieldDescriptor::seed).collect()
}

/// Folds one record into the descriptor set. Keys without a descriptor are
/// ignored.
pub fn observe_record(
    fields: Vec<FieldDescriptor>,
    record: &Record,
    order: DateOrder,
) -> Vec<FieldDescriptor> {
    fields
        .into_iter()
        .map(|field| {
            if record.contains_key(&field.name) {
                field.observe(record.get(&field.name), order)
            } else {
                field
            }
        })
        .collect()
}

/// Infers descriptors for a buffered record set. The field set is fixed by
/// the first record; an empty input yields no fields.
pub fn infer_fields(records: &[Record], order: DateOrder) -> Vec<FieldDescriptor> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    records
        .iter()
        .fold(seed_fields(first), |fields, record| {
            observe_record(fields, record, order)
        })
}
