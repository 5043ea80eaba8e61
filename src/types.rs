//! Core data model types.
//!
//! Every table handled by this crate (raw inputs, the joined table, each report) is an in-memory
//! [`DataSet`]: a [`Schema`] (ordered, typed [`Field`]s) plus row-major [`Value`] storage.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Owned copy of the field names, in order. Used for error context.
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns `true` if a field with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Textual form of the value, or `None` for [`Value::Null`].
    ///
    /// Integral floats keep a trailing `.0` (`1.0`, not `1`) and booleans render as
    /// `True`/`False`, matching how spreadsheet exports usually spell them.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int64(v) => Some(v.to_string()),
            Value::Float64(v) => Some(format_float(*v)),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            Value::Utf8(s) => Some(s.clone()),
        }
    }

    fn key(&self) -> CellKey<'_> {
        match self {
            Value::Null => CellKey::Null,
            Value::Int64(v) => CellKey::Int64(*v),
            // -0.0 == 0.0, so both hash to the same key.
            Value::Float64(v) if *v == 0.0 => CellKey::Float64(0),
            Value::Float64(v) => CellKey::Float64(v.to_bits()),
            Value::Bool(v) => CellKey::Bool(*v),
            Value::Utf8(s) => CellKey::Utf8(s.as_str()),
        }
    }
}

/// Renders the CSV form: nulls are empty fields.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(s) => f.write_str(&s),
            None => Ok(()),
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

/// Hashable view of a [`Value`], used for exact-duplicate detection.
#[derive(PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Utf8(&'a str),
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the values of one column by index.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null))
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Create a new dataset by applying `mapper` to every row.
    ///
    /// The returned dataset preserves the original schema.
    ///
    /// # Panics
    ///
    /// Panics if `mapper` returns a row with a different length than the schema field count.
    pub fn map_rows<F>(&self, mut mapper: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value>,
    {
        let expected_len = self.schema.fields.len();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let out = mapper(row.as_slice());
                assert!(
                    out.len() == expected_len,
                    "mapped row length {} does not match schema length {}",
                    out.len(),
                    expected_len
                );
                out
            })
            .collect();

        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Reduce (fold) all rows into an accumulator value.
    ///
    /// This is similar to `Iterator::fold`, but provides each row as `&[Value]`.
    pub fn reduce_rows<A, F>(&self, init: A, mut reducer: F) -> A
    where
        F: FnMut(A, &[Value]) -> A,
    {
        self.rows
            .iter()
            .fold(init, |acc, row| reducer(acc, row.as_slice()))
    }

    /// Project onto `indices` (in the given order), producing a new dataset.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range for the schema.
    pub fn project(&self, indices: &[usize]) -> Self {
        let fields = indices
            .iter()
            .map(|&i| self.schema.fields[i].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self::new(Schema::new(fields), rows)
    }

    /// Drop rows that are identical, cell for cell, to an earlier row.
    ///
    /// First occurrences keep their relative order. Nulls compare equal to nulls.
    pub fn distinct_rows(&self) -> Self {
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(self.rows.len());
        let mut keep = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            if seen.insert(row.iter().map(Value::key).collect()) {
                keep.push(idx);
            }
        }
        let rows = keep.into_iter().map(|i| self.rows[i].clone()).collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }
}

/// Make column names unique: the second `x` becomes `x.1`, the third `x.2`, and so on.
///
/// Names that are already unique come back unchanged, so applying this twice is a no-op.
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
            continue;
        }
        let mut n = 1usize;
        let candidate = loop {
            let candidate = format!("{name}.{n}");
            if !out.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{dedupe_names, DataSet, DataType, Field, Schema, Value};

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("active", DataType::Bool),
            Field::new("name", DataType::Utf8),
        ]);

        let rows = vec![
            vec![Value::Int64(1), Value::Bool(true), Value::Utf8("a".to_string())],
            vec![Value::Int64(2), Value::Bool(false), Value::Utf8("b".to_string())],
            vec![Value::Int64(1), Value::Bool(true), Value::Utf8("a".to_string())],
            vec![Value::Int64(3), Value::Bool(true), Value::Null],
        ];

        DataSet::new(schema, rows)
    }

    #[test]
    fn schema_index_of_works() {
        let ds = sample_dataset();
        assert_eq!(ds.schema.index_of("id"), Some(0));
        assert_eq!(ds.schema.index_of("name"), Some(2));
        assert_eq!(ds.schema.index_of("missing"), None);
        assert!(ds.schema.contains("active"));
    }

    #[test]
    fn filter_rows_preserves_schema() {
        let ds = sample_dataset();
        let out = ds.filter_rows(|row| matches!(row.first(), Some(Value::Int64(v)) if *v > 1));
        assert_eq!(out.schema, ds.schema);
        assert_eq!(out.row_count(), 2);
        // Original unchanged
        assert_eq!(ds.row_count(), 4);
    }

    #[test]
    #[should_panic(expected = "mapped row length")]
    fn map_rows_panics_if_mapper_returns_wrong_arity() {
        let ds = sample_dataset();
        let _ = ds.map_rows(|_row| vec![Value::Int64(1)]);
    }

    #[test]
    fn reduce_rows_counts_nulls() {
        let ds = sample_dataset();
        let nulls = ds.reduce_rows(0usize, |n, row| n + usize::from(row[2].is_null()));
        assert_eq!(nulls, 1);
    }

    #[test]
    fn project_reorders_columns() {
        let ds = sample_dataset();
        let out = ds.project(&[2, 0]);
        assert_eq!(out.schema.names(), vec!["name", "id"]);
        assert_eq!(out.rows[1], vec![Value::Utf8("b".to_string()), Value::Int64(2)]);
    }

    #[test]
    fn distinct_rows_keeps_first_occurrence_order() {
        let ds = sample_dataset();
        let out = ds.distinct_rows();
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.rows[0][0], Value::Int64(1));
        assert_eq!(out.rows[1][0], Value::Int64(2));
        assert_eq!(out.rows[2][0], Value::Int64(3));
    }

    #[test]
    fn distinct_rows_treats_nulls_and_signed_zero_as_equal() {
        let schema = Schema::new(vec![
            Field::new("x", DataType::Float64),
            Field::new("y", DataType::Utf8),
        ]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Float64(0.0), Value::Null],
                vec![Value::Float64(-0.0), Value::Null],
                vec![Value::Float64(0.5), Value::Null],
            ],
        );
        assert_eq!(ds.distinct_rows().row_count(), 2);
    }

    #[test]
    fn text_form_of_values() {
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Int64(42).to_text().as_deref(), Some("42"));
        assert_eq!(Value::Float64(1.0).to_text().as_deref(), Some("1.0"));
        assert_eq!(Value::Float64(2.5).to_text().as_deref(), Some("2.5"));
        assert_eq!(Value::Bool(true).to_text().as_deref(), Some("True"));
        assert_eq!(Value::Utf8(" x ".into()).to_text().as_deref(), Some(" x "));
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn dedupe_names_suffixes_repeats() {
        let names = dedupe_names(vec!["x".into(), "x".into(), "x.1".into(), "y".into()]);
        assert_eq!(names, vec!["x", "x.1", "x.1.1", "y"]);
        assert_eq!(dedupe_names(names.clone()), names);
    }
}
