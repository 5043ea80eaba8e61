//! Column-name and identifier normalization for the two input tables.

use crate::error::{ReconcileError, ReconcileResult, TableRole};
use crate::types::{dedupe_names, DataSet, DataType, Schema, Value};

use super::ReconcileConfig;

/// The U+FFFD replacement character left behind by mis-decoded exports.
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Both input tables after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInputs {
    /// Registrations, identifier column renamed to [`ReconcileConfig::identifier_column`].
    pub registrations: DataSet,
    /// Scans, identifier column under the same canonical name.
    pub scans: DataSet,
    /// Registration header the identifier was found under, before renaming.
    pub identifier_source: String,
}

/// Normalize raw registrations and scans so they can be joined.
///
/// Steps, in order:
///
/// 1. trim every column name in both tables ([`normalize_column_names`]);
/// 2. locate the registrations identifier under one of the configured aliases
///    ([`find_identifier_column`]) and rename it to the canonical identifier name;
/// 3. locate the scans identifier under the canonical name ([`find_scan_identifier_column`]);
/// 4. canonicalize identifier values in both tables ([`canonicalize_identifier`]);
/// 5. strip U+FFFD from every text column of both tables ([`strip_replacement_chars`]).
///
/// Fails with [`ReconcileError::MissingIdentifierColumn`] if either identifier is absent.
pub fn normalize(
    registrations: DataSet,
    scans: DataSet,
    cfg: &ReconcileConfig,
) -> ReconcileResult<NormalizedInputs> {
    let registrations = normalize_column_names(registrations);
    let scans = normalize_column_names(scans);

    let reg_idx = find_identifier_column(&registrations.schema, &cfg.identifier_aliases)
        .ok_or_else(|| ReconcileError::MissingIdentifierColumn {
            table: TableRole::Registrations,
            accepted: cfg.identifier_aliases.clone(),
            available: registrations.schema.names(),
        })?;
    let identifier_source = registrations.schema.fields[reg_idx].name.clone();

    let scan_idx = find_scan_identifier_column(&scans.schema, &cfg.identifier_column)
        .ok_or_else(|| ReconcileError::MissingIdentifierColumn {
            table: TableRole::Scans,
            accepted: vec![cfg.identifier_column.clone()],
            available: scans.schema.names(),
        })?;

    let registrations = rename_column(registrations, reg_idx, &cfg.identifier_column);
    let scans = rename_column(scans, scan_idx, &cfg.identifier_column);

    let registrations =
        canonicalize_identifier_column(&registrations, reg_idx, &cfg.missing_identifier);
    let scans = canonicalize_identifier_column(&scans, scan_idx, &cfg.missing_identifier);

    Ok(NormalizedInputs {
        registrations: strip_replacement_chars(&registrations),
        scans: strip_replacement_chars(&scans),
        identifier_source,
    })
}

/// Trim leading/trailing whitespace from every column name (case preserved).
///
/// Names that collide after trimming are disambiguated with a `.N` suffix, so the result always
/// has unique names. Idempotent.
pub fn normalize_column_names(mut dataset: DataSet) -> DataSet {
    let trimmed = dataset
        .schema
        .fields
        .iter()
        .map(|f| f.name.trim().to_string())
        .collect();
    for (field, name) in dataset.schema.fields.iter_mut().zip(dedupe_names(trimmed)) {
        field.name = name;
    }
    dataset
}

/// Index of the first column (in column order) whose name matches one of `aliases`,
/// ignoring case.
pub fn find_identifier_column(schema: &Schema, aliases: &[String]) -> Option<usize> {
    schema.fields.iter().position(|f| {
        let lower = f.name.to_lowercase();
        aliases.iter().any(|a| a.to_lowercase() == lower)
    })
}

/// Index of the scans identifier column: the exact canonical name, else the first column equal
/// to it ignoring case. No alias search is performed.
pub fn find_scan_identifier_column(schema: &Schema, canonical: &str) -> Option<usize> {
    schema.index_of(canonical).or_else(|| {
        let lower = canonical.to_lowercase();
        schema.fields.iter().position(|f| f.name.to_lowercase() == lower)
    })
}

/// Canonical identifier text: the value's text form, trimmed and uppercased.
///
/// Null identifiers are not dropped; they become `missing` (so all null identifiers compare
/// equal to each other).
pub fn canonicalize_identifier(value: &Value, missing: &str) -> String {
    match value.to_text() {
        Some(text) => canonicalize_text(&text),
        None => missing.to_string(),
    }
}

fn canonicalize_text(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Replace column `idx` with canonical identifier text; the column becomes `Utf8`.
pub fn canonicalize_identifier_column(dataset: &DataSet, idx: usize, missing: &str) -> DataSet {
    let mut out = dataset.map_rows(|row| {
        let mut row = row.to_vec();
        row[idx] = Value::Utf8(canonicalize_identifier(&row[idx], missing));
        row
    });
    out.schema.fields[idx].data_type = DataType::Utf8;
    out
}

/// Remove every U+FFFD from every cell of every `Utf8` column; other columns pass through.
pub fn strip_replacement_chars(dataset: &DataSet) -> DataSet {
    let text_cols: Vec<bool> = dataset
        .schema
        .fields
        .iter()
        .map(|f| f.data_type == DataType::Utf8)
        .collect();
    if !text_cols.contains(&true) {
        return dataset.clone();
    }

    dataset.map_rows(|row| {
        row.iter()
            .zip(&text_cols)
            .map(|(value, &is_text)| match value {
                Value::Utf8(s) if is_text && s.contains(REPLACEMENT_CHAR) => {
                    Value::Utf8(s.replace(REPLACEMENT_CHAR, ""))
                }
                other => other.clone(),
            })
            .collect()
    })
}

/// Rename column `idx` to `name`. Another column already called `name` gets a `.N` suffix.
fn rename_column(mut dataset: DataSet, idx: usize, name: &str) -> DataSet {
    if dataset.schema.fields[idx].name == name {
        return dataset;
    }
    if let Some(clash) = dataset.schema.index_of(name) {
        let taken = dataset.schema.names();
        let mut n = 1usize;
        let replacement = loop {
            let candidate = format!("{name}.{n}");
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        dataset.schema.fields[clash].name = replacement;
    }
    dataset.schema.fields[idx].name = name.to_string();
    dataset
}
