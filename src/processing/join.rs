//! Left join of scans against registrations.

use std::collections::HashMap;

use crate::error::{ReconcileError, ReconcileResult, TableRole};
use crate::types::{DataSet, Schema, Value};

use super::normalize::canonicalize_identifier;
use super::ReconcileConfig;

/// Result of [`left_join`]: the joined table plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// Scan columns (original order) followed by registration columns not already present.
    pub dataset: DataSet,
    /// Number of scan rows that went into the join.
    pub scan_rows: usize,
    /// Joined rows whose probe column is null, see [`JoinOutcome::probe_column`].
    pub unmatched: usize,
    /// Column the unmatched count was taken from; `None` when registrations contributed no
    /// columns, in which case `unmatched` counts scans that found no registration.
    pub probe_column: Option<String>,
    /// Scan rows with no registration sharing their identifier.
    pub scans_without_registration: usize,
    /// Extra rows produced because several registrations share one identifier.
    pub fan_out_rows: usize,
}

/// Left-join `scans` against `registrations` on the canonical identifier column.
///
/// - Every scan row appears once per matching registration, in registration order; a scan with
///   no match appears once with every registration-derived column null.
/// - Registrations with duplicate identifiers are not collapsed: the scan row fans out.
/// - Registration columns whose name already exists among the scan columns are dropped.
///
/// Identifier values on both sides are compared in canonical form, so the join is correct even
/// for tables that skipped [`super::normalize::normalize`].
pub fn left_join(
    scans: &DataSet,
    registrations: &DataSet,
    cfg: &ReconcileConfig,
) -> ReconcileResult<JoinOutcome> {
    let key = cfg.identifier_column.as_str();
    let scan_key = key_index(scans, key, TableRole::Scans)?;
    let reg_key = key_index(registrations, key, TableRole::Registrations)?;

    let appended: Vec<usize> = registrations
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !scans.schema.contains(&f.name))
        .map(|(i, _)| i)
        .collect();

    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, value) in registrations.column(reg_key).enumerate() {
        by_key
            .entry(canonicalize_identifier(value, &cfg.missing_identifier))
            .or_default()
            .push(idx);
    }

    let mut rows = Vec::with_capacity(scans.row_count());
    let mut misses = 0usize;
    for scan in &scans.rows {
        let id = canonicalize_identifier(&scan[scan_key], &cfg.missing_identifier);
        match by_key.get(&id) {
            Some(matches) => {
                for &reg_idx in matches {
                    let reg = &registrations.rows[reg_idx];
                    let mut row = scan.clone();
                    row.extend(appended.iter().map(|&j| reg[j].clone()));
                    rows.push(row);
                }
            }
            None => {
                misses += 1;
                let mut row = scan.clone();
                row.extend(appended.iter().map(|_| Value::Null));
                rows.push(row);
            }
        }
    }

    let mut fields = scans.schema.fields.clone();
    fields.extend(appended.iter().map(|&j| registrations.schema.fields[j].clone()));
    let dataset = DataSet::new(Schema::new(fields), rows);

    let probe_column = probe_column(registrations, &appended, cfg);
    let unmatched = match &probe_column {
        Some(name) => count_nulls(&dataset, name),
        None => misses,
    };

    Ok(JoinOutcome {
        scan_rows: scans.row_count(),
        // Every scan yields at least one row, so anything beyond that came from fan-out.
        fan_out_rows: dataset.row_count() - scans.row_count(),
        unmatched,
        probe_column,
        scans_without_registration: misses,
        dataset,
    })
}

/// The first configured name column contributed by registrations, else the first contributed
/// column of any name.
fn probe_column(
    registrations: &DataSet,
    appended: &[usize],
    cfg: &ReconcileConfig,
) -> Option<String> {
    let contributed: Vec<&str> = appended
        .iter()
        .map(|&j| registrations.schema.fields[j].name.as_str())
        .collect();
    cfg.name_columns
        .iter()
        .find(|n| contributed.contains(&n.as_str()))
        .map(|n| n.to_string())
        .or_else(|| contributed.first().map(|n| n.to_string()))
}

fn count_nulls(dataset: &DataSet, column: &str) -> usize {
    match dataset.schema.index_of(column) {
        Some(idx) => dataset.reduce_rows(0usize, |n, row| n + usize::from(row[idx].is_null())),
        None => 0,
    }
}

fn key_index(dataset: &DataSet, key: &str, table: TableRole) -> ReconcileResult<usize> {
    dataset
        .schema
        .index_of(key)
        .ok_or_else(|| ReconcileError::MissingIdentifierColumn {
            table,
            accepted: vec![key.to_string()],
            available: dataset.schema.names(),
        })
}
