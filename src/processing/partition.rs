//! Split the joined table into one de-duplicated report per grouping value.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::error::{ReconcileError, ReconcileResult};
use crate::types::{DataSet, Schema};

use super::ReconcileConfig;

/// Which column-selection rule produced the report columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// At least one priority column was present.
    Priority,
    /// No priority column was present; every column outside the exclusion set was used.
    Fallback,
}

/// Columns written to every report, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSelection {
    pub columns: Vec<String>,
    pub strategy: SelectionStrategy,
}

/// One grouping value's report.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    /// Text form of the grouping value.
    pub group: String,
    /// File name (no directory) the report is written under.
    pub file_name: String,
    /// Set when the natural file name was already taken by an earlier group; holds that name.
    pub collided_with: Option<String>,
    /// Joined rows carrying this grouping value, before de-duplication.
    pub source_rows: usize,
    /// The report: selected columns only, exact duplicates collapsed.
    pub dataset: DataSet,
}

impl GroupReport {
    /// Number of rows in the report.
    pub fn row_count(&self) -> usize {
        self.dataset.row_count()
    }
}

/// Result of [`partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub selection: ColumnSelection,
    /// Reports ordered by grouping value (lexicographic on the text form).
    pub reports: Vec<GroupReport>,
    /// Joined rows left out because their grouping value is null.
    pub ungrouped_rows: usize,
}

impl Partition {
    /// Total rows across all reports.
    pub fn total_rows(&self) -> usize {
        self.reports.iter().map(GroupReport::row_count).sum()
    }
}

/// Priority rule: the priority columns present in `schema`, in priority-list order.
pub fn select_priority_columns(schema: &Schema, priority: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in priority {
        if schema.contains(name) && !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

/// Fallback rule: every column of `schema` not in `excluded`, in schema order.
pub fn select_fallback_columns(schema: &Schema, excluded: &[String]) -> Vec<String> {
    schema
        .field_names()
        .filter(|name| !excluded.iter().any(|e| e == name))
        .map(str::to_string)
        .collect()
}

/// Apply the priority rule, falling back to the exclusion rule when it selects nothing.
pub fn select_output_columns(schema: &Schema, cfg: &ReconcileConfig) -> ColumnSelection {
    let columns = select_priority_columns(schema, &cfg.priority_columns);
    if !columns.is_empty() {
        return ColumnSelection {
            columns,
            strategy: SelectionStrategy::Priority,
        };
    }
    ColumnSelection {
        columns: select_fallback_columns(schema, &cfg.excluded_columns),
        strategy: SelectionStrategy::Fallback,
    }
}

/// File-name stem for a grouping value: trimmed, spaces to `_`, `/` to `-`.
///
/// Distinct values can share a stem (`"A B"` and `"A_B"`); [`partition`] detects that.
pub fn report_file_stem(group: &str) -> String {
    group.trim().replace(' ', "_").replace('/', "-")
}

/// Partition `joined` into one report per distinct non-null value of the grouping column.
///
/// Fails with [`ReconcileError::MissingGroupingColumn`] if the grouping column is absent.
/// Rows with a null grouping value appear in no report; every other row lands in exactly one.
pub fn partition(joined: &DataSet, cfg: &ReconcileConfig) -> ReconcileResult<Partition> {
    let group_idx = joined
        .schema
        .index_of(&cfg.grouping_column)
        .ok_or_else(|| ReconcileError::MissingGroupingColumn {
            column: cfg.grouping_column.clone(),
            available: joined.schema.names(),
        })?;

    let selection = select_output_columns(&joined.schema, cfg);
    let projection: Vec<usize> = selection
        .columns
        .iter()
        .filter_map(|c| joined.schema.index_of(c))
        .collect();

    let groups: BTreeSet<String> = joined.column(group_idx).filter_map(|v| v.to_text()).collect();
    let ungrouped_rows = joined.column(group_idx).filter(|v| v.is_null()).count();

    // File systems may fold case, so "MIT" and "mit" are treated as the same name.
    let mut taken: HashSet<String> = HashSet::with_capacity(groups.len());
    let mut reports = Vec::with_capacity(groups.len());
    for group in groups {
        let rows =
            joined.filter_rows(|row| row[group_idx].to_text().as_deref() == Some(group.as_str()));
        let source_rows = rows.row_count();
        let dataset = rows.project(&projection).distinct_rows();

        let stem = report_file_stem(&group);
        let natural = format!("{}{stem}.{}", cfg.report_prefix, cfg.report_extension);
        let mut file_name = natural.clone();
        let mut n = 2usize;
        while taken.contains(&file_name.to_lowercase()) {
            file_name = format!("{}{stem}_{n}.{}", cfg.report_prefix, cfg.report_extension);
            n += 1;
        }
        taken.insert(file_name.to_lowercase());
        let collided_with = (file_name != natural).then_some(natural);

        reports.push(GroupReport {
            group,
            file_name,
            collided_with,
            source_rows,
            dataset,
        });
    }

    Ok(Partition {
        selection,
        reports,
        ungrouped_rows,
    })
}
