#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{ReconcileError, ReconcileResult};
use crate::types::{dedupe_names, DataSet};

use super::csv::{is_null_token, typed_dataset};
use super::unified::IngestionOptions;

/// Ingest one sheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into an in-memory `DataSet`.
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row (header cells are used verbatim)
/// - Converts every cell to text and applies `options` exactly like CSV ingestion, so a
///   roster exported as a workbook reconciles the same way as its CSV export
pub fn ingest_excel_from_path(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
    options: &IngestionOptions,
) -> ReconcileResult<DataSet> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReconcileError::SchemaMismatch {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    sheet_to_dataset(&sheet, &range, options)
}

fn sheet_to_dataset(
    sheet: &str,
    range: &calamine::Range<Data>,
    options: &IngestionOptions,
) -> ReconcileResult<DataSet> {
    let mut rows = range.rows().skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let header_cells: Vec<String> = rows
        .next()
        .ok_or_else(|| ReconcileError::SchemaMismatch {
            message: format!("sheet '{sheet}' has no non-empty rows (no header row found)"),
        })?
        .iter()
        .map(cell_to_string)
        .collect();
    let width = header_cells.len();
    let headers = dedupe_names(header_cells);

    let cells: Vec<Vec<Option<String>>> = rows
        .map(|row| {
            (0..width)
                .map(|col| {
                    let cell = row.get(col).unwrap_or(&Data::Empty);
                    if matches!(cell, Data::Empty) {
                        return None;
                    }
                    let text = cell_to_string(cell);
                    if is_null_token(&text, &options.null_tokens) {
                        None
                    } else {
                        Some(text)
                    }
                })
                .collect()
        })
        .collect();

    Ok(typed_dataset(headers, cells, options))
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}
