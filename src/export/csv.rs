//! CSV export.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, ReconcileResult};
use crate::types::DataSet;

/// Write `dataset` to `path` as comma-separated text with a header row.
///
/// - `columns` picks and orders the written columns; `None` writes every column in schema order.
/// - Nulls are written as empty fields.
/// - An existing file at `path` is replaced. The data is first written to a sibling temporary
///   file and then renamed over `path`, so a failed write never leaves a truncated report.
pub fn write_csv_to_path(
    dataset: &DataSet,
    path: impl AsRef<Path>,
    columns: Option<&[String]>,
) -> ReconcileResult<()> {
    let path = path.as_ref();
    let tmp = temp_sibling(path);

    let written = fs::File::create(&tmp)
        .map_err(ReconcileError::from)
        .and_then(|file| {
            let mut wtr = csv::Writer::from_writer(file);
            write_csv_to_writer(dataset, &mut wtr, columns)?;
            let file = wtr.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
            Ok(())
        });

    match written {
        Ok(()) => {
            fs::rename(&tmp, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

/// Write `dataset` through an existing CSV writer and flush it.
pub fn write_csv_to_writer<W: Write>(
    dataset: &DataSet,
    wtr: &mut csv::Writer<W>,
    columns: Option<&[String]>,
) -> ReconcileResult<()> {
    let indices: Vec<usize> = match columns {
        None => (0..dataset.schema.fields.len()).collect(),
        Some(cols) => cols
            .iter()
            .map(|c| {
                dataset
                    .schema
                    .index_of(c)
                    .ok_or_else(|| ReconcileError::SchemaMismatch {
                        message: format!(
                            "cannot export unknown column '{c}'. columns={:?}",
                            dataset.schema.names()
                        ),
                    })
            })
            .collect::<ReconcileResult<_>>()?,
    };

    wtr.write_record(indices.iter().map(|&i| dataset.schema.fields[i].name.as_str()))?;
    for row in &dataset.rows {
        wtr.write_record(
            indices
                .iter()
                .map(|&i| row.get(i).map(|v| v.to_string()).unwrap_or_default()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
