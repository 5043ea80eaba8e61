//! CSV/TSV ingestion.

use std::path::Path;

use crate::error::ReconcileResult;
use crate::types::{dedupe_names, DataSet, DataType, Field, Schema, Value};

use super::unified::IngestionOptions;

/// Ingest a delimited text file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - The first record is the header row; a leading UTF-8 byte-order mark is dropped.
/// - Repeated header names are disambiguated as `name`, `name.1`, `name.2`, ...
/// - Every record must have as many fields as the header (ragged input is a csv error).
/// - Bytes are decoded as UTF-8 lossily; invalid sequences become U+FFFD.
/// - Cells matching `options.null_tokens` are null; every other cell keeps its text unless
///   `options.infer_types` is set, see [`infer_column_type`].
pub fn ingest_csv_from_path(
    path: impl AsRef<Path>,
    delimiter: u8,
    options: &IngestionOptions,
) -> ReconcileResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, options)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    options: &IngestionOptions,
) -> ReconcileResult<DataSet> {
    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let raw = if i == 0 { raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw) } else { raw };
            String::from_utf8_lossy(raw).into_owned()
        })
        .collect();
    let headers = dedupe_names(headers);

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        let row = record
            .iter()
            .map(|raw| {
                let text = String::from_utf8_lossy(raw);
                if is_null_token(&text, &options.null_tokens) {
                    None
                } else {
                    Some(text.into_owned())
                }
            })
            .collect();
        cells.push(row);
    }

    Ok(typed_dataset(headers, cells, options))
}

/// Build a dataset from a raw text grid (`None` = null).
///
/// Columns are `Utf8` unless `options.infer_types` is set and the column is not one of
/// `options.text_columns`.
pub(crate) fn typed_dataset(
    headers: Vec<String>,
    cells: Vec<Vec<Option<String>>>,
    options: &IngestionOptions,
) -> DataSet {
    let types: Vec<DataType> = headers
        .iter()
        .enumerate()
        .map(|(col, name)| {
            if !options.infer_types || is_text_column(name, &options.text_columns) {
                return DataType::Utf8;
            }
            infer_column_type(
                cells
                    .iter()
                    .filter_map(|row| row.get(col).and_then(|c| c.as_deref())),
            )
        })
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            types
                .iter()
                .enumerate()
                .map(|(col, data_type)| match row.get(col).cloned().flatten() {
                    Some(text) => parse_typed_value(*data_type, text),
                    None => Value::Null,
                })
                .collect()
        })
        .collect();

    let fields = headers
        .into_iter()
        .zip(types)
        .map(|(name, data_type)| Field::new(name, data_type))
        .collect();
    DataSet::new(Schema::new(fields), rows)
}

/// Infer the narrowest type that every (non-null) cell of a column parses as.
///
/// Order of preference: `Int64`, then finite `Float64`, then `Bool` (`true`/`false` in any
/// case), else `Utf8`. A column with no non-null cells is `Utf8`.
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> DataType {
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    let mut any = false;

    for cell in cells {
        any = true;
        let t = cell.trim();
        if all_int && t.parse::<i64>().is_err() {
            all_int = false;
        }
        if all_float && parse_finite_f64(t).is_none() {
            all_float = false;
        }
        if all_bool && parse_bool(t).is_none() {
            all_bool = false;
        }
        if !all_int && !all_float && !all_bool {
            return DataType::Utf8;
        }
    }

    match (any, all_int, all_float, all_bool) {
        (false, ..) => DataType::Utf8,
        (true, true, _, _) => DataType::Int64,
        (true, false, true, _) => DataType::Float64,
        (true, false, false, true) => DataType::Bool,
        _ => DataType::Utf8,
    }
}

fn parse_typed_value(data_type: DataType, raw: String) -> Value {
    let trimmed = raw.trim();
    // Inference guarantees the parse succeeds; fall back to text rather than lose the cell.
    match data_type {
        DataType::Int64 => trimmed.parse::<i64>().map(Value::Int64).unwrap_or(Value::Utf8(raw)),
        DataType::Float64 => match parse_finite_f64(trimmed) {
            Some(v) => Value::Float64(v),
            None => Value::Utf8(raw),
        },
        DataType::Bool => match parse_bool(trimmed) {
            Some(v) => Value::Bool(v),
            None => Value::Utf8(raw),
        },
        DataType::Utf8 => Value::Utf8(raw),
    }
}

fn parse_finite_f64(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn is_text_column(name: &str, text_columns: &[String]) -> bool {
    let name = name.trim();
    text_columns.iter().any(|c| c.trim().eq_ignore_ascii_case(name))
}

pub(crate) fn is_null_token(raw: &str, null_tokens: &[String]) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || null_tokens.iter().any(|t| t == trimmed)
}

#[cfg(test)]
mod tests {
    use super::{infer_column_type, ingest_csv_from_reader};
    use crate::ingestion::IngestionOptions;
    use crate::types::{DataSet, DataType, Value};

    fn options(infer_types: bool) -> IngestionOptions {
        IngestionOptions {
            null_tokens: vec!["NA".to_string(), "nan".to_string()],
            infer_types,
            ..Default::default()
        }
    }

    fn read_with(input: &str, opts: &IngestionOptions) -> DataSet {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input.as_bytes());
        ingest_csv_from_reader(&mut rdr, opts).unwrap()
    }

    fn read(input: &str) -> DataSet {
        read_with(input, &options(false))
    }

    #[test]
    fn infers_types_per_column() {
        assert_eq!(infer_column_type(["1", " 2 ", "-3"].into_iter()), DataType::Int64);
        assert_eq!(infer_column_type(["1", "2.5"].into_iter()), DataType::Float64);
        assert_eq!(infer_column_type(["True", "false"].into_iter()), DataType::Bool);
        assert_eq!(infer_column_type(["1", "yes"].into_iter()), DataType::Utf8);
        assert_eq!(infer_column_type(["inf"].into_iter()), DataType::Utf8);
        assert_eq!(infer_column_type(std::iter::empty()), DataType::Utf8);
    }

    #[test]
    fn cells_keep_their_text_by_default() {
        let ds = read("ticket,phone,score\n00420042,0555123,2.50\n");
        assert!(ds.schema.fields.iter().all(|f| f.data_type == DataType::Utf8));
        assert_eq!(
            ds.rows[0],
            vec![
                Value::Utf8("00420042".to_string()),
                Value::Utf8("0555123".to_string()),
                Value::Utf8("2.50".to_string()),
            ]
        );
    }

    #[test]
    fn null_tokens_and_blank_cells_become_null() {
        let ds = read_with("a,b\n1,NA\n,x\n", &options(true));
        assert_eq!(ds.schema.fields[0].data_type, DataType::Int64);
        assert_eq!(ds.rows[0], vec![Value::Int64(1), Value::Null]);
        assert_eq!(ds.rows[1], vec![Value::Null, Value::Utf8("x".to_string())]);
    }

    #[test]
    fn text_columns_skip_inference() {
        let mut opts = options(true);
        opts.text_columns = vec!["UUID".to_string()];
        let ds = read_with(" uuid ,n\n123456E7,7\n", &opts);
        assert_eq!(ds.schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(ds.rows[0], vec![Value::Utf8("123456E7".to_string()), Value::Int64(7)]);
    }

    #[test]
    fn text_cells_keep_surrounding_whitespace() {
        let ds = read("name\n Ada \n");
        assert_eq!(ds.rows[0][0], Value::Utf8(" Ada ".to_string()));
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let ds = read("\u{feff}ticket_id,Name\nA1,Jane\n");
        assert_eq!(ds.schema.names(), vec!["ticket_id", "Name"]);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let bytes: &[u8] = b"Name\nJos\xE9\n";
        let mut rdr = csv::ReaderBuilder::new().from_reader(bytes);
        let ds = ingest_csv_from_reader(&mut rdr, &options(false)).unwrap();
        assert_eq!(ds.rows[0][0], Value::Utf8("Jos\u{fffd}".to_string()));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut rdr = csv::ReaderBuilder::new().from_reader("a,b\n1,2,3\n".as_bytes());
        let err = ingest_csv_from_reader(&mut rdr, &options(false)).unwrap_err();
        assert!(err.to_string().contains("csv error"));
    }
}
