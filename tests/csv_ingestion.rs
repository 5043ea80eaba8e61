use checkin_reconcile::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader};
use checkin_reconcile::ingestion::{load_table, IngestionFormat, IngestionOptions};
use checkin_reconcile::types::{DataType, Value};
use checkin_reconcile::ReconcileError;

fn defaults() -> IngestionOptions {
    IngestionOptions::default()
}

fn reader(input: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new().has_headers(true).from_reader(input)
}

#[test]
fn ingest_registrations_fixture() {
    let ds = ingest_csv_from_path("tests/fixtures/registrations.csv", b',', &defaults()).unwrap();

    assert_eq!(ds.row_count(), 3);
    // Header whitespace is left for the normalizer.
    assert_eq!(ds.schema.names(), vec!["ticket_id ", "Name", "Email", "Uni", "Phone"]);
    assert_eq!(ds.rows[0][1], Value::Utf8("Jane Doe".to_string()));
    assert_eq!(ds.rows[1][4], Value::Null);
    assert_eq!(ds.rows[2][2], Value::Null);
}

#[test]
fn numeric_looking_columns_are_typed_when_inference_is_on() {
    let opts = IngestionOptions {
        infer_types: true,
        ..Default::default()
    };
    let mut rdr = reader(b"id,score,vip,note\n00123,1.5,TRUE,x\n7,2,false,\n");
    let ds = ingest_csv_from_reader(&mut rdr, &opts).unwrap();

    let types: Vec<DataType> = ds.schema.fields.iter().map(|f| f.data_type).collect();
    assert_eq!(types, vec![DataType::Int64, DataType::Float64, DataType::Bool, DataType::Utf8]);
    assert_eq!(ds.rows[0][0], Value::Int64(123));
    assert_eq!(ds.rows[1][1], Value::Float64(2.0));
    assert_eq!(ds.rows[1][3], Value::Null);
}

#[test]
fn leading_zeros_survive_by_default() {
    let mut rdr = reader(b"ticket_id,Phone\n00420042,0555123\n");
    let ds = ingest_csv_from_reader(&mut rdr, &defaults()).unwrap();
    assert_eq!(ds.schema.fields[0].data_type, DataType::Utf8);
    assert_eq!(ds.rows[0][0], Value::Utf8("00420042".to_string()));
    assert_eq!(ds.rows[0][1], Value::Utf8("0555123".to_string()));
}

#[test]
fn bom_and_duplicate_headers_are_handled() {
    let mut rdr = reader(b"\xEF\xBB\xBFName,Name,Uni_ID\nJane,J,MIT\n");
    let ds = ingest_csv_from_reader(&mut rdr, &defaults()).unwrap();
    assert_eq!(ds.schema.names(), vec!["Name", "Name.1", "Uni_ID"]);
}

#[test]
fn invalid_utf8_decodes_lossily() {
    let mut rdr = reader(b"Name\nJos\xE9\n");
    let ds = ingest_csv_from_reader(&mut rdr, &defaults()).unwrap();
    assert_eq!(ds.rows[0][0], Value::Utf8("Jos\u{FFFD}".to_string()));
}

#[test]
fn ragged_rows_are_a_csv_error() {
    let mut rdr = reader(b"a,b\n1,2\n3\n");
    let err = ingest_csv_from_reader(&mut rdr, &defaults()).unwrap_err();
    assert!(matches!(err, ReconcileError::Csv(_)));
}

#[test]
fn tsv_is_detected_from_extension() {
    let ds = load_table("tests/fixtures/raw_scans.tsv", &IngestionOptions::default()).unwrap();
    assert_eq!(ds.schema.names(), vec!["Timestamp", "UUID", "Uni_ID"]);
    assert_eq!(ds.rows[0][2], Value::Utf8("MIT".to_string()));
}

#[test]
fn forced_format_overrides_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scans.export");
    std::fs::write(&path, "UUID\tUni_ID\nA1\tMIT\n").unwrap();

    let err = load_table(&path, &IngestionOptions::default()).unwrap_err();
    assert!(err.to_string().contains("cannot infer format"));

    let opts = IngestionOptions {
        format: Some(IngestionFormat::Tsv),
        ..Default::default()
    };
    let ds = load_table(&path, &opts).unwrap();
    assert_eq!(ds.schema.names(), vec!["UUID", "Uni_ID"]);
}
