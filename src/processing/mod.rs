//! The reconciliation engine: normalize, join, partition.
//!
//! Every step is a pure function over [`crate::types::DataSet`] values and takes its heuristics
//! from an explicit [`ReconcileConfig`], so each rule can be exercised without touching the
//! filesystem.
//!
//! - [`normalize`]: column-name trimming, identifier discovery and canonicalization, U+FFFD cleanup
//! - [`join`]: left join of scans against registrations, with unmatched/fan-out diagnostics
//! - [`partition`]: output-column selection and one de-duplicated report per grouping value
//!
//! ## Example
//!
//! ```rust
//! use checkin_reconcile::processing::{join, normalize, partition, ReconcileConfig};
//! use checkin_reconcile::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let cfg = ReconcileConfig::default();
//! let registrations = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("ticket_id", DataType::Utf8),
//!         Field::new("Name", DataType::Utf8),
//!     ]),
//!     vec![vec![Value::Utf8("A1".into()), Value::Utf8("Jane".into())]],
//! );
//! let scans = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("UUID", DataType::Utf8),
//!         Field::new("Uni_ID", DataType::Utf8),
//!     ]),
//!     vec![vec![Value::Utf8(" a1".into()), Value::Utf8("MIT".into())]],
//! );
//!
//! let normalized = normalize::normalize(registrations, scans, &cfg).unwrap();
//! let joined = join::left_join(&normalized.scans, &normalized.registrations, &cfg).unwrap();
//! assert_eq!(joined.unmatched, 0);
//!
//! let partition = partition::partition(&joined.dataset, &cfg).unwrap();
//! assert_eq!(partition.reports.len(), 1);
//! assert_eq!(partition.reports[0].file_name, "leads_MIT.csv");
//! assert_eq!(partition.reports[0].dataset.rows, vec![vec![Value::Utf8("Jane".into())]]);
//! ```

pub mod join;
pub mod normalize;
pub mod partition;

use serde::{Deserialize, Serialize};

pub use join::{left_join, JoinOutcome};
pub use normalize::{canonicalize_identifier, normalize_column_names, NormalizedInputs};
pub use partition::{
    partition, report_file_stem, select_fallback_columns, select_output_columns,
    select_priority_columns, ColumnSelection, GroupReport, Partition, SelectionStrategy,
};

/// Column-name heuristics and output layout for a reconciliation run.
///
/// [`Default`] carries the values used by the check-in workflow this crate was built for; every
/// field can be overridden (or deserialized, missing fields falling back to the defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Header names (compared case-insensitively) accepted as the registrations identifier.
    pub identifier_aliases: Vec<String>,
    /// Name the identifier column carries after normalization, in both tables.
    pub identifier_column: String,
    /// Canonical text a null identifier turns into.
    pub missing_identifier: String,
    /// Registration columns probed (in order) for the unmatched-scan diagnostic.
    pub name_columns: Vec<String>,
    /// Column holding the organization each scan belongs to.
    pub grouping_column: String,
    /// Report columns, in output order; those present in the joined table are kept.
    pub priority_columns: Vec<String>,
    /// Columns left out when no priority column is present.
    pub excluded_columns: Vec<String>,
    /// Report file names are `<prefix><stem>.<extension>`.
    pub report_prefix: String,
    pub report_extension: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            identifier_aliases: strings(&["ticket_id", "uuid", "ticketid", "id"]),
            identifier_column: "UUID".to_string(),
            missing_identifier: "NAN".to_string(),
            name_columns: strings(&["Name", "name"]),
            grouping_column: "Uni_ID".to_string(),
            priority_columns: strings(&[
                "Name",
                "Last Name",
                "Email",
                "Phone",
                "Which programs?",
                "Intake Year",
                "Country",
                "Additional Info",
                "Consent (to receive communication)",
                "name",
                "email",
                "phone",
            ]),
            excluded_columns: strings(&["UUID", "Uni_ID", "Timestamp", "uuid", "ticket_id"]),
            report_prefix: "leads_".to_string(),
            report_extension: "csv".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::ReconcileConfig;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: ReconcileConfig =
            serde_json::from_str(r#"{"grouping_column": "Org", "report_prefix": "org_"}"#).unwrap();
        assert_eq!(cfg.grouping_column, "Org");
        assert_eq!(cfg.report_prefix, "org_");
        assert_eq!(cfg.identifier_column, "UUID");
        assert_eq!(cfg.priority_columns.len(), 12);
    }
}
