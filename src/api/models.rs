//! Wire types for the report server API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A report document as stored on the server.
///
/// Replaced wholesale when the viewer navigates to another report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub name: String,
    pub ref_doctype: String,
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub filters: Vec<FilterDef>,
    #[serde(default)]
    pub letter_head: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub prepared_report: bool,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// One filter definition, either doctype-configured or contributed by
/// a settings provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    pub fieldname: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fieldtype: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub reqd: bool,
}

impl FilterDef {
    pub fn new(fieldname: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            fieldname: fieldname.into(),
            label: label.into(),
            fieldtype: "Data".to_string(),
            default: None,
            reqd: false,
        }
    }
}

/// Response of the `get_script` RPC.
///
/// `script` names the settings provider for the report; `filters` are
/// the doctype-configured defaults, merged in when the provider does
/// not define its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportScript {
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub html_format: Option<String>,
    #[serde(default)]
    pub execution_time: u64,
    #[serde(default)]
    pub filters: Vec<FilterDef>,
}

/// Schema of the entity type a report references. Prefetched alongside
/// the report document for later menu predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctypeMeta {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<DocField>,
    #[serde(default)]
    pub is_submittable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocField {
    pub fieldname: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fieldtype: String,
}

/// Entry of the role-filtered report listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportListEntry {
    pub name: String,
    #[serde(default)]
    pub ref_doctype: String,
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// Server push event announcing a generated prepared-report artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGeneratedEvent {
    /// Name of the generated artifact document.
    pub name: String,
    /// Report the artifact belongs to.
    #[serde(default)]
    pub report_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_document_defaults() {
        let doc: ReportDocument = serde_json::from_value(serde_json::json!({
            "name": "Sales Summary",
            "ref_doctype": "Sales Invoice"
        }))
        .unwrap();
        assert_eq!(doc.name, "Sales Summary");
        assert!(!doc.disabled);
        assert!(doc.filters.is_empty());
        assert!(doc.modified.is_none());
    }

    #[test]
    fn test_report_script_defaults() {
        let script: ReportScript = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(script.script.is_none());
        assert_eq!(script.execution_time, 0);
    }

    #[test]
    fn test_generated_event_without_report_name() {
        let event: ReportGeneratedEvent =
            serde_json::from_value(serde_json::json!({"name": "PR-0001"})).unwrap();
        assert_eq!(event.name, "PR-0001");
        assert!(event.report_name.is_none());
    }
}
