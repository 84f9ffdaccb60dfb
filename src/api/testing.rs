//! Canned transport for tests.

use super::client::ReportTransport;
use super::error::ApiError;
use super::models::{DoctypeMeta, ReportDocument, ReportListEntry, ReportScript};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;

/// In-memory [`ReportTransport`] with per-operation call counters.
pub(crate) struct MockTransport {
    docs: Mutex<HashMap<String, ReportDocument>>,
    scripts: Mutex<HashMap<String, ReportScript>>,
    metas: Mutex<HashMap<String, DoctypeMeta>>,
    fail_scripts: bool,
    pub doc_fetches: AtomicUsize,
    pub script_fetches: AtomicUsize,
    pub meta_fetches: AtomicUsize,
    pub list_fetches: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            scripts: Mutex::new(HashMap::new()),
            metas: Mutex::new(HashMap::new()),
            fail_scripts: false,
            doc_fetches: AtomicUsize::new(0),
            script_fetches: AtomicUsize::new(0),
            meta_fetches: AtomicUsize::new(0),
            list_fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_doc(self, doc: ReportDocument) -> Self {
        self.docs.lock().unwrap().insert(doc.name.clone(), doc);
        self
    }

    pub fn with_script(self, report_name: &str, script: ReportScript) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(report_name.to_string(), script);
        self
    }

    pub fn with_meta(self, meta: DoctypeMeta) -> Self {
        self.metas.lock().unwrap().insert(meta.name.clone(), meta);
        self
    }

    /// Make every `get_script` call reject.
    pub fn failing_scripts(mut self) -> Self {
        self.fail_scripts = true;
        self
    }
}

#[async_trait]
impl ReportTransport for MockTransport {
    async fn get_report_doc(&self, name: &str) -> Result<ReportDocument, ApiError> {
        self.doc_fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let doc = self
            .docs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::ReportNotFound(name.to_string()))?;
        if doc.disabled {
            return Err(ApiError::ReportDisabled(doc.name));
        }
        Ok(doc)
    }

    async fn get_script(&self, report_name: &str) -> Result<ReportScript, ApiError> {
        self.script_fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_scripts {
            return Err(ApiError::ScriptFetchFailure {
                report: report_name.to_string(),
                source: anyhow::anyhow!("canned failure").into(),
            });
        }
        Ok(self
            .scripts
            .lock()
            .unwrap()
            .get(report_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_doctype_meta(&self, doctype: &str) -> Result<DoctypeMeta, ApiError> {
        self.meta_fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self
            .metas
            .lock()
            .unwrap()
            .get(doctype)
            .cloned()
            .unwrap_or(DoctypeMeta {
                name: doctype.to_string(),
                fields: vec![],
                is_submittable: false,
            }))
    }

    async fn list_reports(&self) -> Result<Vec<ReportListEntry>, ApiError> {
        self.list_fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let docs = self.docs.lock().unwrap();
        let mut entries: Vec<ReportListEntry> = docs
            .values()
            .map(|doc| ReportListEntry {
                name: doc.name.clone(),
                ref_doctype: doc.ref_doctype.clone(),
                report_type: doc.report_type.clone(),
                modified: doc.modified,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
