//! Navigation routes.
//!
//! A route is the ordered list of path segments identifying the
//! current page and its parameters, plus query-style options carrying
//! ad-hoc filter values: `report-view/Sales Summary?from=2024-01-01`.

use std::collections::BTreeMap;

/// Route option key that selects a prepared report artifact by name.
pub const PREPARED_REPORT_OPTION: &str = "prepared_report_name";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    segments: Vec<String>,
    options: BTreeMap<String, String>,
}

impl Route {
    pub fn new(segments: Vec<String>) -> Self {
        Self {
            segments,
            options: BTreeMap::new(),
        }
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = (String, String)>) -> Self {
        self.options.extend(options);
        self
    }

    /// Parse a `page/segment/...?key=value&key=value` string.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };

        let segments = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mut options = BTreeMap::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((key, value)) => options.insert(key.to_string(), value.to_string()),
                    None => options.insert(pair.to_string(), String::new()),
                };
            }
        }

        Self { segments, options }
    }

    /// First segment: the page this route addresses.
    pub fn page_name(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Second segment: the report name, when one is addressed.
    pub fn report_name(&self) -> Option<&str> {
        self.segments.get(1).map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// True when the navigation carries filter options that should
    /// trigger a soft refresh on an already-loaded report.
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn prepared_report_name(&self) -> Option<&str> {
        self.option(PREPARED_REPORT_OPTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_only() {
        let route = Route::parse("report-view");
        assert_eq!(route.page_name(), Some("report-view"));
        assert_eq!(route.report_name(), None);
        assert!(!route.has_options());
    }

    #[test]
    fn test_parse_report_with_options() {
        let route = Route::parse("report-view/Sales Summary?from=2024-01-01&company=Acme");
        assert_eq!(route.page_name(), Some("report-view"));
        assert_eq!(route.report_name(), Some("Sales Summary"));
        assert_eq!(route.option("from"), Some("2024-01-01"));
        assert_eq!(route.option("company"), Some("Acme"));
        assert!(route.has_options());
    }

    #[test]
    fn test_parse_valueless_option() {
        let route = Route::parse("report-view/X?flag");
        assert_eq!(route.option("flag"), Some(""));
    }

    #[test]
    fn test_parse_ignores_empty_segments() {
        let route = Route::parse("report-view//Sales Summary");
        assert_eq!(route.report_name(), Some("Sales Summary"));
        assert_eq!(route.segments().len(), 2);
    }

    #[test]
    fn test_prepared_report_option() {
        let route = Route::parse("report-view/X?prepared_report_name=PR-0001");
        assert_eq!(route.prepared_report_name(), Some("PR-0001"));
    }
}
