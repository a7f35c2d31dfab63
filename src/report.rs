//! Issue, severity and report types shared by the validator and its callers

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::core::WcagError;

const REPORT_WIDTH: usize = 70;

/// How serious a finding is, ordered `Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Enhancement
    Low,
    /// Best practice
    Medium,
    /// Level AA blocker
    High,
    /// Level A blocker
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// WCAG success criteria the validator reports against
pub mod criteria {
    pub const NON_TEXT_CONTENT: &str = "1.1.1";
    pub const INFO_AND_RELATIONSHIPS: &str = "1.3.1";
    pub const BYPASS_BLOCKS: &str = "2.4.1";
    pub const PAGE_TITLED: &str = "2.4.2";
    pub const LINK_PURPOSE: &str = "2.4.4";
    pub const HEADINGS_AND_LABELS: &str = "2.4.6";
    pub const FOCUS_VISIBLE: &str = "2.4.7";
    pub const FOCUS_NOT_OBSCURED_MINIMUM: &str = "2.4.11";
    pub const FOCUS_APPEARANCE: &str = "2.4.13";
    pub const TARGET_SIZE_MINIMUM: &str = "2.5.8";
    pub const LANGUAGE_OF_PAGE: &str = "3.1.1";
}

/// One detected violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WcagIssue {
    pub criterion: String,
    pub severity: Severity,
    /// Short human-readable pointer at the offending node
    pub element: String,
    pub message: String,
    pub suggestion: Option<String>,
    pub context: Option<String>,
}

impl WcagIssue {
    pub fn new(criterion: &str, severity: Severity, element: &str, message: &str) -> Self {
        WcagIssue {
            criterion: criterion.to_string(),
            severity,
            element: element.to_string(),
            message: message.to_string(),
            suggestion: None,
            context: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }
}

/// Aggregate result of validating one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub file_path: String,
    pub timestamp: String,
    pub total_issues: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub wcag_aa_compliant: bool,
    pub issues: Vec<WcagIssue>,
    /// Issue count per criterion
    pub summary: BTreeMap<String, usize>,
}

impl ValidationReport {
    /// Build a report from the issues of one validation run
    ///
    /// Critical issues always break compliance; in strict mode high
    /// severity issues do as well.
    pub fn from_issues(file_path: &str, issues: Vec<WcagIssue>, strict_mode: bool) -> Self {
        let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();

        let critical_count = count(Severity::Critical);
        let high_count = count(Severity::High);
        let medium_count = count(Severity::Medium);
        let low_count = count(Severity::Low);

        let mut summary: BTreeMap<String, usize> = BTreeMap::new();
        for issue in &issues {
            *summary.entry(issue.criterion.clone()).or_insert(0) += 1;
        }

        ValidationReport {
            file_path: file_path.to_string(),
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            total_issues: issues.len(),
            critical_count,
            high_count,
            medium_count,
            low_count,
            wcag_aa_compliant: critical_count == 0 && (!strict_mode || high_count == 0),
            issues,
            summary,
        }
    }

    /// Whether anything blocks Level A conformance
    pub fn has_blocking_issues(&self) -> bool {
        self.critical_count > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical_count,
            Severity::High => self.high_count,
            Severity::Medium => self.medium_count,
            Severity::Low => self.low_count,
        }
    }

    /// Issues reported against one criterion, in report order
    pub fn issues_for(&self, criterion: &str) -> Vec<&WcagIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.criterion == criterion)
            .collect()
    }

    /// Plain-text report for terminals and logs
    pub fn to_text(&self) -> String {
        let heavy = "=".repeat(REPORT_WIDTH);
        let light = "-".repeat(REPORT_WIDTH);

        let mut lines: Vec<String> = vec![
            heavy.clone(),
            "WCAG 2.2 AA ACCESSIBILITY VALIDATION REPORT".to_string(),
            heavy.clone(),
            format!("File: {}", self.file_path),
            format!("Timestamp: {}", self.timestamp),
            light.clone(),
            format!("Total Issues: {}", self.total_issues),
            format!("  Critical: {}", self.critical_count),
            format!("  High: {}", self.high_count),
            format!("  Medium: {}", self.medium_count),
            format!("  Low: {}", self.low_count),
            light,
            format!(
                "WCAG 2.2 AA Compliant: {}",
                if self.wcag_aa_compliant { "YES" } else { "NO" }
            ),
            heavy,
        ];

        if !self.issues.is_empty() {
            lines.push("\nISSUES FOUND:\n".to_string());
            for (i, issue) in self.issues.iter().enumerate() {
                lines.push(format!(
                    "{}. [{}] WCAG {}",
                    i + 1,
                    issue.severity.as_str().to_uppercase(),
                    issue.criterion
                ));
                lines.push(format!("   Element: {}", issue.element));
                lines.push(format!("   Issue: {}", issue.message));
                if let Some(suggestion) = &issue.suggestion {
                    lines.push(format!("   Fix: {suggestion}"));
                }
                lines.push(String::new());
            }
        }

        lines.join("\n")
    }

    /// Pretty-printed JSON report
    pub fn to_json(&self) -> Result<String, WcagError> {
        serde_json::to_string_pretty(self).map_err(|e| WcagError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_issues() -> Vec<WcagIssue> {
        vec![
            WcagIssue::new("1.1.1", Severity::Critical, "<img>", "Image missing alt attribute")
                .with_suggestion("Add alt"),
            WcagIssue::new("2.4.6", Severity::High, "document", "No h1 element found"),
            WcagIssue::new("1.1.1", Severity::Medium, "<img>", "Empty alt text"),
        ]
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_counts_and_summary() {
        let report = ValidationReport::from_issues("doc.html", sample_issues(), false);

        assert_eq!(report.total_issues, 3);
        assert_eq!(report.critical_count, 1);
        assert_eq!(report.high_count, 1);
        assert_eq!(report.medium_count, 1);
        assert_eq!(report.low_count, 0);
        assert_eq!(report.summary.get("1.1.1"), Some(&2));
        assert_eq!(report.summary.values().sum::<usize>(), report.total_issues);
        assert!(!report.wcag_aa_compliant);
        assert!(report.has_blocking_issues());
        assert_eq!(report.issues_for("2.4.6").len(), 1);
    }

    #[test]
    fn test_strict_mode_compliance() {
        let issues = vec![WcagIssue::new("2.4.6", Severity::High, "document", "No h1")];

        assert!(ValidationReport::from_issues("x", issues.clone(), false).wcag_aa_compliant);
        assert!(!ValidationReport::from_issues("x", issues, true).wcag_aa_compliant);
    }

    #[test]
    fn test_json_shape() {
        let report = ValidationReport::from_issues("doc.html", sample_issues(), false);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        for field in [
            "file_path",
            "timestamp",
            "total_issues",
            "critical_count",
            "high_count",
            "medium_count",
            "low_count",
            "wcag_aa_compliant",
            "issues",
            "summary",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["issues"][0]["severity"], "critical");
        assert_eq!(json["issues"][1]["suggestion"], serde_json::Value::Null);
        assert_eq!(json["summary"]["1.1.1"], 2);
    }

    #[test]
    fn test_text_layout() {
        let report = ValidationReport::from_issues("doc.html", sample_issues(), false);
        let text = report.to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "=".repeat(70));
        assert_eq!(lines[1], "WCAG 2.2 AA ACCESSIBILITY VALIDATION REPORT");
        assert_eq!(lines[3], "File: doc.html");
        assert!(text.contains("  Critical: 1"));
        assert!(text.contains("WCAG 2.2 AA Compliant: NO"));
        assert!(text.contains("ISSUES FOUND:"));
        assert!(text.contains("1. [CRITICAL] WCAG 1.1.1"));
        assert!(text.contains("   Fix: Add alt"));
        assert!(text.contains("2. [HIGH] WCAG 2.4.6"));
    }

    #[test]
    fn test_text_without_issues() {
        let report = ValidationReport::from_issues("clean.html", Vec::new(), true);
        let text = report.to_text();

        assert!(report.wcag_aa_compliant);
        assert!(text.contains("WCAG 2.2 AA Compliant: YES"));
        assert!(!text.contains("ISSUES FOUND"));
    }
}
