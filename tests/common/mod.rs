// Shared helpers for the integration tests

#![allow(dead_code)]

use std::collections::HashMap;

use markup5ever_rcdom::RcDom;

use wcagify::parsers::html::{collect_ids, find_elements, get_node_attr, parse_html};
use wcagify::validator::count_main_landmarks;
use wcagify::{Enhancer, Severity, ValidationReport, Validator, WcagOptions};

/// A document that passes every check
pub const COMPLIANT_DOCUMENT: &str = "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\"><title>Good Paper</title></head>\
<body><main role=\"main\"><h1>Good Paper</h1>\
<p>Body text.</p><img src=\"plot.png\" alt=\"Line plot of loss over epochs\">\
</main></body></html>";

/// Loosely structured extractor output: no head, no landmarks
pub const EXTRACTED_PAPER: &str = "<h1>Parsing Papers</h1>\
<p>As Figure 1 shows, structure can be recovered.</p>\
<h2>Method</h2>\
<p>A. Data Collection</p>\
<p>We gathered $x^2$ samples.</p>\
<p>Name\tAge</p><p>Ann\t30</p>\
<img src=\"missing.png\" alt=\"Diagram of the pipeline\">\
<h2>References</h2>\
<p>[1] Smith, J.</p><p>[2] Doe, A.</p>";

pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_test_dom(html: &str) -> RcDom {
        parse_html(html).expect("test markup parses")
    }

    pub fn count_elements(html: &str, name: &str) -> usize {
        let dom = Self::create_test_dom(html);
        find_elements(&dom.document, &[name]).len()
    }

    pub fn main_landmarks(html: &str) -> usize {
        let dom = Self::create_test_dom(html);
        count_main_landmarks(&dom.document)
    }

    /// Ids that occur more than once
    pub fn duplicate_ids(html: &str) -> Vec<String> {
        let dom = Self::create_test_dom(html);
        let mut counts: HashMap<String, usize> = HashMap::new();
        for id in collect_ids(&dom.document) {
            *counts.entry(id).or_default() += 1;
        }
        let mut duplicates: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();
        duplicates.sort();
        duplicates
    }

    pub fn attribute_values(html: &str, name: &str, attribute: &str) -> Vec<String> {
        let dom = Self::create_test_dom(html);
        find_elements(&dom.document, &[name])
            .iter()
            .filter_map(|node| get_node_attr(node, attribute))
            .collect()
    }
}

/// Enhancer without an asset root, so images are never read from disk
pub fn enhance(html: &str) -> String {
    enhance_with(WcagOptions::default(), html)
}

pub fn enhance_with(options: WcagOptions, html: &str) -> String {
    Enhancer::new(options)
        .enhance(html)
        .expect("enhancement succeeds")
}

pub fn validate(html: &str) -> ValidationReport {
    Validator::new(false).validate(html).expect("validation succeeds")
}

pub struct AssertionHelper;

impl AssertionHelper {
    pub fn assert_issue(report: &ValidationReport, criterion: &str, severity: Severity) {
        assert!(
            report
                .issues
                .iter()
                .any(|issue| issue.criterion == criterion && issue.severity == severity),
            "expected a {} issue for {}, got {:#?}",
            severity.as_str(),
            criterion,
            report.issues
        );
    }

    pub fn assert_no_issue(report: &ValidationReport, criterion: &str) {
        assert!(
            report.issues_for(criterion).is_empty(),
            "unexpected issues for {}: {:#?}",
            criterion,
            report.issues_for(criterion)
        );
    }
}
