//  ███████╗ ██████╗███████╗███╗   ██╗ █████╗ ██████╗ ██╗ ██████╗ ███████╗
//  ██╔════╝██╔════╝██╔════╝████╗  ██║██╔══██╗██╔══██╗██║██╔═══██╗██╔════╝
//  ███████╗██║     █████╗  ██╔██╗ ██║███████║██████╔╝██║██║   ██║███████╗
//  ╚════██║██║     ██╔══╝  ██║╚██╗██║██╔══██║██╔══██╗██║██║   ██║╚════██║
//  ███████║╚██████╗███████╗██║ ╚████║██║  ██║██║  ██║██║╚██████╔╝███████║
//  ╚══════╝ ╚═════╝╚══════╝╚═╝  ╚═══╝╚═╝  ╚═╝╚═╝  ╚═╝╚═╝ ╚═════╝ ╚══════╝

mod common;

use common::{enhance, validate, AssertionHelper, HtmlTestHelper, EXTRACTED_PAPER};
use wcagify::{enhance_html, Severity, Validator, WcagOptions};

#[test]
fn test_missing_lang_and_alt_are_critical() {
    let report = validate("<html><body><h1>T</h1><img src=\"a.png\"></body></html>");

    let critical = |criterion: &str| {
        report
            .issues_for(criterion)
            .into_iter()
            .filter(|issue| issue.severity == Severity::Critical)
            .count()
    };
    assert_eq!(critical("3.1.1"), 1);
    assert_eq!(critical("1.1.1"), 1);
    assert_eq!(report.critical_count, 2);
    assert!(!report.wcag_aa_compliant);
}

#[test]
fn test_enhancement_adds_skip_link_main_and_style() {
    let html = enhance("<html><body><h1>X</h1><p>hi</p></body></html>");

    assert!(html.contains("<a href=\"#main-content\" class=\"skip-link\">Skip to main content</a>"));
    assert!(html.contains("<main id=\"main-content\" role=\"main\"><h1>X</h1><p>hi</p></main>"));
    assert!(html.contains("<style data-wcag=\"true\">"));
    assert!(html.contains("<html lang=\"en\">"));
    assert!(html.contains("<footer role=\"contentinfo\"><div class=\"accessibility-info\">"));
}

#[test]
fn test_references_become_ordered_list() {
    let html = enhance("<h2>References</h2><p>[1] Smith, J.</p><p>[2] Doe, A.</p>");

    assert!(html.contains(
        "<ol><li id=\"ref-1\" value=\"1\">Smith, J.</li><li id=\"ref-2\" value=\"2\">Doe, A.</li></ol>"
    ));
    assert!(!html.contains("<p>[1] Smith"));
    assert!(!html.contains("<p>[2] Doe"));
}

#[test]
fn test_tab_separated_paragraphs_become_table() {
    let html = enhance("<p>Name\tAge</p><p>Ann\t30</p>");

    assert!(html.contains(
        "<thead><tr><th scope=\"col\">Name</th><th scope=\"col\">Age</th></tr></thead>"
    ));
    assert!(html.contains("<tbody><tr><td>Ann</td><td>30</td></tr></tbody>"));
    assert_eq!(HtmlTestHelper::count_elements(&html, "table"), 1);
    assert_eq!(HtmlTestHelper::count_elements(&html, "tr"), 2);
}

#[test]
fn test_extracted_paper_end_to_end() {
    let html = enhance(EXTRACTED_PAPER);

    assert!(html.contains("<h3 id=\"a-data-collection\">A. Data Collection</h3>"));
    assert!(html.contains("<a href=\"#figure-1\">Figure 1</a>"));
    assert!(html.contains("<math"));
    assert!(html.contains("<msup><mi>x</mi><mn>2</mn></msup>"));
    assert!(html.contains("<li id=\"ref-2\" value=\"2\">Doe, A.</li>"));
    assert!(html.contains("<title>Parsing Papers</title>"));
    assert_eq!(HtmlTestHelper::count_elements(&html, "table"), 1);
    assert_eq!(HtmlTestHelper::count_elements(&html, "figure"), 1);

    let report = validate(&html);
    assert_eq!(report.critical_count, 0, "{:#?}", report.issues);
    assert_eq!(report.high_count, 0, "{:#?}", report.issues);
    assert!(report.wcag_aa_compliant);
    AssertionHelper::assert_no_issue(&report, "2.4.13");
    AssertionHelper::assert_no_issue(&report, "2.5.8");
}

#[test]
fn test_validator_audits_third_party_markup() {
    let html = "<!DOCTYPE html><html lang=\"en\"><head><title>Shop</title>\
        <style>.bar { position: fixed; top: 0 } a:focus { outline: 1px solid } .btn-xs { padding: 0 }</style>\
        </head><body><header>Logo</header><main><h1>Shop</h1>\
        <a href=\"/a\">click here</a><a href=\"/b\"></a>\
        <input type=\"text\" id=\"q\"><table><tr><td>1</td></tr></table>\
        </main></body></html>";
    let report = Validator::new(true).validate(html).unwrap();

    AssertionHelper::assert_issue(&report, "2.4.4", Severity::High);
    AssertionHelper::assert_issue(&report, "2.4.4", Severity::Critical);
    AssertionHelper::assert_issue(&report, "1.3.1", Severity::High);
    AssertionHelper::assert_issue(&report, "2.4.11", Severity::Medium);
    AssertionHelper::assert_issue(&report, "2.4.13", Severity::High);
    AssertionHelper::assert_issue(&report, "2.5.8", Severity::Medium);
    AssertionHelper::assert_issue(&report, "2.4.1", Severity::Medium);
    assert!(report.critical_count >= 2);
    assert!(!report.wcag_aa_compliant);
}

#[test]
fn test_library_enhancement_fills_missing_alt_text() {
    let html = enhance_html(
        "<h1>Results</h1><figure><img src=\"a.png\"><figcaption>Figure 1: Loss curve</figcaption></figure>\
         <figure><img src=\"b.png\"></figure>",
        &WcagOptions::default(),
    )
    .unwrap();

    assert_eq!(
        HtmlTestHelper::attribute_values(&html, "img", "alt"),
        vec!["Loss curve".to_string(), "Figure 2".to_string()]
    );

    let report = validate(&html);
    AssertionHelper::assert_no_issue(&report, "1.1.1");
    assert_eq!(report.critical_count, 0, "{:#?}", report.issues);
}

#[test]
fn test_main_content_id_is_reserved_for_main() {
    let html = enhance(
        "<html><body><h1>Paper</h1><p id=\"main-content\">dup</p>\
         <p>See <a href=\"#main-content\">above</a>.</p></body></html>",
    );

    assert_eq!(
        HtmlTestHelper::attribute_values(&html, "main", "id"),
        vec!["main-content".to_string()]
    );
    assert!(html.contains("<a href=\"#main-content\" class=\"skip-link\">"));
    assert!(html.contains("<p id=\"main-content-1\">dup</p>"));
    assert!(HtmlTestHelper::duplicate_ids(&html).is_empty());
    assert_eq!(enhance(&html), html);
}
