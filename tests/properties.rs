//  ██████╗ ██████╗  ██████╗ ██████╗ ███████╗██████╗ ████████╗██╗███████╗███████╗
//  ██╔══██╗██╔══██╗██╔═══██╗██╔══██╗██╔════╝██╔══██╗╚══██╔══╝██║██╔════╝██╔════╝
//  ██████╔╝██████╔╝██║   ██║██████╔╝█████╗  ██████╔╝   ██║   ██║█████╗  ███████╗
//  ██╔═══╝ ██╔══██╗██║   ██║██╔═══╝ ██╔══╝  ██╔══██╗   ██║   ██║██╔══╝  ╚════██║
//  ██║     ██║  ██║╚██████╔╝██║     ███████╗██║  ██║   ██║   ██║███████╗███████║
//  ╚═╝     ╚═╝  ╚═╝ ╚═════╝ ╚═╝     ╚══════╝╚═╝  ╚═╝   ╚═╝   ╚═╝╚══════╝╚══════╝

mod common;

use common::{
    enhance, enhance_with, validate, AssertionHelper, HtmlTestHelper, COMPLIANT_DOCUMENT,
    EXTRACTED_PAPER,
};
use wcagify::enhancer::presentation::build_stylesheet;
use wcagify::{Severity, Validator, WcagOptions};

/// Inputs covering fragments, full documents and awkward landmark setups
const INPUTS: &[&str] = &[
    "",
    "<p>just a fragment</p>",
    "<html><body><h1>X</h1><p>hi</p></body></html>",
    EXTRACTED_PAPER,
    COMPLIANT_DOCUMENT,
    "<body><main><p>1</p></main><main><p>2</p></main><div role=\"main\">3</div></body>",
    "<body><header>H</header><nav>N</nav><section role=\"main\"><h2>Intro</h2><p>a</p></section></body>",
    "<body><h2 id=\"x\">Results</h2><p id=\"x\">a</p><h2>Results</h2><p>b</p><figure id=\"figure-1\"><img src=\"a.png\" alt=\"A\"></figure><img src=\"b.png\" alt=\"B\"></body>",
    "<body><p>Figure 2 and Table 3 are missing.</p><p>a | b | c</p><p>1 | 2 | 3</p></body>",
];

#[test]
fn test_enhancement_is_idempotent() {
    for input in INPUTS {
        let once = enhance(input);
        let twice = enhance(&once);
        assert_eq!(once, twice, "input: {input}");
    }
}

#[test]
fn test_rerun_does_not_duplicate_structure() {
    let mut html = enhance(EXTRACTED_PAPER);
    for _ in 0..3 {
        html = enhance(&html);
    }

    assert_eq!(html.matches("class=\"skip-link\"").count(), 1);
    assert_eq!(html.matches("data-wcag").count(), 1);
    assert_eq!(html.matches("class=\"accessibility-info\"").count(), 1);
    assert_eq!(HtmlTestHelper::count_elements(&html, "main"), 1);
}

#[test]
fn test_exactly_one_main_landmark() {
    for input in INPUTS {
        let html = enhance(input);
        assert_eq!(HtmlTestHelper::main_landmarks(&html), 1, "input: {input}");
        assert_eq!(
            HtmlTestHelper::attribute_values(&html, "main", "id"),
            vec!["main-content".to_string()],
            "input: {input}"
        );
    }
}

#[test]
fn test_ids_are_unique() {
    for input in INPUTS {
        let html = enhance(input);
        assert!(
            HtmlTestHelper::duplicate_ids(&html).is_empty(),
            "duplicates {:?} for input: {input}",
            HtmlTestHelper::duplicate_ids(&html)
        );
    }
}

#[test]
fn test_missing_alt_is_always_critical() {
    let documents = [
        "<img src=\"a.png\">",
        "<html lang=\"en\"><head><title>T</title></head><body><main><h1>T</h1><figure><img src=\"a.png\"></figure></main></body></html>",
        "<p>text <img src=\"inline.png\"> text</p>",
    ];

    for document in documents {
        let report = validate(document);
        AssertionHelper::assert_issue(&report, "1.1.1", Severity::Critical);
        assert!(!report.wcag_aa_compliant);
    }
}

#[test]
fn test_known_good_document_is_compliant() {
    for strict in [false, true] {
        let report = Validator::new(strict).validate(COMPLIANT_DOCUMENT).unwrap();
        assert_eq!(report.critical_count, 0);
        assert!(report.wcag_aa_compliant, "{:#?}", report.issues);
    }
}

#[test]
fn test_critical_defects_break_compliance() {
    let defects = [
        ("lang=\"en\"", ""),
        ("alt=\"Line plot of loss over epochs\"", ""),
        ("<p>Body text.</p>", "<p>Body text.</p><a href=\"/x\"></a>"),
        ("<p>Body text.</p>", "<p>Body text.</p><input type=\"text\">"),
    ];

    assert!(validate(COMPLIANT_DOCUMENT).wcag_aa_compliant);
    for (from, to) in defects {
        let broken = COMPLIANT_DOCUMENT.replacen(from, to, 1);
        let report = validate(&broken);
        assert!(report.critical_count > 0, "defect {from:?} -> {to:?}");
        assert!(!report.wcag_aa_compliant, "defect {from:?} -> {to:?}");
    }
}

#[test]
fn test_injected_stylesheet_passes_css_checks() {
    let variants = [
        WcagOptions::default(),
        WcagOptions {
            dark_mode: false,
            print_styles: false,
            reduced_motion: false,
            ..WcagOptions::default()
        },
        WcagOptions {
            focus_appearance_2px: false,
            focus_not_obscured: false,
            target_size_minimum: false,
            ..WcagOptions::default()
        },
    ];

    for options in variants {
        let css = build_stylesheet(&options);
        let html = enhance_with(options, COMPLIANT_DOCUMENT);
        assert!(html.contains(&css));

        let report = validate(&html);
        for criterion in ["2.4.7", "2.4.11", "2.4.13", "2.5.8"] {
            AssertionHelper::assert_no_issue(&report, criterion);
        }
        assert!(report.wcag_aa_compliant);
    }
}

#[test]
fn test_enhanced_fragments_are_compliant() {
    for input in INPUTS {
        let report = validate(&enhance(input));
        assert_eq!(report.critical_count, 0, "input: {input}\n{:#?}", report.issues);
    }
}

#[test]
fn test_concurrent_enhancers_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| enhance(EXTRACTED_PAPER)))
        .collect();
    let outputs: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
}
