//   ██████╗██╗     ██╗
//  ██╔════╝██║     ██║
//  ██║     ██║     ██║
//  ██║     ██║     ██║
//  ╚██████╗███████╗██║
//   ╚═════╝╚══════╝╚═╝

use std::fs;

use assert_cmd::Command;
use tempfile::TempDir;

const PNG_PIXEL: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR";

fn wcagify() -> Command {
    let mut command = Command::cargo_bin("wcagify").unwrap();
    command
        .env("NO_COLOR", "1")
        .env_remove("WCAGIFY_CONFIG")
        .env_remove("WCAGIFY_STRICT")
        .env_remove("WCAGIFY_LOG_LEVEL")
        .env_remove("WCAGIFY_WCAG_VERSION");
    command
}

fn write(dir: &TempDir, name: &str, content: &[u8]) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn stdout_of(command: &mut Command) -> String {
    let output = command.output().unwrap();
    String::from_utf8(output.stdout).unwrap()
}

#[cfg(test)]
mod passing {
    use super::*;

    #[test]
    fn enhance_to_stdout() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "paper.html", b"<h1>Paper</h1><p>Body.</p>");

        let html = stdout_of(wcagify().args(["enhance", input.as_str()]));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<main id=\"main-content\" role=\"main\">"));
        assert!(html.contains("<style data-wcag=\"true\">"));
    }

    #[test]
    fn enhance_embeds_local_images() {
        let dir = TempDir::new().unwrap();
        write(&dir, "dot.png", PNG_PIXEL);
        let input = write(&dir, "paper.html", b"<h1>P</h1><img src=\"dot.png\" alt=\"A dot\">");

        let html = stdout_of(wcagify().args(["enhance", input.as_str()]));
        assert!(html.contains("src=\"data:image/png;base64,"));

        let html = stdout_of(wcagify().args(["enhance", input.as_str(), "--no-embed-images"]));
        assert!(html.contains("src=\"dot.png\""));
    }

    #[test]
    fn enhance_output_path_uses_title() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "paper.html",
            b"<html><head><title>My Paper</title></head><body><h1>P</h1></body></html>",
        );
        let template = dir.path().join("%title%.%extension%").display().to_string();

        wcagify()
            .args(["enhance", input.as_str(), "-o", template.as_str()])
            .assert()
            .success();

        let written = fs::read_to_string(dir.path().join("My Paper.html")).unwrap();
        assert!(written.contains("data-wcag"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "options.toml", b"add_skip_link = true\nwcag_version = \"2.1\"\n");
        let input = write(&dir, "paper.html", b"<h1>P</h1>");

        let html = stdout_of(wcagify().args(["enhance", input.as_str(), "--config", config.as_str(), "--no-skip-link"]));

        assert!(!html.contains("skip-link\">"));
        assert!(html.contains("/* WCAG 2.1 AA accessibility stylesheet */"));
    }

    #[test]
    fn config_from_environment() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "options.toml", b"dark_mode = false\n");
        let input = write(&dir, "paper.html", b"<h1>P</h1>");

        let html = stdout_of(wcagify().env("WCAGIFY_CONFIG", config.as_str()).args(["enhance", input.as_str()]));
        assert!(!html.contains("prefers-color-scheme"));

        let html = stdout_of(wcagify().args(["enhance", input.as_str()]));
        assert!(html.contains("prefers-color-scheme"));
    }

    #[test]
    fn validate_compliant_document_as_json() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "good.html",
            b"<html lang=\"en\"><head><title>Good</title></head>\
              <body><main><h1>Good</h1><p>Fine.</p></main></body></html>",
        );

        let output = wcagify()
            .args(["validate", input.as_str(), "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["wcag_aa_compliant"], serde_json::Value::Bool(true));
        assert_eq!(report["critical_count"], 0);
        assert!(report["file_path"].as_str().unwrap().ends_with("good.html"));
    }

    #[test]
    fn convert_raw_text() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "notes.txt",
            b"Deep Learning for Parsing\n\n1. Introduction\n\nParsing is a core task.\n\nReferences\n\n[1] Smith, J. Parsing.",
        );
        let out = dir.path().join("notes.html");

        let summary = stdout_of(wcagify().args(["convert", input.as_str(), "-o", out.display().to_string().as_str()]));
        assert!(summary.contains("WCAG 2.2 AA compliant: yes"));

        let html = fs::read_to_string(&out).unwrap();
        assert!(html.contains("<h1>Deep Learning for Parsing</h1>"));
        assert!(html.contains("<li id=\"ref-1\" value=\"1\">Smith, J. Parsing.</li>"));
    }

    #[test]
    fn env_lists_variables() {
        let text = stdout_of(wcagify().arg("env"));

        assert!(text.starts_with("# Environment Variables"));
        for name in ["WCAGIFY_LOG_LEVEL", "WCAGIFY_STRICT", "WCAGIFY_CONFIG", "WCAGIFY_WCAG_VERSION"] {
            assert!(text.contains(&format!("`{name}`")), "{name}");
        }
    }
}

#[cfg(test)]
mod failing {
    use super::*;

    #[test]
    fn validate_exits_nonzero_when_not_compliant() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "bad.html", b"<html><body><h1>T</h1><img src=\"a.png\"></body></html>");

        let output = wcagify().args(["validate", input.as_str()]).output().unwrap();
        assert_eq!(output.status.code(), Some(1));

        let text = String::from_utf8(output.stdout).unwrap();
        assert!(text.contains("WCAG 2.2 AA Compliant: NO"));
        assert!(text.contains("Image missing alt attribute"));
    }

    #[test]
    fn strict_environment_counts_high_issues() {
        let dir = TempDir::new().unwrap();
        // no <title> is a HIGH issue only
        let input = write(
            &dir,
            "untitled.html",
            b"<html lang=\"en\"><body><main><h1>T</h1></main></body></html>",
        );

        wcagify().args(["validate", input.as_str()]).assert().success();
        wcagify()
            .env("WCAGIFY_STRICT", "true")
            .args(["validate", input.as_str()])
            .assert()
            .code(1);
    }

    #[test]
    fn missing_input_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.html");

        let output = wcagify()
            .args(["enhance", missing.display().to_string().as_str()])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8(output.stderr).unwrap().starts_with("Error: I/O error"));
    }

    #[test]
    fn invalid_config_file() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "options.toml", b"image_quality = 0\n");
        let input = write(&dir, "paper.html", b"<h1>P</h1>");

        let output = wcagify()
            .args(["enhance", input.as_str(), "--config", config.as_str()])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8(output.stderr)
            .unwrap()
            .contains("Invalid configuration"));
    }

    #[test]
    fn malformed_environment_variable() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "paper.html", b"<h1>P</h1>");

        let output = wcagify()
            .env("WCAGIFY_STRICT", "sometimes")
            .args(["enhance", input.as_str()])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8(output.stderr)
            .unwrap()
            .starts_with("Error: Environment variable 'WCAGIFY_STRICT'"));
    }
}
