use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use wcagify::core::{
    format_output_path, print_error_message, print_info_message, read_document, WcagError,
};
use wcagify::env::{generate_env_docs, EnvConfig};
use wcagify::parsers::html::get_title;
use wcagify::parsers::parse_html;
use wcagify::{
    build_html, structure_raw_text, Enhancer, PhaseOutcome, Validator,
    WcagOptions,
};

#[derive(Parser)]
#[command(name = "wcagify")]
#[command(version, about = "Make extracted document HTML WCAG 2.2 AA accessible", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite an HTML document for accessibility
    Enhance {
        input: PathBuf,

        /// Output file (%title% and %timestamp% are replaced), stdout if omitted
        #[arg(long, short)]
        output: Option<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Audit an HTML document
    Validate {
        input: PathBuf,

        #[arg(long, short, default_value = "text")]
        format: FormatArg,

        /// HIGH issues also break compliance
        #[arg(long)]
        strict: bool,

        /// Report file, stdout if omitted
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Structure raw extracted text, then enhance it
    Convert {
        input: PathBuf,

        #[arg(long, short)]
        output: Option<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// List the environment variables wcagify reads
    Env,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// TOML options file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    no_skip_link: bool,

    #[arg(long)]
    no_landmarks: bool,

    #[arg(long)]
    no_sections: bool,

    #[arg(long)]
    no_tables: bool,

    #[arg(long)]
    no_references: bool,

    #[arg(long)]
    no_figures: bool,

    #[arg(long)]
    no_math: bool,

    #[arg(long)]
    no_figure_links: bool,

    /// Keep image paths instead of inlining data URLs
    #[arg(long)]
    no_embed_images: bool,

    #[arg(long)]
    no_alt_text: bool,

    #[arg(long)]
    no_dark_mode: bool,

    #[arg(long)]
    no_print_styles: bool,

    #[arg(long)]
    wcag_version: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

impl OptionArgs {
    /// Flags over `--config` over `WCAGIFY_CONFIG` over defaults
    fn resolve(&self, env: &EnvConfig) -> Result<WcagOptions, WcagError> {
        let config = self.config.clone().or_else(|| env.config_path.clone());

        let mut options = match &config {
            Some(path) => {
                debug!(path = %path.display(), "loading options file");
                WcagOptions::load(path)?
            }
            None => WcagOptions {
                wcag_version: env.wcag_version.clone(),
                ..WcagOptions::default()
            },
        };

        let disabled = [
            (self.no_skip_link, &mut options.add_skip_link),
            (self.no_landmarks, &mut options.add_aria_landmarks),
            (self.no_sections, &mut options.use_sections),
            (self.no_tables, &mut options.detect_tables),
            (self.no_references, &mut options.detect_references),
            (self.no_figures, &mut options.enhance_figures),
            (self.no_math, &mut options.enhance_math),
            (self.no_figure_links, &mut options.create_figure_links),
            (self.no_embed_images, &mut options.embed_images),
            (self.no_alt_text, &mut options.generate_alt_text),
            (self.no_dark_mode, &mut options.dark_mode),
            (self.no_print_styles, &mut options.print_styles),
        ];
        for (flag, option) in disabled {
            if flag {
                *option = false;
            }
        }

        if let Some(version) = &self.wcag_version {
            options.wcag_version = version.clone();
        }
        if let Some(title) = &self.title {
            options.document_title = title.clone();
        }
        if let Some(author) = &self.author {
            options.document_author = author.clone();
        }
        if let Some(description) = &self.description {
            options.document_description = description.clone();
        }

        options.validate()?;
        Ok(options)
    }
}

fn init_logging(verbose: bool, env: &EnvConfig) {
    let level = if verbose { "debug" } else { env.log_level.as_str() };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("wcagify={level}")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn build_enhancer(options: WcagOptions, input: &Path) -> Enhancer {
    let asset_root = input
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Enhancer::new(options).with_asset_root(asset_root)
}

fn document_title(html: &str) -> Option<String> {
    let dom = parse_html(html).ok()?;
    get_title(&dom.document).filter(|title| !title.trim().is_empty())
}

fn write_output(content: &str, output: Option<&str>, title: Option<&str>) -> Result<(), WcagError> {
    match output {
        Some(template) => {
            let path = format_output_path(template, title);
            fs::write(&path, content)?;
            debug!(path = %path, "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn enhance_document(
    html: &str,
    input: &Path,
    options: &OptionArgs,
    env: &EnvConfig,
    output: Option<&str>,
) -> Result<String, WcagError> {
    let enhancer = build_enhancer(options.resolve(env)?, input);
    let (enhanced, report) = enhancer.enhance_with_report(html)?;

    for (phase, outcome) in &report.outcomes {
        if let PhaseOutcome::Failed(reason) = outcome {
            warn!(phase = phase.name(), reason = %reason, "phase rolled back");
        }
    }

    write_output(&enhanced, output, document_title(&enhanced).as_deref())?;
    Ok(enhanced)
}

fn run(cli: Cli, env: &EnvConfig) -> Result<i32, WcagError> {
    match cli.command {
        Commands::Enhance { input, output, options } => {
            let html = read_document(&input)?;
            enhance_document(&html, &input, &options, env, output.as_deref())?;
            Ok(0)
        }

        Commands::Validate { input, format, strict, output } => {
            let strict = strict || env.strict;
            let report = Validator::new(strict).validate_file(&input)?;

            let rendered = match format {
                FormatArg::Text => report.to_text(),
                FormatArg::Json => report.to_json()?,
            };
            write_output(&rendered, output.as_deref(), None)?;

            Ok(if report.wcag_aa_compliant { 0 } else { 1 })
        }

        Commands::Convert { input, output, options } => {
            let raw = read_document(&input)?;
            let fallback_title = input.file_stem().and_then(|stem| stem.to_str());
            let structure = structure_raw_text(&raw, fallback_title);
            let semantic = build_html(&structure);

            let enhanced = enhance_document(&semantic, &input, &options, env, output.as_deref())?;

            let report = Validator::default().validate(&enhanced)?;
            let summary = format!(
                "Validation: {} issues ({} critical, {} high), WCAG 2.2 AA compliant: {}",
                report.total_issues,
                report.critical_count,
                report.high_count,
                if report.wcag_aa_compliant { "yes" } else { "no" }
            );
            if output.is_some() {
                print_info_message(&summary);
            } else {
                eprintln!("{summary}");
            }
            Ok(0)
        }

        Commands::Env => {
            print_info_message(generate_env_docs().trim_end());
            Ok(0)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(error) => {
            print_error_message(&format!("Error: {error}"));
            process::exit(2);
        }
    };
    init_logging(cli.verbose, &env);

    match run(cli, &env) {
        Ok(code) => process::exit(code),
        Err(error) => {
            print_error_message(&format!("Error: {error}"));
            process::exit(2);
        }
    }
}
