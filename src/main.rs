//! `glrfill` — fill a General Loss Report template from PDF inspection
//! reports.
//!
//! Reads a `.docx` template and one or more evidence PDFs, resolves every
//! placeholder with a single language model call, and writes the completed
//! document. The discovered placeholders and resolved mapping are printed
//! to stdout; when stdout is a terminal the mapping is pretty-printed via
//! `bat`.

mod render;

use glrfill::config::{self, Config};
use glrfill::{docx, pipeline, placeholder, EvidenceFile, PlaceholderStyle, Request, Strategy};
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::path::Path;
use std::process;

const USAGE: &str = "\
glrfill - fill a General Loss Report template from PDF inspection reports

Usage: glrfill [OPTIONS] -t TEMPLATE.docx REPORT.pdf...
       glrfill --scan -t TEMPLATE.docx

Options:
  -t, --template FILE   Template document (.docx)
  -o, --output FILE     Where to write the filled document
                        (default: Completed_GLR.docx)
  -k, --api-key KEY     Gemini API key (default: $GEMINI_API_KEY)
  -m, --model NAME      Model identifier (default: gemini-2.5-flash)
      --literal         Treat template text itself as the placeholders
                        instead of [FIELD_NAME] tokens
      --attach          Send the PDFs to the model instead of extracted text
      --timeout SECS    Upper bound on the model call (default: 120)
      --scan            Only list the template's placeholders
  -p, --plain           Plain JSON output (no colors, no decorations)
  -h, --help            Show this help

Environment: GLR_MODEL, GLR_API_BASE, GLR_TIMEOUT_SECS, GLR_PLACEHOLDERS
(delimited|literal), GLR_STRATEGY (text|attach), RUST_LOG.";

/// Maximum input file size (256 MiB). Prevents accidental OOM from
/// huge files or zip bombs.
const MAX_INPUT_SIZE: usize = 256 * 1024 * 1024;

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    template: Option<String>,
    output: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Option<String>,
    literal: bool,
    attach: bool,
    scan: bool,
    plain: bool,
    reports: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(msg) => {
            eprintln!("glrfill: {msg}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    if let Err(msg) = run(&args) {
        eprintln!("glrfill: {msg}");
        process::exit(1);
    }
}

/// Parse flags. Returns `Ok(None)` when help was requested.
fn parse_args<I: Iterator<Item = String>>(mut argv: I) -> Result<Option<Args>, String> {
    let mut args = Args::default();

    while let Some(arg) = argv.next() {
        let mut value = |flag: &str| {
            argv.next()
                .ok_or_else(|| format!("option {flag} requires a value"))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-t" | "--template" => args.template = Some(value(&arg)?),
            "-o" | "--output" => args.output = Some(value(&arg)?),
            "-k" | "--api-key" => args.api_key = Some(value(&arg)?),
            "-m" | "--model" => args.model = Some(value(&arg)?),
            "--timeout" => args.timeout = Some(value(&arg)?),
            "--literal" => args.literal = true,
            "--attach" => args.attach = true,
            "--scan" => args.scan = true,
            "-p" | "--plain" => args.plain = true,
            s if s.starts_with('-') && s.len() > 1 => {
                return Err(format!("unknown option: {s}"));
            }
            _ => args.reports.push(arg),
        }
    }

    if args.template.is_none() {
        return Err("no template given (use -t TEMPLATE.docx)".into());
    }
    Ok(Some(args))
}

/// Apply command-line overrides on top of `config`.
fn build_config(args: &Args, mut config: Config) -> Result<Config, String> {
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(secs) = &args.timeout {
        config.timeout = config::parse_timeout(secs).map_err(|e| format!("--timeout: {e}"))?;
    }
    if args.literal {
        config.placeholder_style = PlaceholderStyle::Literal;
    }
    if args.attach {
        config.strategy = Strategy::AttachPdf;
    }
    Ok(config)
}

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    let buf = std::fs::read(path).map_err(|e| format!("{path}: {e}"))?;
    if buf.len() > MAX_INPUT_SIZE {
        #[allow(clippy::cast_precision_loss)] // only used in error message
        let size_mib = buf.len() as f64 / (1024.0 * 1024.0);
        return Err(format!(
            "{path}: too large ({size_mib:.1} MiB, max {} MiB)",
            MAX_INPUT_SIZE / (1024 * 1024),
        ));
    }
    Ok(buf)
}

fn run(args: &Args) -> Result<(), String> {
    let config = build_config(args, Config::from_env()?)?;
    let template_path = args.template.as_deref().unwrap_or_default();
    let template = read_input(template_path)?;

    if args.scan {
        let parsed = docx::read_template(&template).map_err(|e| format!("{template_path}: {e}"))?;
        let keys = placeholder::scan(&parsed, config.placeholder_style);
        print!("{}", render::placeholder_list(&keys));
        return Ok(());
    }

    let mut evidence = Vec::with_capacity(args.reports.len());
    for path in &args.reports {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        evidence.push(EvidenceFile {
            name,
            data: read_input(path)?,
        });
    }

    let credential = args
        .api_key
        .clone()
        .or_else(|| std::env::var(config::API_KEY_ENV).ok())
        .unwrap_or_default();

    let request = Request {
        template,
        evidence,
        credential,
    };
    let report = pipeline::run(&request, &config).map_err(|e| e.to_string())?;

    for warning in &report.warnings {
        eprintln!("glrfill: warning: {warning}");
    }

    print!("{}", render::placeholder_list(&report.placeholders));
    let pretty = !args.plain && io::stdout().is_terminal();
    render::print_mapping(&report.mapping, pretty).map_err(|e| e.to_string())?;
    io::stdout().flush().map_err(|e| e.to_string())?;

    let output = args.output.as_deref().unwrap_or(glrfill::OUTPUT_FILENAME);
    std::fs::write(output, &report.document).map_err(|e| format!("{output}: {e}"))?;
    eprintln!("glrfill: wrote {output} ({})", glrfill::OUTPUT_MIME);

    Ok(())
}
