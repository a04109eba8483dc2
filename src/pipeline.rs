//! End-to-end run: template + evidence PDFs + credential in, filled
//! document out.
//!
//! Missing inputs and service failures abort the run before any document is
//! produced. Unreadable evidence and unusable model output only add
//! warnings to the [`Report`].

use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::docx;
use crate::error::{GlrError, Result};
use crate::extract::{self, ExtractionRequest};
use crate::model::{Attachment, GeminiClient, Model, PDF_MIME};
use crate::pdf;
use crate::placeholder::{self, FieldMapping};
use crate::prompt::Strategy;
use crate::style;

/// Fixed download name of the filled document.
pub const OUTPUT_FILENAME: &str = "Completed_GLR.docx";
/// MIME type of the filled document.
pub const OUTPUT_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// One uploaded evidence PDF.
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    /// Display name; defaults to `report-N.pdf`.
    pub name: Option<String>,
    pub data: Vec<u8>,
}

impl EvidenceFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            data,
        }
    }
}

/// Everything the caller supplies for a run.
#[derive(Debug, Clone)]
pub struct Request {
    pub template: Vec<u8>,
    pub evidence: Vec<EvidenceFile>,
    pub credential: String,
}

/// Everything the caller gets back.
#[derive(Debug, Clone)]
pub struct Report {
    /// Placeholders discovered in the template.
    pub placeholders: BTreeSet<String>,
    /// The mapping applied to the template.
    pub mapping: FieldMapping,
    /// The filled `.docx` bytes.
    pub document: Vec<u8>,
    /// Recoverable problems encountered along the way.
    pub warnings: Vec<String>,
}

/// Run the pipeline against the Gemini service.
pub fn run(request: &Request, config: &Config) -> Result<Report> {
    validate(request)?;
    let client = GeminiClient::new(&request.credential, config)?;
    run_with_model(request, config, &client)
}

/// Run the pipeline against any [`Model`].
pub fn run_with_model(request: &Request, config: &Config, model: &dyn Model) -> Result<Report> {
    validate(request)?;
    if !docx::is_docx(&request.template) {
        return Err(GlrError::Document("template is not a .docx document".into()));
    }

    let template = docx::read_template(&request.template)?;
    let placeholders = placeholder::scan(&template, config.placeholder_style);
    let excerpt = style::excerpt(&template);
    info!(
        "template: {} block(s), {} placeholder(s)",
        template.blocks.len(),
        placeholders.len()
    );
    if placeholders.is_empty() {
        warn!("no placeholders found in template");
    }

    let names = evidence_names(&request.evidence);
    let mut warnings = Vec::new();
    let mut evidence = BTreeMap::new();
    let mut attachments = Vec::new();

    match config.strategy {
        Strategy::InlineText => {
            for (name, file) in names.iter().zip(&request.evidence) {
                let text = pdf::extract_text(name, &file.data);
                if text.is_empty() {
                    warnings.push(format!("{name}: no text could be extracted"));
                }
                evidence.insert(name.clone(), text);
            }
        }
        Strategy::AttachPdf => {
            for (name, file) in names.iter().zip(&request.evidence) {
                if !pdf::is_pdf(&file.data) {
                    warnings.push(format!("{name}: not a PDF, attached anyway"));
                }
                attachments.push(Attachment {
                    name: name.clone(),
                    mime_type: PDF_MIME,
                    data: file.data.clone(),
                });
            }
        }
    }

    let extraction = extract::extract(
        model,
        &ExtractionRequest {
            placeholders: &placeholders,
            evidence: &evidence,
            style_excerpt: &excerpt,
            placeholder_style: config.placeholder_style,
            strategy: config.strategy,
            attachments: &attachments,
        },
    )?;
    warnings.extend(extraction.warning);

    let document = docx::fill_package(&request.template, &extraction.mapping, config.placeholder_style)?;

    Ok(Report {
        placeholders,
        mapping: extraction.mapping,
        document,
        warnings,
    })
}

fn validate(request: &Request) -> Result<()> {
    if request.template.is_empty() {
        return Err(GlrError::MissingInput("template"));
    }
    if request.evidence.is_empty() {
        return Err(GlrError::MissingInput("evidence PDFs"));
    }
    if request.credential.trim().is_empty() {
        return Err(GlrError::MissingInput("API key"));
    }
    Ok(())
}

/// Display names for the evidence files, made unique with ` (N)` suffixes.
fn evidence_names(files: &[EvidenceFile]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let base = file
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map_or_else(|| format!("report-{}.pdf", i + 1), String::from);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base} ({count})")
            }
        })
        .collect()
}
