//! Prompt construction for the extraction call.
//!
//! Both integration strategies share the same output contract: a bare JSON
//! object mapping each placeholder to a grounded string value, empty when
//! the evidence says nothing. With [`Strategy::InlineText`] the evidence
//! text is embedded in the prompt; with [`Strategy::AttachPdf`] the PDFs are
//! attached to the request and the model reads them itself.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::str::FromStr;

use crate::placeholder::PlaceholderStyle;

/// Date format every extracted date is normalised to.
pub const DATE_FORMAT: &str = "MM/DD/YYYY";

/// How evidence reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Extract PDF text locally and send it inline.
    #[default]
    InlineText,
    /// Attach the raw PDFs to the request.
    AttachPdf,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "inline" => Ok(Self::InlineText),
            "attach" | "pdf" => Ok(Self::AttachPdf),
            other => Err(format!(
                "unknown strategy '{other}' (expected text or attach)"
            )),
        }
    }
}

const PREAMBLE: &str = "You are an expert insurance adjuster assistant completing a General Loss Report (GLR) \
from photo and inspection reports.";

/// Everything the prompt is built from.
pub struct PromptInput<'a> {
    pub placeholders: &'a BTreeSet<String>,
    /// Evidence text by document name. Empty for attached-PDF prompts.
    pub evidence: &'a BTreeMap<String, String>,
    pub style_excerpt: &'a str,
    pub placeholder_style: PlaceholderStyle,
    pub strategy: Strategy,
}

/// Build the full prompt text.
pub fn build(input: &PromptInput<'_>) -> String {
    let mut out = String::new();
    out.push_str(PREAMBLE);
    out.push_str("\n\n");

    match input.placeholder_style {
        PlaceholderStyle::Delimited => {
            out.push_str("Fill in the following template fields:\n");
            for key in input.placeholders {
                let _ = writeln!(out, "- {key}");
            }
        }
        PlaceholderStyle::Literal => {
            out.push_str(
                "The template below has no explicit placeholders. Identify the fields that need \
                 to be filled (e.g. names, dates, claim numbers, damage descriptions). Use as each \
                 key the exact text from the template that should be replaced.\n",
            );
        }
    }

    out.push_str("\n## Template (reference for tone and format)\n\n");
    out.push_str(input.style_excerpt);
    out.push_str("\n\n");

    match input.strategy {
        Strategy::InlineText => {
            out.push_str("## Evidence\n\n");
            for (name, text) in input.evidence {
                let _ = writeln!(out, "### {name}\n");
                if text.is_empty() {
                    out.push_str("(no extractable text)\n\n");
                } else {
                    out.push_str(text);
                    out.push_str("\n\n");
                }
            }
        }
        Strategy::AttachPdf => {
            out.push_str(
                "## Evidence\n\nThe inspection reports are attached as PDF files. Read them \
                 fully, including tables and photo captions.\n\n",
            );
        }
    }

    out.push_str("## Rules\n\n");
    match input.placeholder_style {
        PlaceholderStyle::Delimited => out.push_str(
            "1. Return ONLY a JSON object whose keys are exactly the field names listed above \
             (without brackets) and whose values are strings.\n",
        ),
        PlaceholderStyle::Literal => out.push_str(
            "1. Return ONLY a JSON object whose keys are exact substrings of the template and \
             whose values are strings.\n",
        ),
    }
    out.push_str("2. Use only facts stated in the evidence. Never invent values.\n");
    out.push_str("3. If the evidence does not support a field, use an empty string \"\".\n");
    let _ = writeln!(out, "4. Write every date as {DATE_FORMAT}.");
    out.push_str("5. Match the tone and format of the template text.\n");
    out.push_str("6. Do not wrap the JSON in markdown code fences such as ```json.\n");

    out
}
