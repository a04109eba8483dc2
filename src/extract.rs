//! Extraction client: one model call that resolves every placeholder.
//!
//! The reply is parsed defensively (see [`crate::response`]). A reply that
//! cannot be parsed, an answer without usable text, or a call that times
//! out degrades to the fallback mapping and is reported as a warning. Any
//! other service failure aborts.

use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{GlrError, Result};
use crate::model::{Attachment, Model, ModelRequest};
use crate::placeholder::{FieldMapping, PlaceholderStyle};
use crate::prompt::{self, PromptInput, Strategy};
use crate::response::{self, Repair};

/// Inputs to one extraction call.
pub struct ExtractionRequest<'a> {
    pub placeholders: &'a BTreeSet<String>,
    /// Evidence text by document name, failed documents included as "".
    pub evidence: &'a BTreeMap<String, String>,
    pub style_excerpt: &'a str,
    pub placeholder_style: PlaceholderStyle,
    pub strategy: Strategy,
    /// Raw PDFs, sent only with [`Strategy::AttachPdf`].
    pub attachments: &'a [Attachment],
}

/// The resolved mapping plus any recoverable problem worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub mapping: FieldMapping,
    pub warning: Option<String>,
}

/// Resolve placeholders with exactly one call to `model`.
pub fn extract(model: &dyn Model, request: &ExtractionRequest<'_>) -> Result<Extraction> {
    let prompt = prompt::build(&PromptInput {
        placeholders: request.placeholders,
        evidence: request.evidence,
        style_excerpt: request.style_excerpt,
        placeholder_style: request.placeholder_style,
        strategy: request.strategy,
    });
    let attachments = match request.strategy {
        Strategy::InlineText => &[][..],
        Strategy::AttachPdf => request.attachments,
    };
    debug!(
        "extracting {} placeholder(s) from {} document(s), prompt {} chars",
        request.placeholders.len(),
        request.evidence.len().max(attachments.len()),
        prompt.len()
    );

    let raw = match model.generate(&ModelRequest {
        prompt: &prompt,
        attachments,
    }) {
        Ok(raw) => raw,
        Err(e @ (GlrError::Timeout(_) | GlrError::Unusable(_))) => {
            return Ok(fallback(request, e.to_string()));
        }
        Err(e) => return Err(e),
    };

    match response::parse_mapping(&raw) {
        Ok((parsed, repair)) => {
            if repair != Repair::Direct {
                debug!("model response needed repair: {repair:?}");
            }
            Ok(Extraction {
                mapping: complete(request, parsed),
                warning: None,
            })
        }
        Err(reason) => Ok(fallback(request, reason)),
    }
}

/// Shape a parsed reply to the extraction contract.
///
/// Delimited mode keeps exactly the requested keys, filling gaps with "".
/// Literal mode keeps whatever template substrings the model chose, since
/// defaulting every template line to "" would erase the template.
fn complete(request: &ExtractionRequest<'_>, parsed: FieldMapping) -> FieldMapping {
    match request.placeholder_style {
        PlaceholderStyle::Delimited => {
            let unknown = parsed
                .keys()
                .filter(|k| !request.placeholders.contains(*k))
                .count();
            if unknown > 0 {
                debug!("dropping {unknown} key(s) not present in the template");
            }
            request
                .placeholders
                .iter()
                .map(|k| (k.clone(), parsed.get(k).cloned().unwrap_or_default()))
                .collect()
        }
        PlaceholderStyle::Literal => parsed.into_iter().filter(|(k, _)| !k.is_empty()).collect(),
    }
}

fn fallback(request: &ExtractionRequest<'_>, reason: String) -> Extraction {
    warn!("{reason}; using empty values");
    let mapping = match request.placeholder_style {
        PlaceholderStyle::Delimited => request
            .placeholders
            .iter()
            .map(|k| (k.clone(), String::new()))
            .collect(),
        PlaceholderStyle::Literal => FieldMapping::new(),
    };
    Extraction {
        mapping,
        warning: Some(format!("could not use model response: {reason}")),
    }
}
