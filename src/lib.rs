//! `glrfill` — fill General Loss Report templates from PDF inspection reports.
//!
//! The pipeline discovers the placeholders a `.docx` template needs,
//! extracts text from the evidence PDFs, asks a language model to resolve
//! every placeholder in a single call, and writes the values back into the
//! template without changing its paragraph or table structure.
//!
//! Entry points are [`pipeline::run`] (Gemini service) and
//! [`pipeline::run_with_model`] (any [`model::Model`]).

#![allow(clippy::redundant_pub_crate)]

pub mod config;
pub mod docx;
pub mod error;
pub mod extract;
pub mod fill;
pub mod model;
pub mod pdf;
pub mod pipeline;
pub mod placeholder;
pub mod prompt;
pub mod response;
pub mod style;
pub mod template;

pub use config::Config;
pub use error::{GlrError, Result};
pub use pipeline::{EvidenceFile, Report, Request, OUTPUT_FILENAME, OUTPUT_MIME};
pub use placeholder::{FieldMapping, PlaceholderStyle};
pub use prompt::Strategy;
