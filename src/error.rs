//! Error types for glrfill.
//!
//! A single [`GlrError`] enum covers every failure that aborts a run.
//! Unreadable evidence never surfaces here. [`GlrError::Timeout`] and
//! [`GlrError::Unusable`] are returned by model clients but absorbed by the
//! extractor, which turns them into warnings on the run report.

/// All errors that can abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum GlrError {
    /// I/O error (file read/write, stream read).
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error (from `zip` crate).
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML read/write error while rewriting the template.
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Document-level error (not a .docx, missing document part, corruption).
    #[error("{0}")]
    Document(String),

    /// A required input (template, evidence, credential) was not supplied.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// The language model service failed (network, auth, HTTP status).
    #[error("model service: {0}")]
    Service(String),

    /// The service answered but the answer holds no usable text (blocked
    /// prompt, empty candidate, unreadable envelope).
    #[error("model response unusable: {0}")]
    Unusable(String),

    /// The language model call exceeded its time limit.
    #[error("model service timed out after {0} s")]
    Timeout(u64),

    /// Pretty-printing error (bat rendering failure).
    #[error("pretty print: {0}")]
    Render(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GlrError>;
