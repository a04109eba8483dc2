//! PDF text extraction.
//!
//! Uses [`pdf_extract`] to pull text from evidence PDFs. Extraction never
//! fails: unparsable files and pages without a text layer contribute empty
//! text. Since `pdf_extract` can panic on malformed input (rather than
//! returning errors), all calls are wrapped in [`std::panic::catch_unwind`].

use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};

const PDF_MAGIC: [u8; 5] = [0x25, 0x50, 0x44, 0x46, 0x2D]; // %PDF-

/// Whether `data` starts with the PDF signature.
pub fn is_pdf(data: &[u8]) -> bool {
    data.len() >= 5 && data[..5] == PDF_MAGIC
}

/// Extract pages of text from a PDF byte slice, one `String` per page.
///
/// Errors and panics from the underlying library are reported as `Err`
/// with a short description.
fn extract_pages(data: &[u8]) -> Result<Vec<String>, String> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(format!("PDF extraction failed: {e}")),
        Err(_) => Err("PDF extraction panicked (malformed document)".into()),
    }
}

/// Clean up a page of extracted text: trim trailing whitespace from each line,
/// collapse runs of 3+ blank lines down to 2, and trim the page.
fn clean_page(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0_u32;
    for line in raw.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                out.push('\n');
            }
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }
    out.trim().to_string()
}

/// Join cleaned pages in order, separated by a blank line. Pages without
/// text are dropped.
fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|p| clean_page(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Best-effort plain text of a PDF. Returns an empty string when the file
/// cannot be read or has no text layer; the reason is logged.
pub fn extract_text(name: &str, data: &[u8]) -> String {
    if !is_pdf(data) {
        warn!("{name}: not a PDF (missing %PDF- signature), using empty text");
        return String::new();
    }
    match extract_pages(data) {
        Ok(pages) => {
            let text = join_pages(&pages);
            if text.is_empty() {
                warn!("{name}: no extractable text (may be scanned/image-only)");
            } else {
                debug!("{name}: {} pages, {} chars of text", pages.len(), text.len());
            }
            text
        }
        Err(e) => {
            warn!("{name}: {e}, using empty text");
            String::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fmt::Write as _;

    /// A minimal one-page PDF showing `text` in Helvetica, with a valid
    /// cross-reference table.
    pub(crate) fn one_page_pdf(text: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
             /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ),
        ];

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            let _ = write!(pdf, "{} 0 obj\n{body}\nendobj\n", i + 1);
        }
        let xref = pdf.len();
        let _ = write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = write!(pdf, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            pdf,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        );
        pdf.into_bytes()
    }

    #[test]
    fn clean_page_trims_trailing_whitespace() {
        assert_eq!(clean_page("hello   \nworld  \n"), "hello\nworld");
    }

    #[test]
    fn clean_page_collapses_blank_lines() {
        assert_eq!(clean_page("a\n\n\n\n\nb\n"), "a\n\n\nb");
    }

    #[test]
    fn clean_page_trims_leading_trailing_blanks() {
        assert_eq!(clean_page("\n\n\n  hello\n\n\n"), "hello");
    }

    #[test]
    fn join_pages_separates_with_blank_line() {
        let pages = ["Insured: Jane Doe\n", "\n\n", "  Policy: P-1  \n"];
        assert_eq!(join_pages(&pages), "Insured: Jane Doe\n\nPolicy: P-1");
    }

    #[test]
    fn join_pages_all_empty() {
        let pages = ["", "  \n"];
        assert_eq!(join_pages(&pages), "");
    }

    #[test]
    fn extracts_text_layer() {
        let pdf = one_page_pdf("Insured: Jane Doe");
        assert!(is_pdf(&pdf));
        assert_eq!(extract_text("inspection.pdf", &pdf), "Insured: Jane Doe");
    }

    #[test]
    fn garbage_degrades_to_empty() {
        assert_eq!(extract_text("junk.pdf", b"not a pdf at all"), "");
    }

    #[test]
    fn bare_header_degrades_to_empty() {
        assert_eq!(extract_text("empty.pdf", b"%PDF-1.4\n%%EOF\n"), "");
    }
}
