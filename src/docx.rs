//! OOXML `.docx` template reader and writer.
//!
//! Reading unzips the package, parses `word/document.xml` with `quick-xml`
//! into a [`Template`] (paragraphs, tables with rows and cells). Writing
//! streams the same XML back out, rewriting only the contents of `<w:t>`
//! text elements, and copies every other package part untouched. Block
//! order and table geometry are therefore identical in the output.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::Writer;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{GlrError, Result};
use crate::fill;
use crate::placeholder::{FieldMapping, PlaceholderStyle};
use crate::template::{Block, Cell, Paragraph, Row, Template};

/// The main document part inside the package.
const DOCUMENT_PART: &str = "word/document.xml";

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Whether `data` looks like a `.docx` package: ZIP signature plus a
/// `word/document.xml` part.
pub fn is_docx(data: &[u8]) -> bool {
    if data.len() < 4 || data[..4] != ZIP_MAGIC {
        return false;
    }
    ZipArchive::new(Cursor::new(data))
        .map(|archive| archive.index_for_name(DOCUMENT_PART).is_some())
        .unwrap_or(false)
}

fn read_document_xml(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<String> {
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| GlrError::Document("not a .docx template (no word/document.xml)".into()))?
        .read_to_string(&mut xml)?;
    Ok(xml)
}

/// Parse a `.docx` package into its template structure.
pub fn read_template(data: &[u8]) -> Result<Template> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let xml = read_document_xml(&mut archive)?;

    let mut reader = Reader::from_str(&xml);
    let mut blocks = Vec::new();
    parse_body(&mut reader, &mut blocks);

    Ok(Template::new(blocks))
}

/// Walk the XML and collect blocks from the document body.
fn parse_body(reader: &mut Reader<&[u8]>, blocks: &mut Vec<Block>) {
    let mut in_body = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"body" => in_body = true,
                b"p" if in_body => blocks.push(Block::Paragraph(parse_paragraph(reader))),
                b"tbl" if in_body => blocks.push(parse_table(reader)),
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"body" {
                    in_body = false;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
}

/// Parse a `<w:p>` element. Text is the concatenation of its `<w:t>`
/// contents; paragraphs nested inside it (text boxes) are folded in.
fn parse_paragraph(reader: &mut Reader<&[u8]>) -> Paragraph {
    let mut text = String::new();
    let mut depth = 1u32;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => depth += 1,
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_text => {
                if let Ok(s) = t.unescape() {
                    text.push_str(&s);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    Paragraph { text }
}

/// Parse a `<w:tbl>` element into a `Block::Table`.
fn parse_table(reader: &mut Reader<&[u8]>) -> Block {
    let mut rows: Vec<Row> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"tr" {
                    rows.push(parse_table_row(reader));
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"tbl" {
                    break;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    Block::Table { rows }
}

/// Parse a `<w:tr>` element into a row of cells.
fn parse_table_row(reader: &mut Reader<&[u8]>) -> Row {
    let mut cells: Row = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"tc" {
                    cells.push(parse_table_cell(reader));
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"tr" {
                    break;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    cells
}

/// Parse a `<w:tc>` element into a list of blocks.
fn parse_table_cell(reader: &mut Reader<&[u8]>) -> Cell {
    let mut blocks = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => blocks.push(Block::Paragraph(parse_paragraph(reader))),
                b"tbl" => blocks.push(parse_table(reader)), // nested table
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"tc" {
                    break;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    blocks
}

// ── Filling ───────────────────────────────────────────────────────

/// Produce a new `.docx` package with every placeholder in the body
/// replaced according to `mapping`.
pub fn fill_package(data: &[u8], mapping: &FieldMapping, style: PlaceholderStyle) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let xml = read_document_xml(&mut archive)?;
    let filled = rewrite_document(&xml, mapping, style)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == DOCUMENT_PART {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(DOCUMENT_PART, options)?;
            writer.write_all(filled.as_bytes())?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// Stream `xml` through, substituting placeholders paragraph by paragraph.
fn rewrite_document(xml: &str, mapping: &FieldMapping, style: PlaceholderStyle) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"p" => {
                let mut events = vec![Event::Start(e.into_owned())];
                collect_paragraph(&mut reader, &mut events)?;
                fill_paragraph(&mut events, mapping, style)?;
                for event in events {
                    writer.write_event(event)?;
                }
            }
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| GlrError::Document(format!("rewritten document is not UTF-8: {e}")))
}

/// Buffer the remaining events of a paragraph, up to its matching `</w:p>`.
fn collect_paragraph(reader: &mut Reader<&[u8]>, events: &mut Vec<Event<'static>>) -> Result<()> {
    let mut depth = 1u32;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) if e.local_name().as_ref() == b"p" => depth += 1,
            Event::End(e) if e.local_name().as_ref() == b"p" => depth -= 1,
            Event::Eof => {
                return Err(GlrError::Document("unterminated <w:p> in template".into()));
            }
            _ => {}
        }
        events.push(event.into_owned());
        if depth == 0 {
            return Ok(());
        }
    }
}

/// One `<w:t>` element within a buffered paragraph.
struct TextSegment {
    /// Index of the `<w:t>` start event.
    start: usize,
    /// Indices of the text events inside it.
    texts: Vec<usize>,
    text: String,
}

fn text_segments(events: &[Event<'static>]) -> Result<Vec<TextSegment>> {
    let mut segments = Vec::new();
    let mut current: Option<TextSegment> = None;

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                current = Some(TextSegment {
                    start: i,
                    texts: Vec::new(),
                    text: String::new(),
                });
            }
            Event::Text(t) => {
                if let Some(seg) = current.as_mut() {
                    let s = t
                        .unescape()
                        .map_err(|e| GlrError::Document(format!("bad text in template: {e}")))?;
                    seg.text.push_str(&s);
                    seg.texts.push(i);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"t" => {
                if let Some(seg) = current.take() {
                    segments.push(seg);
                }
            }
            _ => {}
        }
    }

    Ok(segments)
}

fn fill_paragraph(
    events: &mut [Event<'static>],
    mapping: &FieldMapping,
    style: PlaceholderStyle,
) -> Result<()> {
    let segments = text_segments(events)?;
    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    let edits = fill::plan(&texts.concat(), mapping, style);
    if edits.is_empty() {
        return Ok(());
    }

    let filled = fill::apply_segmented(&texts, &edits);
    for (seg, new_text) in segments.iter().zip(filled) {
        if seg.text == new_text {
            continue;
        }
        let Some((&first, rest)) = seg.texts.split_first() else {
            continue;
        };
        events[first] = Event::Text(BytesText::new(&new_text).into_owned());
        for &i in rest {
            events[i] = Event::Text(BytesText::new(""));
        }
        if let Event::Start(start) = &events[seg.start] {
            events[seg.start] = Event::Start(preserve_space(start));
        }
    }

    Ok(())
}

/// Mark a `<w:t>` as whitespace-preserving so substituted values keep
/// their leading and trailing spaces.
fn preserve_space(start: &BytesStart<'static>) -> BytesStart<'static> {
    let has_space = start
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xml:space");
    let mut out = start.clone();
    if !has_space {
        out.push_attribute(("xml:space", "preserve"));
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    /// Wrap body XML in a minimal `word/document.xml`.
    pub(crate) fn document_xml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
        )
    }

    /// Build an in-memory `.docx` with the given body XML.
    pub(crate) fn build_docx(body: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .unwrap();
        zip.start_file("word/styles.xml", options).unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        zip.start_file(DOCUMENT_PART, options).unwrap();
        zip.write_all(document_xml(body).as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    pub(crate) fn p(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    pub(crate) fn tbl(rows: &[&[&str]]) -> String {
        let mut out = String::from("<w:tbl><w:tblPr/>");
        for row in rows {
            out.push_str("<w:tr>");
            for cell in *row {
                out.push_str("<w:tc><w:tcPr/>");
                out.push_str(&p(cell));
                out.push_str("</w:tc>");
            }
            out.push_str("</w:tr>");
        }
        out.push_str("</w:tbl>");
        out
    }

    fn mapping(pairs: &[(&str, &str)]) -> FieldMapping {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn texts(template: &Template) -> Vec<String> {
        let mut out = Vec::new();
        template.for_each_paragraph(|p| out.push(p.text.clone()));
        out
    }

    // ── reading ──────────────────────────────────────────────────

    #[test]
    fn detects_docx() {
        assert!(is_docx(&build_docx(&p("x"))));
        assert!(!is_docx(b"%PDF-1.4"));
        assert!(!is_docx(b"PK\x03\x04 truncated"));
    }

    #[test]
    fn reads_paragraphs_and_tables_in_order() {
        let body = format!("{}{}{}", p("Intro"), tbl(&[&["a", "b"], &["c", "d"]]), p("Outro"));
        let template = read_template(&build_docx(&body)).unwrap();
        assert_eq!(template.blocks.len(), 3);
        assert_eq!(template.table_shapes(), vec![vec![2, 2]]);
        assert_eq!(texts(&template), ["Intro", "a", "b", "c", "d", "Outro"]);
    }

    #[test]
    fn paragraph_text_joins_runs_and_unescapes() {
        let body = "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Fish &amp; </w:t></w:r><w:r><w:t>[CHIPS]</w:t></w:r></w:p>";
        let template = read_template(&build_docx(body)).unwrap();
        assert_eq!(texts(&template), ["Fish & [CHIPS]"]);
    }

    #[test]
    fn instruction_text_is_not_paragraph_text() {
        let body = "<w:p><w:r><w:instrText>PAGE</w:instrText></w:r><w:r><w:t>Page</w:t></w:r></w:p>";
        let template = read_template(&build_docx(body)).unwrap();
        assert_eq!(texts(&template), ["Page"]);
    }

    #[test]
    fn nested_table_in_cell() {
        let inner = tbl(&[&["inner"]]);
        let body = format!("<w:tbl><w:tr><w:tc>{}{inner}</w:tc></w:tr></w:tbl>", p("outer"));
        let template = read_template(&build_docx(&body)).unwrap();
        assert_eq!(template.table_shapes(), vec![vec![1], vec![1]]);
        assert_eq!(texts(&template), ["outer", "inner"]);
    }

    #[test]
    fn zip_without_document_part_is_error() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("xl/workbook.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<workbook/>").unwrap();
        let data = zip.finish().unwrap().into_inner();
        assert!(read_template(&data).is_err());
    }

    // ── filling ──────────────────────────────────────────────────

    #[test]
    fn fill_replaces_paragraph_and_cells() {
        let body = format!(
            "{}{}",
            p("Claim Number: [CLAIM_NO]"),
            tbl(&[&["Item", "Value"], &["[ITEM_1]", "[VALUE_1]"]])
        );
        let data = build_docx(&body);
        let m = mapping(&[("CLAIM_NO", "A-102"), ("ITEM_1", "Roof"), ("VALUE_1", "$500")]);
        let out = fill_package(&data, &m, PlaceholderStyle::Delimited).unwrap();

        let filled = read_template(&out).unwrap();
        assert_eq!(
            texts(&filled),
            ["Claim Number: A-102", "Item", "Value", "Roof", "$500"]
        );
        assert_eq!(
            filled.table_shapes(),
            read_template(&data).unwrap().table_shapes()
        );
    }

    #[test]
    fn fill_keeps_other_parts() {
        let data = build_docx(&p("[A]"));
        let out = fill_package(&data, &mapping(&[("A", "1")]), PlaceholderStyle::Delimited).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(out.as_slice())).unwrap();
        let mut styles = String::new();
        archive
            .by_name("word/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert_eq!(styles, "<w:styles/>");
        assert!(archive.index_for_name("[Content_Types].xml").is_some());
    }

    #[test]
    fn fill_split_run_keeps_first_run_formatting() {
        let xml = document_xml(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Name: [IN</w:t></w:r><w:r><w:t>SURED]!</w:t></w:r></w:p>",
        );
        let out = rewrite_document(&xml, &mapping(&[("INSURED", "Jane Doe")]), PlaceholderStyle::Delimited)
            .unwrap();
        assert!(out.contains(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Name: Jane Doe</w:t></w:r>"#));
        assert!(out.contains(r#"<w:t xml:space="preserve">!</w:t>"#));
    }

    #[test]
    fn fill_escapes_values() {
        let xml = document_xml(&p("[A]"));
        let out = rewrite_document(&xml, &mapping(&[("A", "<b> & co")]), PlaceholderStyle::Delimited)
            .unwrap();
        assert!(out.contains("&lt;b&gt; &amp; co"));
    }

    #[test]
    fn fill_without_placeholders_is_byte_identical_xml() {
        let xml = document_xml(&format!("{}{}", p("Nothing here"), tbl(&[&["x"]])));
        let out = rewrite_document(&xml, &FieldMapping::new(), PlaceholderStyle::Delimited).unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn fill_literal_mode_longest_first() {
        let data = build_docx(&format!("{}{}", p("Date of Loss"), p("Date")));
        let m = mapping(&[("Date", "Reported 2024-03-02"), ("Date of Loss", "2024-03-01")]);
        let out = fill_package(&data, &m, PlaceholderStyle::Literal).unwrap();
        assert_eq!(
            texts(&read_template(&out).unwrap()),
            ["2024-03-01", "Reported 2024-03-02"]
        );
    }
}
