//! In-memory model of a report template.
//!
//! A [`Template`] is an ordered list of [`Block`]s: paragraphs and tables.
//! Tables hold rows of cells, and each cell holds its own blocks (normally
//! paragraphs, occasionally a nested table). Only text is modelled; run
//! formatting stays in the `.docx` package and is untouched by filling.

/// A paragraph's text, the concatenation of its text runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A block-level element of the template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table { rows: Vec<Row> },
}

/// A single table cell containing blocks.
pub type Cell = Vec<Block>;
/// A table row: a sequence of cells.
pub type Row = Vec<Cell>;

/// Parsed template body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pub blocks: Vec<Block>,
}

impl Template {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Visit every paragraph in document order, descending into table cells.
    pub fn for_each_paragraph<'a, F: FnMut(&'a Paragraph)>(&'a self, mut f: F) {
        fn walk<'a, F: FnMut(&'a Paragraph)>(blocks: &'a [Block], f: &mut F) {
            for block in blocks {
                match block {
                    Block::Paragraph(p) => f(p),
                    Block::Table { rows } => {
                        for cell in rows.iter().flatten() {
                            walk(cell, f);
                        }
                    }
                }
            }
        }
        walk(&self.blocks, &mut f);
    }

    /// Table geometry in document order: one entry per table (nested tables
    /// included), each listing the cell count of every row.
    pub fn table_shapes(&self) -> Vec<Vec<usize>> {
        fn walk(blocks: &[Block], out: &mut Vec<Vec<usize>>) {
            for block in blocks {
                if let Block::Table { rows } = block {
                    out.push(rows.iter().map(Vec::len).collect());
                    for cell in rows.iter().flatten() {
                        walk(cell, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }
}

/// Text of a cell: its non-empty paragraphs, trimmed and joined with spaces.
/// Nested tables are skipped.
pub fn cell_text(cell: &[Block]) -> String {
    cell.iter()
        .filter_map(|b| match b {
            Block::Paragraph(p) => {
                let t = p.text.trim();
                if t.is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            }
            Block::Table { .. } => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}
