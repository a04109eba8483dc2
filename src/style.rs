//! Style excerpt: the template flattened to plain text.
//!
//! Each non-empty paragraph becomes one trimmed line; each table row
//! becomes one line with its non-empty cell texts joined by ` | `. Tables
//! nested in a cell follow their row, one line per nested row. The result
//! is only ever shown to the model as a tone and format exemplar.

use crate::template::{cell_text, Block, Template};

const CELL_SEPARATOR: &str = " | ";

/// Flatten `template` into its style excerpt.
pub fn excerpt(template: &Template) -> String {
    let mut lines = Vec::new();
    flatten(&template.blocks, &mut lines);
    lines.join("\n")
}

fn flatten(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                let text = p.text.trim();
                if !text.is_empty() {
                    lines.push(text.to_string());
                }
            }
            Block::Table { rows } => {
                for row in rows {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|cell| cell_text(cell))
                        .filter(|t| !t.is_empty())
                        .collect();
                    if !cells.is_empty() {
                        lines.push(cells.join(CELL_SEPARATOR));
                    }
                    for nested in row.iter().flatten() {
                        if let Block::Table { .. } = nested {
                            flatten(std::slice::from_ref(nested), lines);
                        }
                    }
                }
            }
        }
    }
}
