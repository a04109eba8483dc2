//! Terminal presentation of a run: the placeholder list and the resolved
//! mapping. When stdout is a terminal the mapping is pretty-printed as
//! syntax-highlighted JSON via `bat`; when piped, plain JSON is emitted.

use bat::{Input, PrettyPrinter};
use glrfill::{FieldMapping, GlrError, Result};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{self, Write};

/// One placeholder per line, prefixed with its count.
pub(crate) fn placeholder_list(placeholders: &BTreeSet<String>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} placeholder(s):", placeholders.len());
    for key in placeholders {
        let _ = writeln!(out, "  {key}");
    }
    out
}

/// The mapping as pretty JSON with a trailing newline.
pub(crate) fn mapping_json(mapping: &FieldMapping) -> String {
    let mut json = serde_json::to_string_pretty(mapping).unwrap_or_else(|_| "{}".into());
    json.push('\n');
    json
}

/// Write the mapping to stdout, highlighted when `pretty` is set.
pub(crate) fn print_mapping(mapping: &FieldMapping, pretty: bool) -> Result<()> {
    let json = mapping_json(mapping);
    if pretty {
        pretty_print(&json, "mapping.json")
    } else {
        io::stdout().write_all(json.as_bytes())?;
        Ok(())
    }
}

fn pretty_print(content: &str, title: &str) -> Result<()> {
    let input = Input::from_bytes(content.as_bytes()).name(title).title(title);

    let theme = std::env::var("BAT_THEME").unwrap_or_else(|_| "ansi".to_string());

    PrettyPrinter::new()
        .input(input)
        .language("JSON")
        .theme(&theme)
        .header(true)
        .line_numbers(false)
        .grid(true)
        .colored_output(true)
        .true_color(true)
        .paging_mode(bat::PagingMode::QuitIfOneScreen)
        .print()
        .map_err(|e| GlrError::Render(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_list_is_sorted() {
        let keys: BTreeSet<String> = ["VALUE_1", "CLAIM_NO"].into_iter().map(String::from).collect();
        assert_eq!(
            placeholder_list(&keys),
            "2 placeholder(s):\n  CLAIM_NO\n  VALUE_1\n"
        );
    }

    #[test]
    fn mapping_json_is_pretty() {
        let mapping: FieldMapping = [("A".to_string(), "1".to_string())].into_iter().collect();
        assert_eq!(mapping_json(&mapping), "{\n  \"A\": \"1\"\n}\n");
    }
}
