//! Substitution planning.
//!
//! Filling is done in two steps: [`plan`] finds every placeholder occurrence
//! in the original text and records an [`Edit`] for it, then the edits are
//! applied in one pass. Replacement values are never rescanned, so a value
//! that happens to look like a placeholder is emitted verbatim.
//!
//! In literal mode, keys can overlap as substrings of one another. Matching
//! scans left to right and, at each position, takes the longest key that
//! matches there (ties broken by byte order of the key). This keeps output
//! independent of mapping iteration order.

use crate::placeholder::{token_regex, FieldMapping, PlaceholderStyle};

/// Replace the byte range `start..end` of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Find every placeholder occurrence in `text`. Edits are sorted by start
/// offset and never overlap.
pub fn plan(text: &str, mapping: &FieldMapping, style: PlaceholderStyle) -> Vec<Edit> {
    match style {
        PlaceholderStyle::Delimited => plan_delimited(text, mapping),
        PlaceholderStyle::Literal => plan_literal(text, mapping),
    }
}

/// Keys without a mapping entry are removed along with their brackets.
fn plan_delimited(text: &str, mapping: &FieldMapping) -> Vec<Edit> {
    token_regex()
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let key = c.get(1)?.as_str();
            Some(Edit {
                start: whole.start(),
                end: whole.end(),
                replacement: mapping.get(key).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

fn plan_literal(text: &str, mapping: &FieldMapping) -> Vec<Edit> {
    let mut keys: Vec<(&str, &str)> = mapping
        .iter()
        .filter(|(k, _)| !k.is_empty() && text.contains(k.as_str()))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if keys.is_empty() {
        return Vec::new();
    }
    // Longest first; BTreeMap order already breaks ties deterministically.
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut edits = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        if let Some((key, value)) = keys.iter().find(|(k, _)| rest.starts_with(k)) {
            edits.push(Edit {
                start: pos,
                end: pos + key.len(),
                replacement: (*value).to_string(),
            });
            pos += key.len();
        } else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    edits
}

/// Apply non-overlapping, sorted edits to `text`.
pub fn apply(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&text[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Substitute every placeholder in `text` in a single pass.
pub fn fill_text(text: &str, mapping: &FieldMapping, style: PlaceholderStyle) -> String {
    apply(text, &plan(text, mapping, style))
}

/// Apply `edits`, planned against the concatenation of `segments`, to each
/// segment separately.
///
/// A replacement lands in the segment holding the first character of its
/// match; matched characters in later segments are dropped. Segment count is
/// preserved so the caller can write each one back to its original run.
pub fn apply_segmented<S: AsRef<str>>(segments: &[S], edits: &[Edit]) -> Vec<String> {
    let mut out = Vec::with_capacity(segments.len());
    let mut offset = 0;
    for segment in segments {
        let seg = segment.as_ref();
        let seg_start = offset;
        let seg_end = offset + seg.len();
        offset = seg_end;

        let mut piece = String::with_capacity(seg.len());
        let mut cursor = seg_start;
        for edit in edits {
            if edit.end <= seg_start || edit.start >= seg_end {
                continue;
            }
            if edit.start > cursor {
                piece.push_str(&seg[cursor - seg_start..edit.start - seg_start]);
            }
            if edit.start >= seg_start {
                piece.push_str(&edit.replacement);
            }
            cursor = edit.end.min(seg_end);
        }
        if cursor < seg_end {
            piece.push_str(&seg[cursor - seg_start..]);
        }
        out.push(piece);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> FieldMapping {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ── delimited ────────────────────────────────────────────────

    #[test]
    fn delimited_replaces_every_occurrence() {
        let m = mapping(&[("NAME", "Jane Doe")]);
        assert_eq!(
            fill_text("[NAME] / [NAME]", &m, PlaceholderStyle::Delimited),
            "Jane Doe / Jane Doe"
        );
    }

    #[test]
    fn delimited_missing_key_becomes_empty() {
        let m = mapping(&[("A", "1")]);
        assert_eq!(
            fill_text("a=[A] b=[B].", &m, PlaceholderStyle::Delimited),
            "a=1 b=."
        );
    }

    #[test]
    fn delimited_is_not_recursive() {
        let m = mapping(&[("A", "[B]"), ("B", "boom")]);
        assert_eq!(fill_text("[A]", &m, PlaceholderStyle::Delimited), "[B]");
    }

    #[test]
    fn delimited_leaves_non_tokens_alone() {
        let m = FieldMapping::new();
        assert_eq!(
            fill_text("see [note 1] and [x-y]", &m, PlaceholderStyle::Delimited),
            "see [note 1] and [x-y]"
        );
    }

    // ── literal ──────────────────────────────────────────────────

    #[test]
    fn literal_longest_key_wins() {
        let m = mapping(&[("Date", "X"), ("Date of Loss", "2024-03-01")]);
        assert_eq!(
            fill_text("Date of Loss / Date", &m, PlaceholderStyle::Literal),
            "2024-03-01 / X"
        );
    }

    #[test]
    fn literal_is_not_recursive() {
        let m = mapping(&[("Insured", "Policy Holder"), ("Policy", "P-1")]);
        assert_eq!(
            fill_text("Insured", &m, PlaceholderStyle::Literal),
            "Policy Holder"
        );
    }

    #[test]
    fn literal_empty_key_ignored() {
        let m = mapping(&[("", "zzz")]);
        assert_eq!(fill_text("abc", &m, PlaceholderStyle::Literal), "abc");
    }

    #[test]
    fn literal_handles_multibyte_text() {
        let m = mapping(&[("café", "tea")]);
        assert_eq!(
            fill_text("né café né", &m, PlaceholderStyle::Literal),
            "né tea né"
        );
    }

    // ── apply_segmented ──────────────────────────────────────────

    #[test]
    fn segmented_placeholder_in_one_run() {
        let m = mapping(&[("CLAIM_NO", "A-102")]);
        let segs = ["Claim Number: ", "[CLAIM_NO]"];
        let edits = plan(&segs.concat(), &m, PlaceholderStyle::Delimited);
        assert_eq!(apply_segmented(&segs, &edits), ["Claim Number: ", "A-102"]);
    }

    #[test]
    fn segmented_placeholder_split_across_runs() {
        let m = mapping(&[("CLAIM_NO", "A-102")]);
        let segs = ["No: [CLA", "IM_", "NO] end"];
        let edits = plan(&segs.concat(), &m, PlaceholderStyle::Delimited);
        let out = apply_segmented(&segs, &edits);
        assert_eq!(out, ["No: A-102", "", " end"]);
        assert_eq!(out.concat(), "No: A-102 end");
    }

    #[test]
    fn segmented_preserves_segment_count() {
        let m = mapping(&[("A", "1"), ("B", "2")]);
        let segs = ["", "[A]", "x", "[B", "]"];
        let edits = plan(&segs.concat(), &m, PlaceholderStyle::Delimited);
        let out = apply_segmented(&segs, &edits);
        assert_eq!(out.len(), segs.len());
        assert_eq!(out.concat(), "1x2");
    }

    #[test]
    fn segmented_without_edits_is_identity() {
        let segs = ["one ", "two"];
        assert_eq!(apply_segmented(&segs, &[]), ["one ", "two"]);
    }
}
