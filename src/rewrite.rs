use serde_json::Value;
use swc_common::{BytePos, Span};

/// One byte-span replacement against the original source text. Spans use
/// the global positions handed out by the source map; `apply_edits`
/// rebases them onto the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdit {
    pub lo: BytePos,
    pub hi: BytePos,
    pub replacement: String,
}

impl SourceEdit {
    pub fn replace(span: Span, replacement: String) -> Self {
        Self {
            lo: span.lo,
            hi: span.hi,
            replacement,
        }
    }

    pub fn remove(span: Span) -> Self {
        Self::replace(span, String::new())
    }
}

/// Remove a node together with the whitespace run before it, so stripping
/// a JSX attribute does not leave a double space behind.
pub fn remove_with_leading_whitespace(
    source: &str,
    file_start: BytePos,
    span: Span,
) -> SourceEdit {
    let mut lo = offset_in_file(span.lo, file_start);
    while lo > 0 && source[..lo].ends_with(|ch: char| ch.is_whitespace()) {
        lo -= source[..lo].chars().next_back().map_or(1, char::len_utf8);
    }
    SourceEdit {
        lo: BytePos(file_start.0 + lo as u32),
        hi: span.hi,
        replacement: String::new(),
    }
}

/// The runtime shape a batch-definition descriptor is reduced to: id and
/// defaultMessage only, everything else discarded.
pub fn minimal_descriptor_source(id: &str, default_message: &str) -> String {
    format!(
        "{{ id: {}, defaultMessage: {} }}",
        Value::String(id.to_string()),
        Value::String(default_message.to_string()),
    )
}

/// Apply edits to the original text, later spans first so earlier offsets
/// stay valid. Overlapping edits keep the first and drop the rest.
pub fn apply_edits(source: &str, file_start: BytePos, edits: &[SourceEdit]) -> String {
    let mut ordered: Vec<&SourceEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| (edit.lo, edit.hi));

    let mut result = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in ordered {
        let lo = offset_in_file(edit.lo, file_start);
        let hi = offset_in_file(edit.hi, file_start);
        if lo < cursor || hi > source.len() || lo > hi {
            continue;
        }
        result.push_str(&source[cursor..lo]);
        result.push_str(&edit.replacement);
        cursor = hi;
    }
    result.push_str(&source[cursor..]);
    result
}

fn offset_in_file(pos: BytePos, file_start: BytePos) -> usize {
    pos.0.saturating_sub(file_start.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(lo: u32, hi: u32) -> Span {
        Span::new(BytePos(lo), BytePos(hi))
    }

    #[test]
    fn applies_edits_back_to_front() {
        let source = "abc def ghi";
        let edits = vec![
            SourceEdit::replace(span(8, 11), "X".into()),
            SourceEdit::replace(span(0, 3), "Y".into()),
        ];
        assert_eq!(apply_edits(source, BytePos(0), &edits), "Y def X");
    }

    #[test]
    fn rebases_spans_onto_the_file_start() {
        let source = "hello";
        let edits = vec![SourceEdit::replace(span(101, 104), "cat".into())];
        assert_eq!(apply_edits(source, BytePos(100), &edits), "hcato");
    }

    #[test]
    fn removal_consumes_leading_whitespace() {
        let source = "<M id=\"a\"\n    description=\"d\" />";
        let start = source.find("description").unwrap() as u32;
        let end = start + "description=\"d\"".len() as u32;
        let edit = remove_with_leading_whitespace(source, BytePos(0), span(start, end));
        assert_eq!(apply_edits(source, BytePos(0), &[edit]), "<M id=\"a\" />");
    }

    #[test]
    fn overlapping_edits_keep_the_first() {
        let source = "abcdef";
        let edits = vec![
            SourceEdit::replace(span(0, 4), "1".into()),
            SourceEdit::replace(span(2, 6), "2".into()),
        ];
        assert_eq!(apply_edits(source, BytePos(0), &edits), "1ef");
    }

    #[test]
    fn minimal_descriptor_escapes_values() {
        assert_eq!(
            minimal_descriptor_source("a", "say \"hi\""),
            r#"{ id: "a", defaultMessage: "say \"hi\"" }"#
        );
    }
}
