//! Highlight spans for a field text and a query.
//!
//! Highlighting is always word-based, whatever mode selected the record:
//! every occurrence of every query word is collected, then reduced to a
//! sorted, disjoint set by a single left-to-right sweep.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::matcher::find;
use crate::normalize::{fold, tokenize_chars};

/// A half-open `[start, end)` interval of char offsets into a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of chars covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Converts the char offsets into a byte range of `text`.
    ///
    /// Offsets past the end of `text` clamp to `text.len()`.
    pub fn byte_range(&self, text: &str) -> Range<usize> {
        self.byte_range_in(&char_offsets(text), text.len())
    }

    fn byte_range_in(&self, offsets: &[usize], len: usize) -> Range<usize> {
        let byte_at = |char_idx: usize| offsets.get(char_idx).copied().unwrap_or(len);
        byte_at(self.start)..byte_at(self.end)
    }
}

/// Byte offset of every char of `text`.
fn char_offsets(text: &str) -> Vec<usize> {
    text.char_indices().map(|(byte, _)| byte).collect()
}

/// Computes the spans of `text` to highlight for `query`.
///
/// Spans are sorted by start and pairwise disjoint. A span that starts
/// before the end of the previously kept span is dropped, not trimmed or
/// merged. An empty query or text yields no spans.
pub fn compute_spans(text: &str, query: &str) -> Vec<Span> {
    if text.is_empty() {
        return Vec::new();
    }
    let tokens = tokenize_chars(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let haystack = fold(text);
    let mut spans = Vec::new();
    for token in &tokens {
        let mut from = 0;
        while let Some(start) = find(&haystack, token, from) {
            spans.push(Span::new(start, start + token.len()));
            from = start + 1;
        }
    }

    // Stable: spans sharing a start keep query-word order.
    spans.sort_by_key(|span| span.start);

    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last() {
            Some(last) if span.start < last.end => {}
            _ => kept.push(span),
        }
    }

    tracing::trace!(query, spans = kept.len(), "computed highlight spans");
    kept
}

/// Wraps each span of `text` in `open`/`close` markers.
///
/// Spans must come from [`compute_spans`] for the same text; out-of-range
/// offsets are clamped.
pub fn render(text: &str, spans: &[Span], open: &str, close: &str) -> String {
    if spans.is_empty() {
        return text.to_string();
    }

    let offsets = char_offsets(text);
    let mut out = String::with_capacity(text.len() + spans.len() * (open.len() + close.len()));
    let mut last = 0;
    for span in spans {
        let range = span.byte_range_in(&offsets, text.len());
        if range.start < last || range.is_empty() {
            continue;
        }
        out.push_str(&text[last..range.start]);
        out.push_str(open);
        out.push_str(&text[range.clone()]);
        out.push_str(close);
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Computes spans and renders them in one call.
pub fn highlight(text: &str, query: &str, open: &str, close: &str) -> String {
    render(text, &compute_spans(text, query), open, close)
}
