//! Span rendering over an immutable source text.
//!
//! Hashtag removal, bracket escaping and span wrapping are all decided per
//! code point of the original text and materialized in a single pass, so no
//! step can shift the offsets another step relies on.

use std::{ops::Range, sync::OnceLock};

use regex::Regex;
use tracing::warn;

use crate::domain::{FormattingSpan, SpanKind};

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").expect("valid regex"))
}

fn bracket_markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Hashtag labels in order of appearance, `#` stripped, case-insensitively unique.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    hashtag_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Glyph {
    Keep,
    Drop,
    Escape,
}

/// The original post text plus per-code-point render decisions.
pub(crate) struct SourceText {
    chars: Vec<char>,
    glyphs: Vec<Glyph>,
}

impl SourceText {
    pub(crate) fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut glyphs = vec![Glyph::Keep; chars.len()];

        // Byte offset of every char, for mapping regex matches back to code points.
        let starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let to_char = |byte: usize| starts.partition_point(|&b| b < byte);

        for m in bracket_markup_re().find_iter(text) {
            glyphs[to_char(m.start())] = Glyph::Escape;
            glyphs[to_char(m.end()) - 1] = Glyph::Escape;
        }
        for m in hashtag_re().find_iter(text) {
            for g in &mut glyphs[to_char(m.start())..to_char(m.end())] {
                *g = Glyph::Drop;
            }
        }

        Self { chars, glyphs }
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    fn push_glyph(&self, pos: usize, out: &mut String) {
        match (self.glyphs[pos], self.chars[pos]) {
            (Glyph::Drop, _) => {}
            (Glyph::Escape, '<') => out.push_str("&lt;"),
            (Glyph::Escape, '>') => out.push_str("&gt;"),
            (_, c) => out.push(c),
        }
    }

    /// Render a range as text only: hashtags dropped, brackets escaped, no markup.
    pub(crate) fn render_plain(&self, range: Range<usize>) -> String {
        let mut out = String::with_capacity(range.len());
        for pos in range {
            self.push_glyph(pos, &mut out);
        }
        out
    }

    /// The first visible line, plus any blank lead-in before it and the newline
    /// that ends it.
    pub(crate) fn first_line(&self) -> Range<usize> {
        let len = self.len();
        let start = (0..len)
            .find(|&p| self.glyphs[p] != Glyph::Drop && !self.chars[p].is_whitespace())
            .unwrap_or(len);
        let end = (start..len)
            .find(|&p| self.chars[p] == '\n')
            .map_or(len, |nl| nl + 1);
        0..end
    }

    /// Render the whole text with `spans` wrapped in HTML, omitting `hole`.
    ///
    /// Spans must come from [`applicable_spans`]. Markup is always well
    /// nested: when an inner span outlives the span that encloses it, the
    /// inner one is closed and reopened around the boundary.
    pub(crate) fn render_spans(
        &self,
        spans: &[&FormattingSpan],
        hole: Option<Range<usize>>,
    ) -> String {
        let mut out = String::with_capacity(self.chars.len() * 2);
        let mut open: Vec<usize> = Vec::new();

        for pos in 0..=self.chars.len() {
            if let Some(depth) = open.iter().position(|&i| spans[i].end() == pos) {
                let closing = open.split_off(depth);
                for &i in closing.iter().rev() {
                    out.push_str(close_tag(&spans[i].kind));
                }
                for &i in closing.iter().filter(|&&i| spans[i].end() != pos) {
                    out.push_str(&open_tag(&spans[i].kind));
                    open.push(i);
                }
            }

            let mut starting: Vec<usize> = (0..spans.len())
                .filter(|&i| spans[i].offset == pos)
                .collect();
            // Longer spans open first so they enclose shorter ones.
            starting.sort_by(|&a, &b| spans[b].end().cmp(&spans[a].end()).then(a.cmp(&b)));
            for i in starting {
                out.push_str(&open_tag(&spans[i].kind));
                open.push(i);
            }

            if pos < self.chars.len() && !hole.as_ref().is_some_and(|h| h.contains(&pos)) {
                self.push_glyph(pos, &mut out);
            }
        }

        out
    }
}

/// Spans that can be rendered against a text of `len` code points.
///
/// Out-of-bounds spans are logged and skipped; unsupported kinds and empty
/// spans are skipped silently.
pub(crate) fn applicable_spans(spans: &[FormattingSpan], len: usize) -> Vec<&FormattingSpan> {
    spans
        .iter()
        .filter(|span| {
            if span.offset >= len || span.end() > len {
                warn!(
                    offset = span.offset,
                    length = span.length,
                    text_len = len,
                    "formatting span out of bounds, skipping"
                );
                return false;
            }
            span.length > 0 && !matches!(span.kind, SpanKind::Unsupported(_))
        })
        .collect()
}

/// Index of the lowest start-offset bold span (first one wins on ties).
pub(crate) fn title_span(spans: &[&FormattingSpan]) -> Option<usize> {
    spans
        .iter()
        .enumerate()
        .filter(|(_, s)| s.kind == SpanKind::Bold)
        .min_by_key(|(_, s)| s.offset)
        .map(|(i, _)| i)
}

fn open_tag(kind: &SpanKind) -> String {
    match kind {
        SpanKind::Bold => "<strong>".to_string(),
        SpanKind::Italic => "<em>".to_string(),
        SpanKind::Underline => "<u>".to_string(),
        SpanKind::Strikethrough => "<s>".to_string(),
        SpanKind::Code => "<code>".to_string(),
        SpanKind::Pre { language } => match language.as_deref().map(language_class) {
            Some(lang) if !lang.is_empty() => {
                format!(r#"<pre class="wp-block-code"><code class="language-{lang}">"#)
            }
            _ => r#"<pre class="wp-block-code"><code>"#.to_string(),
        },
        SpanKind::Unsupported(_) => String::new(),
    }
}

fn close_tag(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Bold => "</strong>",
        SpanKind::Italic => "</em>",
        SpanKind::Underline => "</u>",
        SpanKind::Strikethrough => "</s>",
        SpanKind::Code => "</code>",
        SpanKind::Pre { .. } => "</code></pre>",
        SpanKind::Unsupported(_) => "",
    }
}

/// Keep the language usable inside a class attribute.
fn language_class(language: &str) -> String {
    language
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect()
}
