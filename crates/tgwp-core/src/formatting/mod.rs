//! Channel post → WordPress markup (title, HTML body, tags).

mod blocks;
mod entities;
mod markdown;

use std::{ops::Range, sync::OnceLock};

use regex::Regex;
use tracing::{debug, info};

use crate::domain::FormattingSpan;

pub use blocks::assemble_body;
pub use entities::extract_hashtags;
pub use markdown::convert_markers;

use entities::{applicable_spans, title_span, SourceText};

/// Titles taken from the first line are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// A post ready to be handed to the publisher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormattedPost {
    /// Plain text, no markup.
    pub title: String,
    /// Block-level HTML fragment.
    pub body: String,
    /// Hashtag labels without `#`, case preserved.
    pub tags: Vec<String>,
}

impl FormattedPost {
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.body.trim().is_empty()
    }
}

fn strong_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<strong>(.*?)</strong>").expect("valid regex"))
}

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)[^>]*>").expect("valid regex"))
}

fn empty_inline_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        ["strong", "em", "u", "s"]
            .iter()
            .map(|t| Regex::new(&format!(r"<{t}>\s*</{t}>")).expect("valid regex"))
            .collect()
    })
}

/// Remove every HTML tag, keeping the text between them.
pub fn strip_markup(html: &str) -> String {
    markup_re().replace_all(html, "").into_owned()
}

/// Format raw post text (plus optional spans) for the content platform.
///
/// Spans are used when present and non-empty; otherwise marker syntax is
/// converted. Title selection:
/// 1. the lowest-offset bold span (or first `<strong>` in marker mode), whose
///    text is removed from the body;
/// 2. failing that, the first line, truncated to [`TITLE_MAX_CHARS`].
pub fn format_post(text: &str, spans: Option<&[FormattingSpan]>) -> FormattedPost {
    debug!(text, "formatting post");

    let tags = extract_hashtags(text);
    if !tags.is_empty() {
        info!(?tags, "extracted hashtags");
    }

    let doc = SourceText::new(text);
    let (title, body) = match spans.filter(|s| !s.is_empty()) {
        Some(spans) => {
            debug!(count = spans.len(), "applying formatting spans");
            title_from_spans(&doc, spans)
        }
        None => title_from_markers(convert_markers(&doc.render_plain(0..doc.len()))),
    };

    let body = remove_leftover_title(&title, body);
    let body = empty_inline_res()
        .iter()
        .fold(body, |acc, re| re.replace_all(&acc, "").into_owned());

    FormattedPost {
        title,
        body: assemble_body(body.trim()),
        tags,
    }
}

fn title_from_spans(doc: &SourceText, spans: &[FormattingSpan]) -> (String, String) {
    let spans = applicable_spans(spans, doc.len());

    if let Some(idx) = title_span(&spans) {
        let range = spans[idx].offset..spans[idx].end();
        let title = doc.render_plain(range.clone()).trim().to_string();
        if !title.is_empty() {
            let rest = spans_outside(&spans, &range);
            return (title, doc.render_spans(&rest, Some(range)));
        }
    }

    let line = doc.first_line();
    let title: String = doc
        .render_plain(line.clone())
        .trim()
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect();
    let rest = spans_outside(&spans, &line);
    (title.trim().to_string(), doc.render_spans(&rest, Some(line)))
}

/// Spans not wholly inside `range`; those would render as empty markup.
fn spans_outside<'a>(
    spans: &[&'a FormattingSpan],
    range: &Range<usize>,
) -> Vec<&'a FormattingSpan> {
    spans
        .iter()
        .filter(|s| !(s.offset >= range.start && s.end() <= range.end))
        .copied()
        .collect()
}

fn title_from_markers(html: String) -> (String, String) {
    let found = strong_re()
        .captures(&html)
        .and_then(|c| Some((c.get(0)?.range(), strip_markup(c.get(1)?.as_str()))));

    match found {
        Some((range, title)) if !title.trim().is_empty() => {
            let mut body = html;
            body.replace_range(range, "");
            (title.trim().to_string(), body)
        }
        _ => first_line_title(html),
    }
}

/// Cut marker HTML after its first line. Tags still open at the cut are
/// reopened at the start of the rest so the body stays well nested.
fn first_line_title(html: String) -> (String, String) {
    let html = html.trim();
    let (first, rest) = html.split_once('\n').unwrap_or((html, ""));
    let title: String = strip_markup(first).chars().take(TITLE_MAX_CHARS).collect();
    let body = if rest.is_empty() {
        String::new()
    } else {
        format!("{}{rest}", unclosed_tags(first).concat())
    };
    (title.trim().to_string(), body)
}

/// Opening tags of `html` that are never closed, outermost first.
fn unclosed_tags(html: &str) -> Vec<&str> {
    let mut open: Vec<(&str, &str)> = Vec::new();
    for c in tag_re().captures_iter(html) {
        let (Some(tag), Some(slash), Some(name)) = (c.get(0), c.get(1), c.get(2)) else {
            continue;
        };
        if slash.as_str().is_empty() {
            open.push((name.as_str(), tag.as_str()));
        } else if let Some(depth) = open.iter().rposition(|(n, _)| *n == name.as_str()) {
            open.truncate(depth);
        }
    }
    open.into_iter().map(|(_, tag)| tag).collect()
}

/// Drop a verbatim copy of the title that survived title extraction.
///
/// Only text between tags is searched, never the tags themselves.
fn remove_leftover_title(title: &str, mut body: String) -> String {
    if title.is_empty() {
        return body;
    }

    let mut found = None;
    let mut gap_start = 0;
    let tags = markup_re()
        .find_iter(&body)
        .map(|m| m.range())
        .chain(std::iter::once(body.len()..body.len()));
    for tag in tags {
        if let Some(i) = body[gap_start..tag.start].find(title) {
            found = Some(gap_start + i);
            break;
        }
        gap_start = tag.end;
    }

    if let Some(pos) = found {
        info!(title, "title still present in body, removing it");
        body.replace_range(pos..pos + title.len(), "");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpanKind;

    fn span(kind: SpanKind, offset: usize, length: usize) -> FormattingSpan {
        FormattingSpan::new(kind, offset, length)
    }

    #[test]
    fn bold_marker_title_is_removed_from_body() {
        let post = format_post("**Hello World**\n\nBody text", None);
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.body, "<p>Body text</p>");
        assert!(!post.body.contains("Hello World"));
    }

    #[test]
    fn hashtags_are_extracted_and_removed() {
        let post = format_post(
            "Morning run #Running #health\nFelt great #running #Health",
            None,
        );
        assert_eq!(post.tags, vec!["Running", "health"]);
        assert_eq!(post.title, "Morning run");
        assert_eq!(post.body, "<p>Felt great</p>");
        assert!(!post.body.contains('#'));
    }

    #[test]
    fn literal_markup_is_escaped() {
        let post = format_post("Title\n\nUse <script>alert(1)</script> wisely", None);
        assert_eq!(
            post.body,
            "<p>Use &lt;script&gt;alert(1)&lt;/script&gt; wisely</p>"
        );
        assert!(!post.body.contains("<script>"));
    }

    #[test]
    fn first_line_title_strips_markup_and_truncates() {
        let long = "a".repeat(150);
        let post = format_post(&format!("*{long}*\nrest"), None);
        assert_eq!(post.title.chars().count(), TITLE_MAX_CHARS);
        assert!(!post.title.contains('<'));
        assert_eq!(post.body, "<p>rest</p>");
    }

    #[test]
    fn bold_span_becomes_title() {
        let spans = [span(SpanKind::Bold, 0, 5), span(SpanKind::Italic, 2, 3)];
        let post = format_post("Hello world\n\nSecond", Some(&spans[..]));
        assert_eq!(post.title, "Hello");
        assert_eq!(post.body, "<p>world</p>\n\n<p>Second</p>");
    }

    #[test]
    fn lowest_offset_bold_span_wins() {
        let spans = [span(SpanKind::Bold, 6, 3), span(SpanKind::Bold, 0, 5)];
        let post = format_post("First two\nthree", Some(&spans[..]));
        assert_eq!(post.title, "First");
        assert_eq!(post.body, "<p><strong>two</strong>\nthree</p>");
    }

    #[test]
    fn hashtag_inside_title_span_keeps_offsets() {
        let spans = [span(SpanKind::Bold, 0, 19)];
        let post = format_post("#rust Release notes\nBody", Some(&spans[..]));
        assert_eq!(post.tags, vec!["rust"]);
        assert_eq!(post.title, "Release notes");
        assert_eq!(post.body, "<p>Body</p>");
    }

    #[test]
    fn out_of_bounds_span_is_skipped() {
        let spans = [span(SpanKind::Bold, 0, 99), span(SpanKind::Italic, 6, 6)];
        let post = format_post("Intro\nsecond line", Some(&spans[..]));
        assert_eq!(post.title, "Intro");
        assert_eq!(post.body, "<p><em>second</em> line</p>");
    }

    #[test]
    fn empty_span_list_falls_back_to_markers() {
        let post = format_post("**Title**\n\n~~old~~ new", Some(&[][..]));
        assert_eq!(post.title, "Title");
        assert_eq!(post.body, "<p><s>old</s> new</p>");
    }

    #[test]
    fn unicode_offsets_are_code_points() {
        let spans = [span(SpanKind::Bold, 0, 6)];
        let post = format_post("Привет мир\n\nТекст", Some(&spans[..]));
        assert_eq!(post.title, "Привет");
        assert_eq!(post.body, "<p>мир</p>\n\n<p>Текст</p>");
    }

    #[test]
    fn leftover_title_copy_is_removed_once() {
        let post = format_post("**Hello**\n\nHello again, Hello", None);
        assert_eq!(post.title, "Hello");
        assert_eq!(post.body, "<p>again, Hello</p>");
    }

    #[test]
    fn span_crossing_the_first_line_stays_balanced() {
        let spans = [span(SpanKind::Italic, 0, 15)];
        let post = format_post("Intro line\nmore", Some(&spans[..]));
        assert_eq!(post.title, "Intro line");
        assert_eq!(post.body, "<p><em>more</em></p>");
    }

    #[test]
    fn spans_within_the_first_line_leave_no_empty_markup() {
        let spans = [span(SpanKind::Code, 0, 3), span(SpanKind::Italic, 4, 2)];
        let post = format_post("run it\nnow then", Some(&spans[..]));
        assert_eq!(post.title, "run it");
        assert_eq!(post.body, "<p>now then</p>");
    }

    #[test]
    fn code_block_cut_by_first_line_title_is_reopened() {
        let post = format_post("```let x = 1;\nlet y = 2;```", None);
        assert_eq!(post.title, "let x = 1;");
        assert_eq!(
            post.body,
            r#"<pre class="wp-block-code"><code>let y = 2;</code></pre>"#
        );
    }

    #[test]
    fn leftover_title_is_not_matched_inside_tags() {
        let post = format_post("**em**\n\n*x* and more", None);
        assert_eq!(post.title, "em");
        assert_eq!(post.body, "<p><em>x</em> and more</p>");
    }

    #[test]
    fn unclosed_tags_tracks_nesting() {
        assert_eq!(
            unclosed_tags("<strong>a <em>b</em> <u>c"),
            vec!["<strong>", "<u>"]
        );
        assert!(unclosed_tags("<em>a</em>").is_empty());
    }

    #[test]
    fn pre_span_renders_as_code_block() {
        let spans = [
            span(SpanKind::Bold, 0, 5),
            span(
                SpanKind::Pre {
                    language: Some("rust".into()),
                },
                7,
                12,
            ),
        ];
        let post = format_post("Title\n\nfn main() {}", Some(&spans[..]));
        assert_eq!(post.title, "Title");
        assert_eq!(
            post.body,
            r#"<pre class="wp-block-code"><code class="language-rust">fn main() {}</code></pre>"#
        );
    }

    #[test]
    fn lists_and_quotes_survive_formatting() {
        let post = format_post(
            "**Plan**\n\n- write\n- test\n\n> ship it",
            None,
        );
        assert_eq!(post.title, "Plan");
        assert_eq!(
            post.body,
            "<ul><li>write</li><li>test</li></ul>\n\n<blockquote class=\"wp-block-quote\"><p>ship it</p></blockquote>"
        );
    }

    #[test]
    fn empty_text_yields_empty_post() {
        let post = format_post("", None);
        assert!(post.is_empty());
        assert!(post.tags.is_empty());
    }

    #[test]
    fn hashtag_only_post_has_tags_but_no_content() {
        let post = format_post("#news #today", None);
        assert_eq!(post.tags, vec!["news", "today"]);
        assert!(post.is_empty());
    }
}
