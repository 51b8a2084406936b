//! Paragraph classification and block-level HTML assembly.

use std::sync::OnceLock;

use regex::Regex;

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block {
    Preformatted,
    Quote,
    Bullets,
    Numbered,
    Paragraph,
}

/// Wrap blank-line separated paragraphs of inline HTML in block containers.
pub fn assemble_body(text: &str) -> String {
    let collapsed = blank_run_re().replace_all(text, "\n\n");
    split_paragraphs(&collapsed)
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split on blank lines, never inside a `<pre>` block.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending = String::new();
    for part in text.split("\n\n") {
        if !pending.is_empty() {
            pending.push_str("\n\n");
        }
        pending.push_str(part);
        if pending.matches("<pre").count() <= pending.matches("</pre>").count() {
            out.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

fn classify(paragraph: &str) -> Block {
    if paragraph.starts_with("<pre") && paragraph.ends_with("</pre>") {
        return Block::Preformatted;
    }
    let lines = || paragraph.lines();
    if lines().any(|l| l.starts_with('>')) {
        Block::Quote
    } else if lines().any(|l| bullet_item(l).is_some()) {
        Block::Bullets
    } else if lines().any(|l| numbered_item(l).is_some()) {
        Block::Numbered
    } else {
        Block::Paragraph
    }
}

fn render_block(paragraph: &str) -> String {
    match classify(paragraph) {
        Block::Preformatted => paragraph.to_string(),
        Block::Quote => {
            let quoted = paragraph
                .lines()
                .map(|l| l.strip_prefix('>').unwrap_or(l).trim())
                .collect::<Vec<_>>()
                .join("\n");
            format!(r#"<blockquote class="wp-block-quote"><p>{quoted}</p></blockquote>"#)
        }
        Block::Bullets => render_list(paragraph, "ul", bullet_item),
        Block::Numbered => render_list(paragraph, "ol", numbered_item),
        Block::Paragraph => format!("<p>{paragraph}</p>"),
    }
}

/// Lines before the first item become a lead-in paragraph; later non-item
/// lines continue the previous item.
fn render_list(paragraph: &str, tag: &str, item: fn(&str) -> Option<&str>) -> String {
    let mut lead: Vec<&str> = Vec::new();
    let mut items: Vec<String> = Vec::new();
    for line in paragraph.lines() {
        if let Some(text) = item(line) {
            items.push(text.to_string());
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match items.last_mut() {
            Some(prev) => {
                prev.push('\n');
                prev.push_str(line);
            }
            None => lead.push(line),
        }
    }

    let list: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
    if lead.is_empty() {
        format!("<{tag}>{list}</{tag}>")
    } else {
        format!("<p>{}</p>\n<{tag}>{list}</{tag}>", lead.join("\n"))
    }
}

/// `- item` / `* item`
fn bullet_item(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('-').or_else(|| line.strip_prefix('*'))?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

/// `12. item`
fn numbered_item(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return None;
    }
    let rest = rest.strip_prefix('.')?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}
