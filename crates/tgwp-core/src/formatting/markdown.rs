//! Informal marker syntax (`**bold**`, `*italic*`, ...) → HTML.
//!
//! Used only when a post carries no structured formatting spans.

use std::sync::OnceLock;

use regex::{Captures, Regex};

const PRE_OPEN: &str = r#"<pre class="wp-block-code"><code>"#;
const PRE_CLOSE: &str = "</code></pre>";

struct Patterns {
    blocks: Regex,
    inline_code: Regex,
    emphasis: Vec<(Regex, &'static str)>,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Patterns {
            blocks: re(
                r#"(?s)<pre class="wp-block-code"><code>(.*?)</code></pre>|<pre>(.*?)</pre>|```(.*?)```"#,
            ),
            inline_code: re(r"<code>(.*?)</code>|`(.*?)`"),
            // Bold before italic: both start with `*`.
            emphasis: vec![
                (re(r"\*\*(.*?)\*\*"), "<strong>$1</strong>"),
                (re(r"<b>(.*?)</b>"), "<strong>$1</strong>"),
                (re(r"\*(.*?)\*"), "<em>$1</em>"),
                (re(r"<i>(.*?)</i>"), "<em>$1</em>"),
                (re(r"__(.*?)__"), "<u>$1</u>"),
                (re(r"~~(.*?)~~"), "<s>$1</s>"),
            ],
        }
    })
}

/// Convert marker syntax to HTML.
///
/// The HTML spellings (`<b>`, `<i>`, `<pre>`, ...) are normalized to the same
/// output, and text that already uses the target tags passes through
/// unchanged. Code contents are protected from the emphasis rules.
pub fn convert_markers(input: &str) -> String {
    let p = patterns();

    let mut blocks: Vec<String> = Vec::new();
    let text = p.blocks.replace_all(input, |c: &Captures| {
        blocks.push(first_group(c).to_string());
        format!("\0BLOCK{}\0", blocks.len() - 1)
    });

    let mut codes: Vec<String> = Vec::new();
    let mut text = p
        .inline_code
        .replace_all(&text, |c: &Captures| {
            codes.push(first_group(c).to_string());
            format!("\0CODE{}\0", codes.len() - 1)
        })
        .into_owned();

    for (re, replacement) in &p.emphasis {
        text = re.replace_all(&text, *replacement).into_owned();
    }

    for (i, code) in codes.iter().enumerate() {
        text = text.replace(&format!("\0CODE{i}\0"), &format!("<code>{code}</code>"));
    }
    for (i, block) in blocks.iter().enumerate() {
        text = text.replace(
            &format!("\0BLOCK{i}\0"),
            &format!("{PRE_OPEN}{block}{PRE_CLOSE}"),
        );
    }

    text
}

fn first_group<'t>(c: &Captures<'t>) -> &'t str {
    c.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str())
        .unwrap_or("")
}
