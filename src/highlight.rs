//! Code block highlighting using syntect. Output uses CSS classes rather than
//! inline colors so the site's stylesheet owns the theme.

use std::sync::OnceLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Prefix for the classes on every highlighted token span.
const TOKEN_CLASS_PREFIX: &str = "hljs-";

/// Language name used when a fence doesn't carry one.
pub const PLAIN_TEXT: &str = "plaintext";

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn find_syntax(lang: &str) -> &'static SyntaxReference {
    let ss = syntax_set();
    if lang.is_empty() {
        return ss.find_syntax_plain_text();
    }
    ss.find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}

/// Renders `code` as a complete `<pre><code>` block. `lang` is the first word
/// of the fence's info string; unknown or empty languages are highlighted as
/// plain text. Never fails: if the highlighter chokes, the code is emitted
/// escaped and unhighlighted.
pub fn code_block(code: &str, lang: &str) -> String {
    let label = if lang.is_empty() { PLAIN_TEXT } else { lang };
    let body = highlight(code, lang).unwrap_or_else(|err| {
        tracing::debug!("highlighting `{}` block failed: {}", label, err);
        escape_html(code)
    });
    format!(
        "<pre><code class=\"hljs language-{}\">{}</code></pre>\n",
        escape_html(label),
        body
    )
}

fn highlight(code: &str, lang: &str) -> Result<String, syntect::Error> {
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        find_syntax(lang),
        syntax_set(),
        ClassStyle::SpacedPrefixed {
            prefix: TOKEN_CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
