//! Pure functions computing the fields of an article that aren't written in
//! its front matter: excerpt, reading time, and table of contents.

use crate::article::TocItem;
use crate::markdown::Renderer;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Default maximum excerpt length, in characters.
pub const DEFAULT_EXCERPT_LENGTH: usize = 160;

/// Default reading speed, in words per minute.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

const ELLIPSIS: &str = "...";

struct ExcerptPatterns {
    heading: Regex,
    image: Regex,
    link: Regex,
    markup: Regex,
    newlines: Regex,
}

fn excerpt_patterns() -> &'static ExcerptPatterns {
    static PATTERNS: OnceLock<ExcerptPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ExcerptPatterns {
        heading: Regex::new(r"(?m)^#+[ \t]+.*$").expect("valid regex"),
        image: Regex::new(r"!\[[^\]]*?\]\([^)]*?\)").expect("valid regex"),
        link: Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"),
        markup: Regex::new(r"[*_`~]").expect("valid regex"),
        newlines: Regex::new(r"(?:\r?\n)+").expect("valid regex"),
    })
}

/// Text marking the heading the excerpt is injected before, e.g.
/// `## 🎯 Lesson Objectives`.
const LESSON_OBJECTIVES: &str = "Lesson Objectives";

/// Builds a plain-text excerpt from raw markdown: headings and images are
/// dropped, links keep only their text, emphasis and code markers are removed,
/// and line breaks become spaces. Text longer than `length` characters is cut
/// at `length` and gets a trailing `...`.
pub fn excerpt(markdown: &str, length: usize) -> String {
    let p = excerpt_patterns();
    let text = p.heading.replace_all(markdown, "");
    let text = p.image.replace_all(&text, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.markup.replace_all(&text, "");
    let text = p.newlines.replace_all(&text, " ");
    let text = text.trim();

    if text.chars().count() <= length {
        return text.to_owned();
    }
    let cut: String = text.chars().take(length).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// Estimates minutes to read `markdown` at `words_per_minute`, rounded up.
/// Never less than one minute.
pub fn reading_time(markdown: &str, words_per_minute: u32) -> u32 {
    let words = markdown.split_whitespace().count() as u64;
    let wpm = u64::from(words_per_minute.max(1));
    let minutes = (words + wpm - 1) / wpm;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// Inserts `excerpt` as its own paragraph right before the first level-2
/// heading whose text contains "Lesson Objectives". Headings are found with
/// the renderer's own parser, so matching lines inside code blocks don't
/// count. Bodies without such a heading, and empty excerpts, are returned
/// unchanged.
pub fn inject_excerpt(renderer: &Renderer, markdown: &str, excerpt: &str) -> String {
    let excerpt = excerpt.trim();
    if excerpt.is_empty() {
        return markdown.to_owned();
    }
    let target = renderer
        .located_headings(markdown)
        .into_iter()
        .find(|(_, h)| h.level == 2 && h.text.contains(LESSON_OBJECTIVES));
    match target {
        Some((offset, _)) => format!(
            "{}{}\n\n{}",
            &markdown[..offset],
            excerpt,
            &markdown[offset..]
        ),
        None => markdown.to_owned(),
    }
}

/// Reads the calendar date at the start of a front matter date. Both
/// `2024-01-15` and `2024-01-15T09:30:00-05:00` give 15 January 2024: the date
/// as written wins and no timezone conversion happens.
pub fn calendar_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()
}

/// Lists the level-2 and level-3 headings of `markdown` in document order.
pub fn table_of_contents(renderer: &Renderer, markdown: &str) -> Vec<TocItem> {
    renderer
        .headings(markdown)
        .into_iter()
        .filter(|h| h.level == 2 || h.level == 3)
        .map(|h| TocItem {
            id: h.id,
            text: h.text,
            level: h.level,
        })
        .collect()
}
