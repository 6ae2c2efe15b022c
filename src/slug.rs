//! The one place slugs come from. Category, tag, and author slugs, heading
//! anchors, and article slugs all go through this module so that articles and
//! indices can never disagree about an entity's slug.

use regex::Regex;
use std::sync::OnceLock;

/// The suffix every article source file carries.
pub const MARKDOWN_EXTENSION: &str = ".md";

fn date_prefix() -> &'static Regex {
    static DATE_PREFIX: OnceLock<Regex> = OnceLock::new();
    DATE_PREFIX.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-").expect("valid regex"))
}

/// Converts a display name into a lowercase, ASCII, hyphenated slug. `Science`
/// and `science` both become `science`; `Café Physics` becomes
/// `cafe-physics`.
pub fn slugify(name: &str) -> String {
    ::slug::slugify(name)
}

/// Derives the anchor id for a heading from its text. Headings with the same
/// text always get the same id; nothing is counted or remembered between
/// calls.
pub fn heading_id(text: &str) -> String {
    slugify(text)
}

/// Derives an article slug from its source name by stripping a leading
/// `YYYY-MM-DD-` prefix and a trailing `.md`. Casing is left alone, so
/// `2024-01-15-intro-to-robotics.md` becomes `intro-to-robotics`.
pub fn from_file_name(file_name: &str) -> String {
    let without_date = date_prefix().replace(file_name, "");
    without_date
        .strip_suffix(MARKDOWN_EXTENSION)
        .unwrap_or(&without_date)
        .to_owned()
}

/// Reports whether `file_name` follows the `YYYY-MM-DD-<rest>.md` naming
/// convention for flat article files.
pub fn is_dated_markdown(file_name: &str) -> bool {
    file_name.len() > MARKDOWN_EXTENSION.len()
        && date_prefix().is_match(file_name)
        && file_name.ends_with(MARKDOWN_EXTENSION)
        && !from_file_name(file_name).is_empty()
}
