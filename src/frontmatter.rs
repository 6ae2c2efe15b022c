//! Defines the [`Frontmatter`] schema and [`split`], which separates an
//! article source into its YAML metadata block and its markdown body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const FENCE: &str = "---";

/// Whether an article is visible on the site. Drafts are parsed and listed but
/// never indexed or linked to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Status {
    #[default]
    Published,
    Draft,
}

impl Status {
    pub fn is_draft(self) -> bool {
        self == Status::Draft
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "published" => Ok(Status::Published),
            "draft" => Ok(Status::Draft),
            other => Err(format!(
                "unknown status `{}`; expected `published` or `draft`",
                other
            )),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            Status::Published => "published",
            Status::Draft => "draft",
        })
    }
}

/// The metadata block at the top of an article. Every field is optional at
/// this layer; the assembler decides which absences deserve a warning.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    /// Stable identifier used when syncing articles to external stores.
    pub id: Option<String>,

    pub title: Option<String>,
    pub subtitle: Option<String>,

    /// The author's display name.
    pub author: Option<String>,

    /// Overrides the slug that would otherwise be derived from `author`.
    pub author_slug: Option<String>,

    /// The publication date. Read as a calendar date (`YYYY-MM-DD`).
    pub date: Option<String>,
    pub updated: Option<String>,

    /// The category's display name.
    pub category: Option<String>,

    /// Tag display names, in the order they should be shown.
    pub tags: Option<Vec<String>>,

    pub feature_image: Option<String>,
    pub feature_image_alt: Option<String>,
    pub feature_image_caption: Option<String>,

    /// Replaces the excerpt generated from the body.
    pub excerpt: Option<String>,

    pub status: Option<Status>,

    pub validated_tutorial: Option<bool>,
    pub supported_evidence: Option<bool>,
    pub community_approved: Option<u32>,

    /// Slug of the previous article in a series. `prev` wins over `previous`
    /// when both are given.
    pub prev: Option<String>,
    pub previous: Option<String>,

    /// Slug of the next article in a series.
    pub next: Option<String>,
}

impl Frontmatter {
    /// The declared previous-article slug, if any.
    pub fn previous_slug(&self) -> Option<&str> {
        non_empty(self.prev.as_deref()).or_else(|| non_empty(self.previous.as_deref()))
    }

    /// The declared next-article slug, if any.
    pub fn next_slug(&self) -> Option<&str> {
        non_empty(self.next.as_deref())
    }
}

/// Treats empty and whitespace-only strings as absent.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Splits `input` into parsed [`Frontmatter`] and the markdown body that
/// follows it. The block must open with a `---` line and close with another
/// `---` line. A document that does not open with a fence has no metadata and
/// is returned whole as the body.
///
/// ```md
/// ---
/// title: Intro to Robotics
/// date: 2024-01-15
/// category: Science
/// ---
/// # Robots
/// ```
pub fn split(input: &str) -> Result<(Frontmatter, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let (yaml, body) = match fenced_block(input)? {
        Some(parts) => parts,
        None => return Ok((Frontmatter::default(), input)),
    };

    if yaml.trim().is_empty() {
        return Ok((Frontmatter::default(), body));
    }
    Ok((serde_yaml::from_str(yaml)?, body))
}

// Returns the YAML between the fences and the body after the closing fence,
// or `None` when the document doesn't open with a fence.
fn fenced_block(input: &str) -> Result<Option<(&str, &str)>> {
    let mut lines = input.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == FENCE => {}
        _ => return Ok(None),
    }

    let yaml_start = input.find('\n').map_or(input.len(), |i| i + 1);
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            return Ok(Some((&input[yaml_start..offset], &input[offset + line.len()..])));
        }
        offset += line.len();
    }
    Err(Error::MissingEndFence)
}

/// Represents the result of splitting front matter from a document.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed metadata block.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the opening `---` fence has no matching closing fence.
    #[error("missing closing `---` after front matter")]
    MissingEndFence,

    /// Returned when the metadata block isn't valid YAML or a field has the
    /// wrong type.
    #[error("invalid front matter: {0}")]
    DeserializeYaml(#[from] serde_yaml::Error),
}
