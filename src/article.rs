//! The records the pipeline emits. Field names serialize in camelCase because
//! the site's client code reads these JSON files directly.

use serde::{Deserialize, Serialize};

pub use crate::frontmatter::Status;

/// A `{slug, name}` pair pointing at an author, category, or tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub slug: String,
    pub name: String,
}

/// A resolved link to another article in the same build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub slug: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureImage {
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Editorial trust signals shown as badges next to an article.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_tutorial: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_evidence: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_approved: Option<u32>,
}

impl Validation {
    /// Returns the badge set only when at least one badge is earned.
    pub fn earned(
        validated_tutorial: Option<bool>,
        supported_evidence: Option<bool>,
        community_approved: Option<u32>,
    ) -> Option<Validation> {
        let earned = validated_tutorial == Some(true)
            || supported_evidence == Some(true)
            || community_approved.is_some_and(|n| n > 0);
        earned.then_some(Validation {
            validated_tutorial,
            supported_evidence,
            community_approved,
        })
    }
}

/// One entry in an article's table of contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Everything about an article except its rendered body. This is what the
/// listing in `articles.json` carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub excerpt: String,
    pub author: EntityRef,
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub category: EntityRef,
    pub tags: Vec<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_image: Option<FeatureImage>,
    pub reading_time: u32,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    pub table_of_contents: Vec<TocItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_article: Option<ArticleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_article: Option<ArticleRef>,
}

/// A fully built article, written to `articles/<slug>.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub meta: ArticleMeta,

    /// The rendered HTML body.
    pub content: String,
}

/// An assembled article whose previous/next links are still raw slugs. Only
/// [`crate::resolve`] turns these into [`Article`]s, once every slug in the
/// build is known.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingArticle {
    pub article: Article,
    pub previous_slug: Option<String>,
    pub next_slug: Option<String>,
}

impl PendingArticle {
    /// Drops the unresolved links without looking them up.
    pub fn into_unlinked(self) -> Article {
        self.article
    }
}

/// The contents of `articles.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesIndex {
    pub articles: Vec<ArticleMeta>,
    pub total_count: usize,
    pub last_updated: String,
}

/// An author, category, or tag with the number of published articles that
/// reference it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub slug: String,
    pub name: String,
    pub article_count: usize,
}

/// The contents of `categories.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIndex {
    pub categories: Vec<IndexEntry>,
}

/// The contents of `tags.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndex {
    pub tags: Vec<IndexEntry>,
}

/// The contents of `authors.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorIndex {
    pub authors: Vec<IndexEntry>,
}
