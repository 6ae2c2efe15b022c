//! Aggregates published articles into the category, tag, and author indices.
//! Indices are rebuilt from scratch on every build rather than patched, so a
//! count can never drift from the articles it describes.

use std::collections::HashMap;

use crate::article::{Article, AuthorIndex, CategoryIndex, EntityRef, IndexEntry, TagIndex};

/// The three entity indices for one build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Indices {
    pub categories: CategoryIndex,
    pub tags: TagIndex,
    pub authors: AuthorIndex,
}

/// Counts articles per entity, keyed by slug. Entries keep the order in which
/// their slug was first seen, and the display name seen first wins.
#[derive(Default)]
struct Counter {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl Counter {
    fn add(&mut self, entity: &EntityRef) {
        // Articles missing the field entirely have nothing to count.
        if entity.slug.is_empty() {
            return;
        }
        match self.positions.get(&entity.slug) {
            Some(&i) => self.entries[i].article_count += 1,
            None => {
                self.positions.insert(entity.slug.clone(), self.entries.len());
                self.entries.push(IndexEntry {
                    slug: entity.slug.clone(),
                    name: entity.name.clone(),
                    article_count: 1,
                });
            }
        }
    }

    fn into_entries(self) -> Vec<IndexEntry> {
        self.entries
    }
}

/// Indexes `articles` by category, tag, and author. Callers pass only the
/// published articles of the build.
pub fn build(articles: &[Article]) -> Indices {
    let mut categories = Counter::default();
    let mut tags = Counter::default();
    let mut authors = Counter::default();

    for article in articles {
        categories.add(&article.meta.category);
        for tag in &article.meta.tags {
            tags.add(tag);
        }
        authors.add(&article.meta.author);
    }

    Indices {
        categories: CategoryIndex {
            categories: categories.into_entries(),
        },
        tags: TagIndex {
            tags: tags.into_entries(),
        },
        authors: AuthorIndex {
            authors: authors.into_entries(),
        },
    }
}
