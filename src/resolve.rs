//! The second pass over a build: turns each article's declared previous/next
//! slugs into `{slug, title}` references. It has to run after every article in
//! the build has been assembled, since an article may point forward at one
//! that comes later in file order.

use std::collections::HashMap;
use std::fmt;

use crate::article::{Article, ArticleRef, PendingArticle};

/// Which link a [`DanglingRef`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Direction::Previous => "Previous",
            Direction::Next => "Next",
        })
    }
}

/// A previous/next slug that didn't match any published article in the build.
/// The link is dropped from the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingRef {
    pub direction: Direction,

    /// The slug that couldn't be found.
    pub missing_slug: String,

    /// The slug and title of the article that declared the link.
    pub referrer_slug: String,
    pub referrer_title: String,
}

impl fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} article \"{}\" not found for \"{}\"",
            self.direction, self.missing_slug, self.referrer_title
        )
    }
}

/// Resolves the links of every article in `pending` against the titles in the
/// same collection. `pending` should hold exactly the published articles of
/// the build, so drafts can't be linked to. Links that can't be resolved are
/// dropped and reported; nothing here fails.
pub fn resolve(pending: Vec<PendingArticle>) -> (Vec<Article>, Vec<DanglingRef>) {
    let titles: HashMap<String, String> = pending
        .iter()
        .map(|p| (p.article.meta.slug.clone(), p.article.meta.title.clone()))
        .collect();

    let mut dangling = Vec::new();
    let articles = pending
        .into_iter()
        .map(|p| {
            let PendingArticle {
                mut article,
                previous_slug,
                next_slug,
            } = p;
            article.meta.previous_article =
                lookup(&titles, &article, Direction::Previous, previous_slug, &mut dangling);
            article.meta.next_article =
                lookup(&titles, &article, Direction::Next, next_slug, &mut dangling);
            article
        })
        .collect();
    (articles, dangling)
}

fn lookup(
    titles: &HashMap<String, String>,
    referrer: &Article,
    direction: Direction,
    slug: Option<String>,
    dangling: &mut Vec<DanglingRef>,
) -> Option<ArticleRef> {
    let slug = slug?;
    match titles.get(&slug) {
        Some(title) => Some(ArticleRef {
            title: title.clone(),
            slug,
        }),
        None => {
            let missing = DanglingRef {
                direction,
                missing_slug: slug,
                referrer_slug: referrer.meta.slug.clone(),
                referrer_title: referrer.meta.title.clone(),
            };
            tracing::warn!("{}", missing);
            dangling.push(missing);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter;
    use crate::parser::Parser;

    fn pending(slug: &str, title: &str, prev: Option<&str>, next: Option<&str>) -> PendingArticle {
        let mut input = format!("---\ntitle: {}\ndate: 2024-01-01\n", title);
        if let Some(prev) = prev {
            input.push_str(&format!("prev: {}\n", prev));
        }
        if let Some(next) = next {
            input.push_str(&format!("next: {}\n", next));
        }
        input.push_str("---\nBody\n");
        let (fm, body) = frontmatter::split(&input).expect("valid front matter");
        Parser::default().assemble(slug, slug, &fm, body)
    }

    #[test]
    fn test_forward_and_backward_references_resolve() {
        let (articles, dangling) = resolve(vec![
            pending("intro", "Intro", None, Some("advanced")),
            pending("advanced", "Advanced", Some("intro"), None),
        ]);
        assert!(dangling.is_empty());
        assert_eq!(
            articles[0].meta.next_article,
            Some(ArticleRef {
                slug: "advanced".to_owned(),
                title: "Advanced".to_owned(),
            })
        );
        assert_eq!(
            articles[1].meta.previous_article,
            Some(ArticleRef {
                slug: "intro".to_owned(),
                title: "Intro".to_owned(),
            })
        );
    }

    #[test]
    fn test_asymmetric_references_are_fine() {
        let (articles, dangling) = resolve(vec![
            pending("a", "A", None, Some("b")),
            pending("b", "B", None, None),
        ]);
        assert!(dangling.is_empty());
        assert!(articles[0].meta.next_article.is_some());
        assert!(articles[1].meta.previous_article.is_none());
    }

    #[test]
    fn test_dangling_reference_is_dropped_and_reported() {
        let (articles, dangling) =
            resolve(vec![pending("lonely", "Lonely Article", None, Some("does-not-exist"))]);
        assert!(articles[0].meta.next_article.is_none());
        assert_eq!(
            dangling,
            vec![DanglingRef {
                direction: Direction::Next,
                missing_slug: "does-not-exist".to_owned(),
                referrer_slug: "lonely".to_owned(),
                referrer_title: "Lonely Article".to_owned(),
            }]
        );
        let message = dangling[0].to_string();
        assert!(message.contains("does-not-exist"));
        assert!(message.contains("Lonely Article"));
    }

    #[test]
    fn test_self_reference_resolves() {
        let (articles, _) = resolve(vec![pending("loop", "Loop", Some("loop"), None)]);
        assert_eq!(
            articles[0].meta.previous_article.as_ref().map(|r| r.slug.as_str()),
            Some("loop")
        );
    }
}
