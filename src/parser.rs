//! Defines the [`Parser`], which turns article sources on disk into
//! [`PendingArticle`]s, and [`discover`], which finds those sources. Articles
//! come out of the parser with their previous/next links still unresolved;
//! see [`crate::resolve`] for the second pass.

use std::{
    fs::{self, read_dir},
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use url::Url;

use crate::{
    article::{Article, ArticleMeta, EntityRef, FeatureImage, PendingArticle, Validation},
    fields,
    frontmatter::{self, non_empty, Frontmatter},
    markdown::Renderer,
    slug::{self, slugify},
};

/// The file inside a bundle directory that holds the article.
pub const BUNDLE_INDEX: &str = "index.md";

/// Where an article's markdown lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// A flat `YYYY-MM-DD-<slug>.md` file.
    File,

    /// A `[YYYY-MM-DD-]<slug>/` directory containing `index.md`.
    Bundle,
}

/// An article source found in the content directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// The directory entry's name, e.g. `2024-01-15-intro-to-robotics.md`.
    pub name: String,

    /// The entry itself: the markdown file or the bundle directory.
    pub path: PathBuf,

    pub kind: SourceKind,

    /// The slug derived from `name`.
    pub slug: String,
}

impl Source {
    /// The markdown file to read.
    pub fn markdown_path(&self) -> PathBuf {
        match self.kind {
            SourceKind::File => self.path.clone(),
            SourceKind::Bundle => self.path.join(BUNDLE_INDEX),
        }
    }
}

/// Lists the article sources in `content_directory`, sorted by name. Flat files
/// must follow the dated naming convention; directories count only when they
/// contain an `index.md`. Everything else (the shared `images/` directory,
/// notes, dotfiles) is ignored.
pub fn discover(content_directory: &Path) -> io::Result<Vec<Source>> {
    let mut sources = Vec::new();
    for result in read_dir(content_directory)? {
        let entry = result?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        let kind = if file_type.is_dir() && entry.path().join(BUNDLE_INDEX).is_file() {
            SourceKind::Bundle
        } else if file_type.is_file() && slug::is_dated_markdown(&name) {
            SourceKind::File
        } else {
            continue;
        };

        let slug = slug::from_file_name(&name);
        if slug.is_empty() {
            continue;
        }
        sources.push(Source {
            path: entry.path(),
            name,
            kind,
            slug,
        });
    }
    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}

/// Parses [`PendingArticle`] objects from article sources.
#[derive(Clone, Copy, Debug)]
pub struct Parser {
    renderer: Renderer,

    /// The maximum length of generated excerpts, in characters.
    excerpt_length: usize,

    /// The reading speed used for reading-time estimates.
    words_per_minute: u32,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(fields::DEFAULT_EXCERPT_LENGTH, fields::DEFAULT_WORDS_PER_MINUTE)
    }
}

impl Parser {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(excerpt_length: usize, words_per_minute: u32) -> Parser {
        Parser {
            renderer: Renderer::new(),
            excerpt_length,
            words_per_minute,
        }
    }

    /// Reads and assembles the article at `source`. Errors are annotated with
    /// the source path.
    pub fn parse_article(&self, source: &Source) -> Result<PendingArticle> {
        let path = source.markdown_path();
        self._parse_article(source, &path)
            .map_err(|e| Error::Annotated(path, Box::new(e)))
    }

    fn _parse_article(&self, source: &Source, path: &Path) -> Result<PendingArticle> {
        let contents = fs::read_to_string(path)?;
        let (frontmatter, body) = frontmatter::split(&contents)?;
        Ok(self.assemble(&source.name, &source.slug, &frontmatter, body))
    }

    /// Reads only the front matter of the article at `source`.
    pub fn parse_frontmatter(&self, source: &Source) -> Result<Frontmatter> {
        let path = source.markdown_path();
        let read = || -> Result<Frontmatter> {
            let contents = fs::read_to_string(&path)?;
            Ok(frontmatter::split(&contents)?.0)
        };
        read().map_err(|e| Error::Annotated(path.clone(), Box::new(e)))
    }

    /// Builds an article from its parts. Missing fields never fail the
    /// article; a missing title or date is logged because it breaks display
    /// and sorting. `name` only identifies the source in log lines.
    pub fn assemble(
        &self,
        name: &str,
        slug: &str,
        fm: &Frontmatter,
        body: &str,
    ) -> PendingArticle {
        let title = match non_empty(fm.title.as_deref()) {
            Some(title) => title.to_owned(),
            None => {
                tracing::warn!("{}: missing `title`", name);
                String::new()
            }
        };
        let published_at = match non_empty(fm.date.as_deref()) {
            Some(date) => {
                if fields::calendar_date(date).is_none() {
                    tracing::warn!("{}: `date` {:?} is not a YYYY-MM-DD date", name, date);
                }
                date.to_owned()
            }
            None => {
                tracing::warn!("{}: missing `date`", name);
                String::new()
            }
        };

        let excerpt = match non_empty(fm.excerpt.as_deref()) {
            Some(excerpt) => excerpt.to_owned(),
            None => fields::excerpt(body, self.excerpt_length),
        };
        let body = fields::inject_excerpt(&self.renderer, body, &excerpt);

        let author_name = non_empty(fm.author.as_deref()).unwrap_or_default();
        let author = EntityRef {
            slug: match non_empty(fm.author_slug.as_deref()) {
                Some(slug) => slug.to_owned(),
                None => slugify(author_name),
            },
            name: author_name.to_owned(),
        };
        let category_name = non_empty(fm.category.as_deref()).unwrap_or_default();
        let category = EntityRef {
            slug: slugify(category_name),
            name: category_name.to_owned(),
        };

        let feature_image =
            non_empty(fm.feature_image.as_deref()).map(|src| FeatureImage {
                src: feature_image_src(src),
                alt: non_empty(fm.feature_image_alt.as_deref())
                    .unwrap_or(title.as_str())
                    .to_owned(),
                caption: non_empty(fm.feature_image_caption.as_deref()).map(str::to_owned),
            });

        PendingArticle {
            article: Article {
                meta: ArticleMeta {
                    id: non_empty(fm.id.as_deref()).map(str::to_owned),
                    slug: slug.to_owned(),
                    subtitle: non_empty(fm.subtitle.as_deref()).map(str::to_owned),
                    excerpt,
                    author,
                    published_at,
                    updated_at: non_empty(fm.updated.as_deref()).map(str::to_owned),
                    category,
                    tags: tags(name, fm.tags.as_deref().unwrap_or_default()),
                    feature_image,
                    reading_time: fields::reading_time(&body, self.words_per_minute),
                    status: fm.status.unwrap_or_default(),
                    validation: Validation::earned(
                        fm.validated_tutorial,
                        fm.supported_evidence,
                        fm.community_approved,
                    ),
                    table_of_contents: fields::table_of_contents(&self.renderer, &body),
                    previous_article: None,
                    next_article: None,
                    title,
                },
                content: self.renderer.to_html(&body),
            },
            previous_slug: fm.previous_slug().map(str::to_owned),
            next_slug: fm.next_slug().map(str::to_owned),
        }
    }
}

// Converts tag names into references in front matter order. Tags that
// slugify to nothing are dropped, as are repeats of a slug already seen.
fn tags(name: &str, raw: &[String]) -> Vec<EntityRef> {
    let mut tags: Vec<EntityRef> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim();
        let slug = slugify(tag);
        if slug.is_empty() {
            tracing::warn!("{}: ignoring tag {:?} with an empty slug", name, tag);
            continue;
        }
        if tags.iter().any(|t| t.slug == slug) {
            continue;
        }
        tags.push(EntityRef {
            slug,
            name: tag.to_owned(),
        });
    }
    tags
}

// External images are normalized as URLs; anything else is a site path and is
// rooted at `/`.
fn feature_image_src(src: &str) -> String {
    match Url::parse(src) {
        Ok(url) if url.has_host() => url.to_string(),
        _ if src.starts_with('/') => src.to_owned(),
        _ => format!("/{}", src),
    }
}

/// Represents the result of a [`Parser`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a single article. These never abort a build;
/// the article is skipped instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the front matter is malformed.
    #[error(transparent)]
    Frontmatter(#[from] frontmatter::Error),

    /// Returned when the source can't be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// An error with the path of the article it came from.
    #[error("parsing article `{}`: {}", .0.display(), .1)]
    Annotated(PathBuf, #[source] Box<Error>),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::article::Status;
    use std::fs::{create_dir_all, write};

    fn parse(input: &str) -> PendingArticle {
        let (fm, body) = frontmatter::split(input).expect("valid front matter");
        Parser::default().assemble("test.md", "test", &fm, body)
    }

    #[test]
    fn test_discover_finds_files_and_bundles() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write(dir.path().join("2024-02-01-advanced-robotics.md"), "")?;
        write(dir.path().join("2024-01-15-intro-to-robotics.md"), "")?;
        write(dir.path().join("notes.md"), "")?;
        write(dir.path().join(".2024-01-01-hidden.md"), "")?;
        create_dir_all(dir.path().join("images"))?;
        create_dir_all(dir.path().join("2024-03-01-bundled"))?;
        write(dir.path().join("2024-03-01-bundled").join(BUNDLE_INDEX), "")?;
        create_dir_all(dir.path().join("undated"))?;
        write(dir.path().join("undated").join(BUNDLE_INDEX), "")?;

        let sources = discover(dir.path())?;
        let found: Vec<(&str, &SourceKind)> =
            sources.iter().map(|s| (s.slug.as_str(), &s.kind)).collect();
        assert_eq!(
            found,
            vec![
                ("intro-to-robotics", &SourceKind::File),
                ("advanced-robotics", &SourceKind::File),
                ("bundled", &SourceKind::Bundle),
                ("undated", &SourceKind::Bundle),
            ]
        );
        assert_eq!(
            sources[2].markdown_path(),
            dir.path().join("2024-03-01-bundled").join(BUNDLE_INDEX)
        );
        Ok(())
    }

    #[test]
    fn test_assemble_full_article() {
        let pending = parse(
            "---\nid: 5d1c\ntitle: Intro to Robotics\nsubtitle: ''\nauthor: Ada Lovelace\ndate: 2024-01-15\ncategory: Science\ntags: [Robots, Sensors, robots]\nfeature_image: images/robot.png\nvalidated_tutorial: true\nprev: basics\nnext: advanced-robotics\n---\n## Parts\n\nMotors and *sensors*.\n",
        );
        let meta = &pending.article.meta;

        assert_eq!(meta.id.as_deref(), Some("5d1c"));
        assert_eq!(meta.slug, "test");
        assert_eq!(meta.title, "Intro to Robotics");
        assert_eq!(meta.subtitle, None);
        assert_eq!(
            meta.author,
            EntityRef {
                slug: "ada-lovelace".to_owned(),
                name: "Ada Lovelace".to_owned(),
            }
        );
        assert_eq!(meta.category.slug, "science");
        let tag_slugs: Vec<&str> = meta.tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(tag_slugs, vec!["robots", "sensors"]);
        assert_eq!(
            meta.feature_image,
            Some(FeatureImage {
                src: "/images/robot.png".to_owned(),
                alt: "Intro to Robotics".to_owned(),
                caption: None,
            })
        );
        assert_eq!(meta.status, Status::Published);
        assert_eq!(meta.reading_time, 1);
        assert_eq!(meta.excerpt, "Motors and sensors.");
        assert_eq!(meta.table_of_contents.len(), 1);
        assert!(meta.validation.is_some());
        assert!(pending.article.content.contains(r#"<h2 id="parts">Parts</h2>"#));
        assert_eq!(pending.previous_slug.as_deref(), Some("basics"));
        assert_eq!(pending.next_slug.as_deref(), Some("advanced-robotics"));
        assert!(meta.previous_article.is_none());
    }

    #[test]
    fn test_assemble_is_best_effort_without_required_fields() {
        let pending = parse("No front matter at all.\n");
        let meta = &pending.article.meta;
        assert_eq!(meta.title, "");
        assert_eq!(meta.published_at, "");
        assert_eq!(meta.category.slug, "");
        assert_eq!(meta.author.name, "");
        assert_eq!(meta.status, Status::Published);
        assert_eq!(meta.excerpt, "No front matter at all.");
    }

    #[test]
    fn test_assemble_prefers_explicit_excerpt_and_author_slug() {
        let pending = parse(
            "---\ntitle: T\nauthor: Ada Lovelace\nauthor_slug: ada\nexcerpt: Hand written.\n---\n## Lesson Objectives\n\nBody text.\n",
        );
        let article = &pending.article;
        assert_eq!(article.meta.author.slug, "ada");
        assert_eq!(article.meta.excerpt, "Hand written.");
        assert!(article.content.starts_with("<p>Hand written.</p>"));
        assert_eq!(article.content.matches("Hand written.").count(), 1);
    }

    #[test]
    fn test_excerpt_is_not_spliced_into_code_blocks() {
        let pending = parse(
            "---\ntitle: T\nexcerpt: Hand written.\n---\n```md\n## Lesson Objectives\n```\n\n## Lesson Objectives\n",
        );
        let content = &pending.article.content;
        let code_end = content.find("</pre>").expect("rendered code block");
        let excerpt_at = content.find("<p>Hand written.</p>").expect("injected excerpt");
        assert!(code_end < excerpt_at);
        assert_eq!(content.matches("Hand written.").count(), 1);
    }

    #[test]
    fn test_external_feature_image_is_kept() {
        let pending = parse(
            "---\ntitle: T\nfeature_image: https://images.example.com/a.jpg\nfeature_image_alt: A robot\nfeature_image_caption: Photo\n---\n",
        );
        assert_eq!(
            pending.article.meta.feature_image,
            Some(FeatureImage {
                src: "https://images.example.com/a.jpg".to_owned(),
                alt: "A robot".to_owned(),
                caption: Some("Photo".to_owned()),
            })
        );
    }

    #[test]
    fn test_parse_article_annotates_errors() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("2024-03-01-broken.md");
        write(&path, "---\ntitle: [oops\n---\nBody\n")?;
        let source = Source {
            name: "2024-03-01-broken.md".to_owned(),
            path: path.clone(),
            kind: SourceKind::File,
            slug: "broken".to_owned(),
        };

        let err = Parser::default()
            .parse_article(&source)
            .expect_err("malformed front matter");
        assert!(err.to_string().contains("2024-03-01-broken.md"));
        assert!(matches!(err, Error::Annotated(p, _) if p == path));
        Ok(())
    }
}
