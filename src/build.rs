//! Exports the [`Builder`], which stitches together the high-level steps of a
//! build: discovering sources ([`crate::parser::discover`]), assembling them in
//! parallel ([`crate::parser::Parser`]), resolving previous/next links
//! ([`crate::resolve`]), and writing the article, listing, and entity index
//! artifacts ([`crate::write`]). It also publishes the shared images directory.
//!
//! A single bad file never fails a build: it is logged, recorded in the
//! [`BuildReport`], and left out of every artifact. Only I/O problems with the
//! output directory are fatal.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use rayon::prelude::*;
use thiserror::Error;

use crate::article::{Article, ArticlesIndex, PendingArticle, Status};
use crate::config::Config;
use crate::fields;
use crate::frontmatter::non_empty;
use crate::index;
use crate::parser::{self, Parser, Source};
use crate::resolve::{resolve, DanglingRef};
use crate::util;
use crate::write::{self, Writer};

/// The steps of [`Builder::build_all`], in order. Logged at debug level on
/// entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Discovering,
    Processing,
    Resolving,
    Writing,
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Stage::Discovering => "discovering",
            Stage::Processing => "processing",
            Stage::Resolving => "resolving",
            Stage::Writing => "writing",
            Stage::Aggregating => "aggregating",
            Stage::Done => "done",
        })
    }
}

/// A source left out of a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// What a call to [`Builder::build_all`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// The number of published articles written.
    pub built: usize,

    /// The number of drafts left out.
    pub drafts: usize,

    pub skipped: Vec<SkippedFile>,
    pub dangling: Vec<DanglingRef>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Built {} articles ({} drafts, {} skipped, {} dangling references)",
            self.built,
            self.drafts,
            self.skipped.len(),
            self.dangling.len()
        )
    }
}

/// One line of [`Builder::list`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub file_name: String,
    pub slug: String,

    /// Empty when the front matter has no title or couldn't be parsed.
    pub title: String,

    pub status: Status,

    /// Set when the front matter couldn't be parsed.
    pub error: Option<String>,
}

/// Runs the build operations for one project.
pub struct Builder<'a> {
    config: &'a Config,
    parser: Parser,
    writer: Writer<'a>,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a Config) -> Builder<'a> {
        Builder {
            config,
            parser: Parser::new(config.excerpt_length, config.words_per_minute),
            writer: Writer::new(&config.output_directory),
        }
    }

    /// Rebuilds every artifact from the content directory. Bad files are
    /// skipped and reported rather than failing the build.
    pub fn build_all(&self) -> Result<BuildReport> {
        enter(Stage::Discovering);
        self.publish_images();
        let sources = self.discover_or_create()?;

        enter(Stage::Processing);
        let results = self.process(&sources)?;

        let mut report = BuildReport::default();
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        let mut published: Vec<PendingArticle> = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            let pending = match result {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::error!("skipping `{}`: {}", source.name, e);
                    report.skipped.push(SkippedFile {
                        file_name: source.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if let Some(first) = claimed.get(source.slug.as_str()) {
                let reason = format!("slug `{}` is already used by `{}`", source.slug, first);
                tracing::error!("skipping `{}`: {}", source.name, reason);
                report.skipped.push(SkippedFile {
                    file_name: source.name.clone(),
                    reason,
                });
                continue;
            }
            claimed.insert(&source.slug, &source.name);

            if pending.article.meta.status.is_draft() {
                tracing::debug!("`{}` is a draft", source.name);
                report.drafts += 1;
                continue;
            }
            published.push(pending);
        }

        enter(Stage::Resolving);
        let (mut articles, dangling) = resolve(published);
        report.dangling = dangling;

        enter(Stage::Writing);
        for article in &articles {
            self.writer.write_article(article)?;
            tracing::info!("✓ {}", article.meta.title);
        }
        report.built = articles.len();

        enter(Stage::Aggregating);
        articles.sort_by(newest_first);
        self.writer.write_articles_index(&ArticlesIndex {
            articles: articles.iter().map(|a| a.meta.clone()).collect(),
            total_count: articles.len(),
            last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })?;
        self.writer.write_indices(&index::build(&articles))?;

        enter(Stage::Done);
        Ok(report)
    }

    /// Writes the artifact for the article with exactly `slug`, then runs
    /// [`Builder::build_all`] so the indices and neighboring links catch up.
    /// The single artifact is written whatever the article's status, with its
    /// links unresolved.
    pub fn build_one(&self, slug: &str) -> Result<BuildReport> {
        let source = self.find(slug)?;
        match self.parser.parse_article(&source) {
            Ok(pending) => {
                let article = pending.into_unlinked();
                self.writer.write_article(&article)?;
                tracing::info!("✓ {}", article.meta.title);
            }
            Err(e) => tracing::error!("{}", e),
        }
        self.build_all()
    }

    /// Removes the source and the artifact for the article with exactly
    /// `slug`, then runs [`Builder::build_all`].
    pub fn delete(&self, slug: &str) -> Result<BuildReport> {
        let source = self.find(slug)?;
        util::remove(&source.path).map_err(|err| Error::Io {
            path: source.path.clone(),
            err,
        })?;
        tracing::info!("✓ Deleted: {}", source.name);

        if self.writer.remove_article(slug)? {
            tracing::info!("✓ Deleted JSON: {}.json", slug);
        }
        self.build_all()
    }

    /// Lists every source with its title and status, in file-name order. Only
    /// the front matter is read and nothing is written.
    pub fn list(&self) -> Result<Vec<Listing>> {
        let sources = match self.discover() {
            Ok(sources) => sources,
            Err(Error::Io { err, .. }) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(sources
            .iter()
            .map(|source| match self.parser.parse_frontmatter(source) {
                Ok(fm) => Listing {
                    file_name: source.name.clone(),
                    slug: source.slug.clone(),
                    title: non_empty(fm.title.as_deref())
                        .unwrap_or_default()
                        .to_owned(),
                    status: fm.status.unwrap_or_default(),
                    error: None,
                },
                Err(e) => Listing {
                    file_name: source.name.clone(),
                    slug: source.slug.clone(),
                    title: String::new(),
                    status: Status::default(),
                    error: Some(e.to_string()),
                },
            })
            .collect())
    }

    fn discover(&self) -> Result<Vec<Source>> {
        let dir = &self.config.content_directory;
        parser::discover(dir).map_err(|err| Error::Io {
            path: dir.clone(),
            err,
        })
    }

    // A content directory that doesn't exist yet is an empty corpus.
    fn discover_or_create(&self) -> Result<Vec<Source>> {
        match self.discover() {
            Err(Error::Io { path, err }) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("content directory `{}` not found; creating it", path.display());
                if let Err(e) = fs::create_dir_all(&path) {
                    tracing::warn!("creating `{}`: {}", path.display(), e);
                }
                Ok(Vec::new())
            }
            result => result,
        }
    }

    fn find(&self, slug: &str) -> Result<Source> {
        let sources = match self.discover() {
            Ok(sources) => sources,
            Err(Error::Io { err, .. }) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        sources
            .into_iter()
            .find(|source| source.slug == slug)
            .ok_or_else(|| Error::NotFound {
                slug: slug.to_owned(),
            })
    }

    fn process(&self, sources: &[Source]) -> Result<Vec<parser::Result<PendingArticle>>> {
        let article_parser = self.parser;
        let parse = || -> Vec<parser::Result<PendingArticle>> {
            sources
                .par_iter()
                .map(|source| article_parser.parse_article(source))
                .collect()
        };
        match self.config.threads {
            None => Ok(parse()),
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                Ok(pool.install(parse))
            }
        }
    }

    fn publish_images(&self) {
        let copied = util::copy_dir(
            &self.config.images_directory,
            &self.config.public_images_directory,
        );
        if copied > 0 {
            tracing::info!("✓ Copied {} images", copied);
        }
    }
}

fn enter(stage: Stage) {
    tracing::debug!(%stage, "build stage");
}

// Newest first by calendar date; articles without a usable date go last. Ties
// break on slug so the listing is stable across builds.
fn newest_first(a: &Article, b: &Article) -> Ordering {
    let date = |article: &Article| fields::calendar_date(&article.meta.published_at);
    match (date(a), date(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.meta.slug.cmp(&b.meta.slug))
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for build operations. Per-article problems are not errors;
/// see [`BuildReport::skipped`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the content directory or a source can't be read or
    /// removed.
    #[error("`{}`: {err}", .path.display())]
    Io { path: PathBuf, err: io::Error },

    /// Returned for errors writing artifacts.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned by [`Builder::build_one`] and [`Builder::delete`] when no
    /// source has the requested slug.
    #[error("Article not found: {slug}")]
    NotFound { slug: String },

    /// Returned when the configured worker pool can't be started.
    #[error("starting worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::path::Path;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn article_file(dir: &Path, name: &str, front_matter: &str, body: &str) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(name), format!("---\n{}\n---\n{}", front_matter, body))
    }

    fn read_json(path: &Path) -> std::result::Result<Value, Box<dyn std::error::Error>> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn robotics(config: &Config) -> io::Result<()> {
        article_file(
            &config.content_directory,
            "2024-01-15-intro-to-robotics.md",
            "title: Intro to Robotics\ndate: 2024-01-15\ncategory: Science\nauthor: Ada Lovelace",
            &"word ".repeat(1800),
        )?;
        article_file(
            &config.content_directory,
            "2024-02-01-advanced-robotics.md",
            "title: Advanced Robotics\ndate: 2024-02-01\ncategory: Science\nauthor: Ada Lovelace\nprev: intro-to-robotics",
            "## Going Further\n\nMore motors.\n",
        )
    }

    #[test]
    fn test_build_all_links_and_indexes_articles() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        robotics(&config)?;

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report.built, 2);
        assert!(report.skipped.is_empty());
        assert!(report.dangling.is_empty());

        let out = &config.output_directory;
        let advanced = read_json(&out.join("articles").join("advanced-robotics.json"))?;
        assert_eq!(advanced["previousArticle"]["slug"], "intro-to-robotics");
        assert_eq!(advanced["previousArticle"]["title"], "Intro to Robotics");
        assert!(advanced.get("nextArticle").is_none());
        assert!(advanced["content"]
            .as_str()
            .unwrap_or_default()
            .contains(r#"<h2 id="going-further">"#));

        let intro = read_json(&out.join("articles").join("intro-to-robotics.json"))?;
        assert_eq!(intro["readingTime"], 9);
        assert_eq!(intro["tags"], Value::Array(Vec::new()));

        let listing = read_json(&out.join("articles.json"))?;
        assert_eq!(listing["totalCount"], 2);
        assert_eq!(listing["articles"][0]["slug"], "advanced-robotics");
        assert_eq!(listing["articles"][1]["slug"], "intro-to-robotics");
        assert!(listing["articles"][0].get("content").is_none());

        let categories = read_json(&out.join("categories.json"))?;
        assert_eq!(
            categories["categories"],
            serde_json::json!([{"slug": "science", "name": "Science", "articleCount": 2}])
        );
        Ok(())
    }

    #[test]
    fn test_broken_file_is_skipped() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        robotics(&config)?;
        article_file(
            &config.content_directory,
            "2024-03-01-broken.md",
            "title: [unterminated",
            "Body\n",
        )?;

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report.built, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].file_name, "2024-03-01-broken.md");
        assert!(report.skipped[0].reason.contains("invalid front matter"));

        let out = &config.output_directory;
        assert!(!out.join("articles").join("broken.json").exists());
        let listing = fs::read_to_string(out.join("articles.json"))?;
        assert!(!listing.contains("broken"));
        Ok(())
    }

    #[test]
    fn test_dangling_reference_is_dropped() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        article_file(
            &config.content_directory,
            "2024-01-01-lonely.md",
            "title: Lonely\ndate: 2024-01-01\nnext: does-not-exist",
            "Body\n",
        )?;

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.dangling[0].missing_slug, "does-not-exist");
        assert_eq!(report.dangling[0].referrer_title, "Lonely");

        let lonely = read_json(&config.output_directory.join("articles").join("lonely.json"))?;
        assert!(lonely.get("nextArticle").is_none());
        Ok(())
    }

    #[test]
    fn test_category_casing_collapses() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        article_file(
            &config.content_directory,
            "2024-01-01-first.md",
            "title: First\ndate: 2024-01-01\ncategory: science",
            "Body\n",
        )?;
        article_file(
            &config.content_directory,
            "2024-01-02-second.md",
            "title: Second\ndate: 2024-01-02\ncategory: Science",
            "Body\n",
        )?;

        Builder::new(&config).build_all()?;
        let categories = read_json(&config.output_directory.join("categories.json"))?;
        assert_eq!(
            categories["categories"],
            serde_json::json!([{"slug": "science", "name": "science", "articleCount": 2}])
        );
        Ok(())
    }

    #[test]
    fn test_drafts_are_excluded_everywhere() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        article_file(
            &config.content_directory,
            "2024-01-01-secret.md",
            "title: Secret\ndate: 2024-01-01\ncategory: Hidden\nauthor: Eve\ntags: [covert]\nstatus: draft",
            "Body\n",
        )?;
        article_file(
            &config.content_directory,
            "2024-01-02-public.md",
            "title: Public\ndate: 2024-01-02\ncategory: Open\nprev: secret",
            "Body\n",
        )?;

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report.built, 1);
        assert_eq!(report.drafts, 1);
        assert_eq!(report.dangling.len(), 1);

        let out = &config.output_directory;
        assert!(!out.join("articles").join("secret.json").exists());
        for file in ["articles.json", "categories.json", "tags.json", "authors.json"] {
            let contents = fs::read_to_string(out.join(file))?;
            assert!(!contents.contains("secret"), "{} mentions the draft", file);
            assert!(!contents.contains("Hidden"), "{} mentions the draft", file);
            assert!(!contents.contains("covert"), "{} mentions the draft", file);
        }
        Ok(())
    }

    #[test]
    fn test_rebuild_only_changes_last_updated() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        robotics(&config)?;
        let builder = Builder::new(&config);
        let out = &config.output_directory;
        let files = [
            out.join("articles").join("intro-to-robotics.json"),
            out.join("articles").join("advanced-robotics.json"),
            out.join("categories.json"),
            out.join("tags.json"),
            out.join("authors.json"),
        ];

        builder.build_all()?;
        let before: Vec<String> = files
            .iter()
            .map(fs::read_to_string)
            .collect::<io::Result<_>>()?;
        let mut index_before = read_json(&out.join("articles.json"))?;

        builder.build_all()?;
        let after: Vec<String> = files
            .iter()
            .map(fs::read_to_string)
            .collect::<io::Result<_>>()?;
        let mut index_after = read_json(&out.join("articles.json"))?;

        assert_eq!(before, after);
        index_before["lastUpdated"] = Value::Null;
        index_after["lastUpdated"] = Value::Null;
        assert_eq!(index_before, index_after);
        Ok(())
    }

    #[test]
    fn test_sort_by_date_then_slug_with_undated_last() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        let content = &config.content_directory;
        article_file(content, "2024-01-01-b.md", "title: B\ndate: 2024-05-01", "")?;
        article_file(content, "2024-01-01-a.md", "title: A\ndate: 2024-05-01T23:00:00-05:00", "")?;
        article_file(content, "2024-01-01-c.md", "title: C\ndate: 2024-06-01", "")?;
        article_file(content, "2024-01-01-d.md", "title: D", "")?;

        Builder::new(&config).build_all()?;
        let listing = read_json(&config.output_directory.join("articles.json"))?;
        let slugs: Vec<&str> = listing["articles"]
            .as_array()
            .map(|a| a.iter().filter_map(|x| x["slug"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(slugs, vec!["c", "a", "b", "d"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_slug_first_wins() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        let content = &config.content_directory;
        article_file(content, "2024-01-01-twin.md", "title: Flat Twin\ndate: 2024-01-01", "")?;
        article_file(&content.join("twin"), parser::BUNDLE_INDEX, "title: Bundled Twin", "")?;

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report.built, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].file_name, "twin");

        let twin = read_json(&config.output_directory.join("articles").join("twin.json"))?;
        assert_eq!(twin["title"], "Flat Twin");
        Ok(())
    }

    #[test]
    fn test_missing_content_directory_is_an_empty_corpus() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report, BuildReport::default());
        assert!(config.content_directory.is_dir());

        let listing = read_json(&config.output_directory.join("articles.json"))?;
        assert_eq!(listing["totalCount"], 0);
        let tags = read_json(&config.output_directory.join("tags.json"))?;
        assert_eq!(tags["tags"], Value::Array(Vec::new()));
        Ok(())
    }

    #[test]
    fn test_images_are_published() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        fs::create_dir_all(&config.images_directory)?;
        fs::write(config.images_directory.join("robot.png"), "png")?;

        Builder::new(&config).build_all()?;
        assert_eq!(
            fs::read_to_string(config.public_images_directory.join("robot.png"))?,
            "png"
        );
        Ok(())
    }

    #[test]
    fn test_build_one_writes_draft_then_rebuilds() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        robotics(&config)?;
        article_file(
            &config.content_directory,
            "2024-03-01-preview.md",
            "title: Preview\ndate: 2024-03-01\nstatus: draft\nprev: intro-to-robotics",
            "Body\n",
        )?;

        let report = Builder::new(&config).build_one("preview")?;
        assert_eq!(report.built, 2);
        let preview = read_json(&config.output_directory.join("articles").join("preview.json"))?;
        assert_eq!(preview["status"], "draft");
        assert!(preview.get("previousArticle").is_none());

        let listing = read_json(&config.output_directory.join("articles.json"))?;
        assert_eq!(listing["totalCount"], 2);
        Ok(())
    }

    #[test]
    fn test_build_one_requires_exact_slug() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        robotics(&config)?;

        let err = Builder::new(&config)
            .build_one("robotics")
            .expect_err("substring must not match");
        assert!(matches!(err, Error::NotFound { slug } if slug == "robotics"));
        Ok(())
    }

    #[test]
    fn test_delete_removes_source_and_artifact() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        robotics(&config)?;
        let builder = Builder::new(&config);
        builder.build_all()?;

        let report = builder.delete("intro-to-robotics")?;
        assert_eq!(report.built, 1);
        assert_eq!(report.dangling.len(), 1);
        assert!(!config
            .content_directory
            .join("2024-01-15-intro-to-robotics.md")
            .exists());
        assert!(!config
            .output_directory
            .join("articles")
            .join("intro-to-robotics.json")
            .exists());

        let err = builder.delete("intro-to-robotics").expect_err("already gone");
        assert!(matches!(err, Error::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn test_list_reports_status_and_errors() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::with_root(dir.path());
        let content = &config.content_directory;
        article_file(content, "2024-01-01-live.md", "title: Live", "")?;
        article_file(content, "2024-01-02-wip.md", "title: Work in Progress\nstatus: draft", "")?;
        article_file(content, "2024-01-03-bad.md", "title: [oops", "")?;

        let listings = Builder::new(&config).list()?;
        let summary: Vec<(&str, &str, Status, bool)> = listings
            .iter()
            .map(|l| (l.slug.as_str(), l.title.as_str(), l.status, l.error.is_some()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("live", "Live", Status::Published, false),
                ("wip", "Work in Progress", Status::Draft, false),
                ("bad", "", Status::Published, true),
            ]
        );
        assert!(!config.output_directory.exists());
        Ok(())
    }

    #[test]
    fn test_configured_thread_pool() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut config = Config::with_root(dir.path());
        config.threads = Some(1);
        robotics(&config)?;

        let report = Builder::new(&config).build_all()?;
        assert_eq!(report.built, 2);
        assert_eq!(
            report.to_string(),
            "Built 2 articles (0 drafts, 0 skipped, 0 dangling references)"
        );
        Ok(())
    }
}
