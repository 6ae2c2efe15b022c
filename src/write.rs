//! Serializes articles and indices to JSON files under the output directory.
//!
//! The layout is fixed:
//!
//! * `{output_directory}/articles/{slug}.json`: one full [`Article`] each
//! * `{output_directory}/articles.json`: the [`ArticlesIndex`]
//! * `{output_directory}/categories.json`, `tags.json`, `authors.json`
//!
//! Output is pretty-printed with a two-space indent and a trailing newline,
//! with keys in struct declaration order, so rebuilding unchanged sources only
//! changes `lastUpdated`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::article::{Article, ArticlesIndex};
use crate::index::Indices;

/// The directory, under the output directory, holding one file per article.
pub const ARTICLES_DIRECTORY: &str = "articles";
pub const ARTICLES_INDEX_FILE: &str = "articles.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const TAGS_FILE: &str = "tags.json";
pub const AUTHORS_FILE: &str = "authors.json";

/// Responsible for writing build artifacts to disk.
pub struct Writer<'a> {
    /// The root every artifact path is relative to.
    pub output_directory: &'a Path,
}

impl<'a> Writer<'a> {
    pub fn new(output_directory: &'a Path) -> Writer<'a> {
        Writer { output_directory }
    }

    /// The path of the artifact for the article with `slug`.
    pub fn article_path(&self, slug: &str) -> PathBuf {
        self.output_directory
            .join(ARTICLES_DIRECTORY)
            .join(format!("{}.json", slug))
    }

    /// Writes `articles/{slug}.json`.
    pub fn write_article(&self, article: &Article) -> Result<()> {
        write_json(&self.article_path(&article.meta.slug), article)
    }

    /// Writes `articles.json`.
    pub fn write_articles_index(&self, index: &ArticlesIndex) -> Result<()> {
        write_json(&self.output_directory.join(ARTICLES_INDEX_FILE), index)
    }

    /// Writes `categories.json`, `tags.json`, and `authors.json`.
    pub fn write_indices(&self, indices: &Indices) -> Result<()> {
        write_json(
            &self.output_directory.join(CATEGORIES_FILE),
            &indices.categories,
        )?;
        write_json(&self.output_directory.join(TAGS_FILE), &indices.tags)?;
        write_json(&self.output_directory.join(AUTHORS_FILE), &indices.authors)
    }

    /// Deletes the artifact for `slug`. Returns `false` if there was none.
    pub fn remove_article(&self, slug: &str) -> Result<bool> {
        let path = self.article_path(slug);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io { path, err: e }),
        }
    }
}

/// Writes `value` as pretty JSON to `path`, creating parent directories and
/// replacing whatever was there.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|err| Error::Io {
            path: dir.to_owned(),
            err,
        })?;
    }
    let mut json = serde_json::to_string_pretty(value).map_err(|err| Error::Serialize {
        path: path.to_owned(),
        err,
    })?;
    json.push('\n');
    fs::write(path, json).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// The result of a fallible artifact-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing artifacts. Unlike per-article parse errors,
/// these are fatal to a build.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a directory can't be created or a file can't be written
    /// or removed.
    #[error("writing `{}`: {err}", .path.display())]
    Io { path: PathBuf, err: io::Error },

    /// Returned when a value can't be serialized.
    #[error("serializing `{}`: {err}", .path.display())]
    Serialize { path: PathBuf, err: serde_json::Error },
}
