//! Creates new article sources with a complete front matter block, so authors
//! start from every field the build understands.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::article::Status;
use crate::config::Config;
use crate::slug::{slugify, MARKDOWN_EXTENSION};

/// The feature image given to new articles when none is passed.
pub const PLACEHOLDER_IMAGE: &str = "/images/articles/placeholder.jpg";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The author-supplied parts of a new article. Everything but the title has a
/// default.
#[derive(Clone, Debug, Default)]
pub struct NewArticle {
    pub title: String,
    pub subtitle: Option<String>,

    /// Falls back to the project's `default_author`.
    pub author: Option<String>,

    /// Falls back to the project's `default_category`.
    pub category: Option<String>,

    pub tags: Vec<String>,
    pub feature_image: Option<String>,
    pub feature_image_alt: Option<String>,
    pub excerpt: Option<String>,
    pub status: Status,

    /// Falls back to today's local date.
    pub date: Option<NaiveDate>,
}

/// What [`create`] wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Created {
    pub path: PathBuf,
    pub file_name: String,
    pub slug: String,
    pub id: Uuid,
}

// Field order here is the order in the generated file.
#[derive(Serialize)]
struct Scaffold<'a> {
    id: String,
    title: &'a str,
    subtitle: &'a str,
    author: &'a str,
    author_slug: String,
    date: String,
    category: &'a str,
    tags: Vec<String>,
    feature_image: &'a str,
    feature_image_alt: &'a str,
    feature_image_caption: &'a str,
    excerpt: &'a str,
    status: Status,
    prev: Option<&'a str>,
    next: Option<&'a str>,
}

/// Writes a new `YYYY-MM-DD-<slug>.md` source into the content directory.
/// Never overwrites an existing file.
pub fn create(config: &Config, new: &NewArticle) -> Result<Created> {
    let title = new.title.trim();
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(Error::EmptySlug {
            title: title.to_owned(),
        });
    }
    let author = non_blank(new.author.as_deref())
        .or_else(|| non_blank(config.default_author.as_deref()))
        .ok_or(Error::MissingAuthor)?;
    let category =
        non_blank(new.category.as_deref()).unwrap_or(config.default_category.as_str());

    let date = new
        .date
        .unwrap_or_else(|| Local::now().date_naive())
        .format(DATE_FORMAT)
        .to_string();
    let id = Uuid::new_v4();
    let scaffold = Scaffold {
        id: id.to_string(),
        title,
        subtitle: non_blank(new.subtitle.as_deref()).unwrap_or_default(),
        author,
        author_slug: slugify(author),
        category,
        tags: normalize_tags(&new.tags),
        feature_image: non_blank(new.feature_image.as_deref()).unwrap_or(PLACEHOLDER_IMAGE),
        feature_image_alt: non_blank(new.feature_image_alt.as_deref()).unwrap_or(title),
        feature_image_caption: "",
        excerpt: non_blank(new.excerpt.as_deref()).unwrap_or_default(),
        status: new.status,
        prev: None,
        next: None,
        date: date.clone(),
    };
    let front_matter = serde_yaml::to_string(&scaffold)?;
    let contents = format!(
        "---\n{}---\n\n# {}\n\nStart writing your article here...\n",
        front_matter, title
    );

    let file_name = format!("{}-{}{}", date, slug, MARKDOWN_EXTENSION);
    let path = config.content_directory.join(&file_name);
    fs::create_dir_all(&config.content_directory).map_err(|err| Error::Io {
        path: config.content_directory.clone(),
        err,
    })?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::Exists { path })
        }
        Err(err) => return Err(Error::Io { path, err }),
    };
    file.write_all(contents.as_bytes())
        .map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;

    Ok(Created {
        path,
        file_name,
        slug,
        id,
    })
}

// Tags are stored lowercase, without blanks or repeats.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the title has nothing to build a file name from.
    #[error("title {title:?} doesn't produce a usable slug")]
    EmptySlug { title: String },

    /// Returned when no author was given and the project has no
    /// `default_author`.
    #[error("no author given and no `default_author` configured")]
    MissingAuthor,

    #[error("File already exists: {}", .path.display())]
    Exists { path: PathBuf },

    #[error("writing `{}`: {err}", .path.display())]
    Io { path: PathBuf, err: io::Error },

    #[error("serializing front matter: {0}")]
    Serialize(#[from] serde_yaml::Error),
}
