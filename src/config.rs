//! Loads the `articles.yaml` project file. Every key is optional; a project
//! with no file at all builds with the defaults relative to the working
//! directory.

use crate::fields::{DEFAULT_EXCERPT_LENGTH, DEFAULT_WORDS_PER_MINUTE};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "articles.yaml";

/// The category given to scaffolded articles when none is passed.
pub const DEFAULT_CATEGORY: &str = "Tutorial";

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Project {
    content_directory: PathBuf,
    images_directory: PathBuf,
    output_directory: PathBuf,
    public_images_directory: PathBuf,
    excerpt_length: usize,
    words_per_minute: u32,
    threads: Option<usize>,
    default_author: Option<String>,
    default_category: String,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            content_directory: PathBuf::from("content"),
            images_directory: PathBuf::from("content/images"),
            output_directory: PathBuf::from("data"),
            public_images_directory: PathBuf::from("public/images"),
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            threads: None,
            default_author: None,
            default_category: DEFAULT_CATEGORY.to_owned(),
        }
    }
}

/// The resolved configuration for a project. All paths are absolute or
/// relative to the process's working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Where the article sources live.
    pub content_directory: PathBuf,

    /// The shared images directory, copied verbatim into
    /// `public_images_directory` on every build.
    pub images_directory: PathBuf,

    /// The root of the JSON artifacts.
    pub output_directory: PathBuf,

    pub public_images_directory: PathBuf,

    pub excerpt_length: usize,
    pub words_per_minute: u32,

    /// The number of threads used to process articles. `None` means rayon's
    /// global pool.
    pub threads: Option<usize>,

    pub default_author: Option<String>,
    pub default_category: String,
}

impl Config {
    /// Looks for `articles.yaml` in `dir` and each of its ancestors, using the
    /// first one found. Falls back to the defaults, rooted at `dir`, if there is
    /// none.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for candidate in dir.ancestors() {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path)
                    .map_err(|e| anyhow!("Loading configuration: {:#}", e));
            }
        }
        tracing::debug!(
            "no `{}` found above `{}`; using defaults",
            PROJECT_FILE,
            dir.display()
        );
        Ok(Config::from_project(Project::default(), dir))
    }

    /// Loads the project file at `path`. Relative paths inside it resolve
    /// against the file's directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Opening project file `{}`: {}", path.display(), e))?;
        let project: Project = serde_yaml::from_reader(file)
            .map_err(|e| anyhow!("Parsing project file `{}`: {}", path.display(), e))?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(project, project_root)),
        }
    }

    /// The defaults, rooted at `root`.
    pub fn with_root(root: &Path) -> Config {
        Config::from_project(Project::default(), root)
    }

    fn from_project(project: Project, root: &Path) -> Config {
        Config {
            content_directory: root.join(project.content_directory),
            images_directory: root.join(project.images_directory),
            output_directory: root.join(project.output_directory),
            public_images_directory: root.join(project.public_images_directory),
            excerpt_length: project.excerpt_length,
            words_per_minute: project.words_per_minute,
            threads: project.threads,
            default_author: project.default_author,
            default_category: project.default_category,
        }
    }
}
