//! # articles CLI
//!
//! Builds the reader site's JSON content from the markdown articles.

use anyhow::{Context, Result};
use articles::build::{self, BuildReport, Builder};
use articles::config::Config;
use articles::frontmatter::Status;
use articles::scaffold::{self, NewArticle};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "articles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project file (defaults to the nearest `articles.yaml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build article JSON and the listing and entity indices
    Build {
        /// Rebuild every article (the default)
        #[arg(long, conflicts_with = "article")]
        all: bool,

        /// Build one article, then rebuild everything else
        #[arg(long, value_name = "SLUG")]
        article: Option<String>,
    },

    /// List article sources with their status
    List,

    /// Delete an article's source and JSON, then rebuild
    Delete {
        /// Article slug
        slug: String,
    },

    /// Create a new article source
    New(NewArgs),
}

#[derive(Args)]
struct NewArgs {
    /// Article title
    #[arg(long)]
    title: String,

    #[arg(long)]
    subtitle: Option<String>,

    /// Defaults to `default_author` from the project file
    #[arg(long)]
    author: Option<String>,

    /// Defaults to `default_category` from the project file
    #[arg(long)]
    category: Option<String>,

    /// Tags (comma separated)
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    #[arg(long)]
    feature_image: Option<String>,

    #[arg(long)]
    feature_image_alt: Option<String>,

    #[arg(long)]
    excerpt: Option<String>,

    /// `draft` or `published`
    #[arg(long, default_value = "draft")]
    status: Status,

    /// Publication date as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let builder = Builder::new(&config);

    match cli.command {
        Commands::Build { all, article } => match article {
            Some(slug) if !all => summarize(builder.build_one(&slug)),
            _ => summarize(builder.build_all()),
        },
        Commands::Delete { slug } => summarize(builder.delete(&slug)),
        Commands::List => list(&builder),
        Commands::New(args) => new_article(&config, args),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_project_file(path),
        None => {
            let cwd = std::env::current_dir().context("reading the working directory")?;
            Config::from_directory(&cwd)
        }
    }
}

// A missing article is reported but isn't a failure.
fn summarize(result: build::Result<BuildReport>) -> Result<()> {
    match result {
        Ok(report) => {
            for skipped in &report.skipped {
                println!("  [skipped] {}: {}", skipped.file_name, skipped.reason);
            }
            println!("\n✓ {}", report);
            Ok(())
        }
        Err(e @ build::Error::NotFound { .. }) => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => Err(e).context("build failed"),
    }
}

fn list(builder: &Builder) -> Result<()> {
    let listings = builder.list()?;
    if listings.is_empty() {
        println!("No articles found.");
        return Ok(());
    }
    println!("Articles:\n");
    for listing in listings {
        match &listing.error {
            Some(error) => {
                println!("  [error] {}", listing.file_name);
                tracing::debug!("{}", error);
            }
            None => {
                println!("  [{}] {}", listing.status, listing.title);
                println!("         {}", listing.file_name);
            }
        }
    }
    Ok(())
}

fn new_article(config: &Config, args: NewArgs) -> Result<()> {
    let created = scaffold::create(
        config,
        &NewArticle {
            title: args.title,
            subtitle: args.subtitle,
            author: args.author,
            category: args.category,
            tags: args.tags,
            feature_image: args.feature_image,
            feature_image_alt: args.feature_image_alt,
            excerpt: args.excerpt,
            status: args.status,
            date: args.date,
        },
    )?;
    println!("✓ Article created");
    println!("  File: {}", created.file_name);
    println!("  Slug: {}", created.slug);
    println!("  UUID: {}", created.id);
    println!("  Path: {}", created.path.display());
    Ok(())
}
