//! The library code for the `articles` content build. It turns a directory of
//! markdown articles with YAML front matter into the JSON files the reader
//! site serves. The architecture breaks down into two passes:
//!
//! 1. Assembling each source on its own ([`crate::parser`]): splitting the
//!    front matter ([`crate::frontmatter`]), rendering the body to HTML with
//!    heading anchors and highlighted code ([`crate::markdown`]), and deriving
//!    the excerpt, reading time, and table of contents ([`crate::fields`]).
//! 2. Combining the published articles: resolving previous/next links
//!    ([`crate::resolve`]), counting articles per category, tag, and author
//!    ([`crate::index`]), and writing everything to disk ([`crate::write`]).
//!
//! The first pass is independent per file and runs in parallel. The second
//! can only start once every file is done, since any article may link to any
//! other. [`crate::build`] drives both and is what the command line calls.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod build;
pub mod config;
pub mod fields;
pub mod frontmatter;
pub mod highlight;
pub mod index;
pub mod markdown;
pub mod parser;
pub mod resolve;
pub mod scaffold;
pub mod slug;
pub mod util;
pub mod write;
