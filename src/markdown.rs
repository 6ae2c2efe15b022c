//! Converts article markdown into HTML. On top of stock CommonMark rendering,
//! every heading gets an `id` derived from its text (see
//! [`crate::slug::heading_id`]) and fenced code blocks are highlighted (see
//! [`crate::highlight`]). The same event stream feeds [`headings`], which is
//! how the table of contents is guaranteed to match the rendered anchors.

use crate::highlight;
use crate::slug::heading_id;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

/// A heading found in a markdown document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Renders markdown to HTML. Holds only parser options, so a single renderer
/// can be shared across threads and every call is independent of the ones
/// before it.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    options: Options,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        Renderer { options }
    }

    /// Converts `markdown` to an HTML string.
    pub fn to_html(&self, markdown: &str) -> String {
        let mut events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        assign_heading_ids(&mut events);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, highlight_code_blocks(events).into_iter());
        out
    }

    /// Returns every heading in `markdown` in document order, with the id the
    /// renderer gives it.
    pub fn headings(&self, markdown: &str) -> Vec<Heading> {
        self.located_headings(markdown)
            .into_iter()
            .map(|(_, heading)| heading)
            .collect()
    }

    /// Like [`Renderer::headings`], paired with the byte offset in `markdown`
    /// where each heading's source starts. Lines inside code blocks are never
    /// headings.
    pub fn located_headings(&self, markdown: &str) -> Vec<(usize, Heading)> {
        let mut headings = Vec::new();
        let mut open: Option<(usize, u8, String)> = None;
        for (event, range) in Parser::new_ext(markdown, self.options).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    open = Some((range.start, level as u8, String::new()));
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, _, buffer)) = open.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some((_, _, buffer)) = open.as_mut() {
                        buffer.push(' ');
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((offset, level, text)) = open.take() {
                        let text = text.trim().to_owned();
                        headings.push((
                            offset,
                            Heading {
                                level,
                                id: heading_id(&text),
                                text,
                            },
                        ));
                    }
                }
                _ => {}
            }
        }
        headings
    }
}

// Fills in the `id` of every heading that doesn't already have one, using the
// text collected between its start and end events.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut start: Option<usize> = None;
    let mut text = String::new();
    for i in 0..events.len() {
        if let Event::Start(Tag::Heading { .. }) = events[i] {
            start = Some(i);
            text.clear();
        } else if let Event::Text(t) | Event::Code(t) = &events[i] {
            if start.is_some() {
                text.push_str(t);
            }
        } else if let Event::SoftBreak | Event::HardBreak = events[i] {
            if start.is_some() {
                text.push(' ');
            }
        } else if let Event::End(TagEnd::Heading(_)) = events[i] {
            if let Some(s) = start.take() {
                if let Event::Start(Tag::Heading { id, .. }) = &mut events[s] {
                    if id.is_none() {
                        *id = Some(CowStr::from(heading_id(text.trim())));
                    }
                }
            }
        }
    }
}

// Replaces each code block's start/text/end events with a single pre-rendered
// HTML event.
fn highlight_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut block: Option<(String, String)> = None;
    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_owned()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                block = Some((lang, String::new()));
            }
            Event::Text(text) if block.is_some() => {
                if let Some((_, code)) = block.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = block.take() {
                    out.push(Event::Html(CowStr::from(highlight::code_block(&code, &lang))));
                }
            }
            ev => out.push(ev),
        }
    }
    out
}
