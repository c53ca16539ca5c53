//! Markdown conversion
//!
//! Renders headings, paragraphs, lists, links, and code blocks into HTML
//! via pulldown-cmark, with tables, strikethrough, and task lists enabled.
//! The title is the text of the first top-level heading, if one exists.

use crate::convert::Fragment;
use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Converts markdown bytes into an HTML fragment plus extracted title
pub(crate) fn convert(bytes: &[u8]) -> Fragment {
    let text = String::from_utf8_lossy(bytes);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let events: Vec<Event> = Parser::new_ext(&text, options).collect();
    let title = extract_title(&events);

    let mut html_out = String::new();
    html::push_html(&mut html_out, events.into_iter());

    Fragment {
        html: html_out,
        title,
    }
}

/// Extracts the text of the first H1 heading, if any
fn extract_title(events: &[Event]) -> Option<String> {
    let mut in_h1 = false;
    let mut title = String::new();

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_h1 = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_h1 => {
                return Some(title);
            }
            Event::Text(text) | Event::Code(text) if in_h1 => {
                title.push_str(text);
            }
            _ => {}
        }
    }

    None
}
