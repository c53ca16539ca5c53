//! Word document conversion
//!
//! A `.docx` file is a zip archive whose body lives in `word/document.xml`.
//! This converter extracts paragraphs, heading styles, and list items into
//! equivalent HTML, and inlines embedded images as base64 data URIs resolved
//! through the document's relationships part. Inlining keeps the output a
//! single fragment per document and the same input bytes always produce the
//! same fragment.
//!
//! The title is the text of the first heading-styled paragraph, if any.

use crate::convert::{escape_html, Fragment};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// A paragraph-level block extracted from the document body
struct Block {
    kind: BlockKind,
    text: String,
    image_ids: Vec<String>,
}

enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem,
}

/// Converts docx bytes into an HTML fragment plus extracted title
///
/// Errors are returned as plain reason strings; the dispatcher wraps them
/// into per-file conversion errors.
pub(crate) fn convert(bytes: &[u8]) -> Result<Fragment, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("not a valid docx archive: {}", e))?;

    let document_xml = read_archive_string(&mut archive, "word/document.xml")?;
    let relationships = parse_relationships(&mut archive)?;

    let blocks = parse_document(&document_xml)?;
    let title = blocks.iter().find_map(|b| match b.kind {
        BlockKind::Heading(_) if !b.text.trim().is_empty() => Some(b.text.clone()),
        _ => None,
    });

    let html = render_blocks(&blocks, &relationships, &mut archive);

    Ok(Fragment { html, title })
}

/// Reads a file from the archive into a string
fn read_archive_string(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, String> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| format!("missing {} in archive", name))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("failed to read {}: {}", name, e))?;
    Ok(content)
}

/// Parses the relationship part mapping image ids to media targets
///
/// A document without images has no interesting relationships; a missing
/// relationships part is treated as an empty map.
fn parse_relationships(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
) -> Result<HashMap<String, String>, String> {
    let xml = match read_archive_string(archive, "word/_rels/document.xml.rels") {
        Ok(xml) => xml,
        Err(_) => return Ok(HashMap::new()),
    };

    let mut map = HashMap::new();
    let mut reader = Reader::from_str(&xml);

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) | Ok(XmlEvent::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attribute_value(&e, "Id");
                let target = attribute_value(&e, "Target");
                if let (Some(id), Some(target)) = (id, target) {
                    map.insert(id, target);
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => return Err(format!("malformed relationships XML: {}", e)),
            _ => {}
        }
    }

    Ok(map)
}

/// Parses `word/document.xml` into a flat sequence of blocks
fn parse_document(xml: &str) -> Result<Vec<Block>, String> {
    let mut reader = Reader::from_str(xml);
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    current = Some(Block {
                        kind: BlockKind::Paragraph,
                        text: String::new(),
                        image_ids: Vec::new(),
                    });
                }
                b"w:t" => in_text_run = true,
                b"w:pStyle" => apply_style(&mut current, attribute_value(&e, "w:val")),
                b"w:numPr" => apply_list(&mut current),
                b"a:blip" => apply_image(&mut current, attribute_value(&e, "r:embed")),
                _ => {}
            },
            Ok(XmlEvent::Empty(e)) => match e.name().as_ref() {
                b"w:pStyle" => apply_style(&mut current, attribute_value(&e, "w:val")),
                b"w:numPr" => apply_list(&mut current),
                b"a:blip" => apply_image(&mut current, attribute_value(&e, "r:embed")),
                b"w:br" | b"w:tab" => {
                    if let Some(block) = current.as_mut() {
                        block.text.push(' ');
                    }
                }
                _ => {}
            },
            Ok(XmlEvent::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| format!("malformed document XML: {}", e))?;
                if let Some(block) = current.as_mut() {
                    block.text.push_str(&text);
                }
            }
            Ok(XmlEvent::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => {
                    if let Some(block) = current.take() {
                        if !block.text.trim().is_empty() || !block.image_ids.is_empty() {
                            blocks.push(block);
                        }
                    }
                }
                _ => {}
            },
            Ok(XmlEvent::Eof) => break,
            Err(e) => return Err(format!("malformed document XML: {}", e)),
            _ => {}
        }
    }

    Ok(blocks)
}

/// Applies a paragraph style value (e.g. "Heading1") to the current block
fn apply_style(current: &mut Option<Block>, style: Option<String>) {
    let (Some(block), Some(style)) = (current.as_mut(), style) else {
        return;
    };
    if let Some(level) = style.strip_prefix("Heading") {
        if let Ok(level) = level.parse::<u8>() {
            if (1..=9).contains(&level) {
                block.kind = BlockKind::Heading(level.min(6));
            }
        }
    }
}

/// Marks the current block as a list item
fn apply_list(current: &mut Option<Block>) {
    if let Some(block) = current.as_mut() {
        if matches!(block.kind, BlockKind::Paragraph) {
            block.kind = BlockKind::ListItem;
        }
    }
}

/// Records an embedded image reference on the current block
fn apply_image(current: &mut Option<Block>, relationship_id: Option<String>) {
    if let (Some(block), Some(id)) = (current.as_mut(), relationship_id) {
        block.image_ids.push(id);
    }
}

/// Renders parsed blocks as HTML, grouping consecutive list items
fn render_blocks(
    blocks: &[Block],
    relationships: &HashMap<String, String>,
    archive: &mut ZipArchive<Cursor<&[u8]>>,
) -> String {
    let mut html = String::new();
    let mut in_list = false;

    for block in blocks {
        let is_list_item = matches!(block.kind, BlockKind::ListItem);
        if in_list && !is_list_item {
            html.push_str("</ul>\n");
            in_list = false;
        }
        if is_list_item && !in_list {
            html.push_str("<ul>\n");
            in_list = true;
        }

        let mut inner = escape_html(&block.text);
        for id in &block.image_ids {
            if let Some(tag) = inline_image(id, relationships, archive) {
                inner.push_str(&tag);
            }
        }

        match block.kind {
            BlockKind::Heading(level) => {
                html.push_str(&format!("<h{l}>{}</h{l}>\n", inner, l = level));
            }
            BlockKind::ListItem => {
                html.push_str(&format!("<li>{}</li>\n", inner));
            }
            BlockKind::Paragraph => {
                html.push_str(&format!("<p>{}</p>\n", inner));
            }
        }
    }

    if in_list {
        html.push_str("</ul>\n");
    }

    html
}

/// Builds a data-URI image tag for an embedded image, if it resolves
fn inline_image(
    relationship_id: &str,
    relationships: &HashMap<String, String>,
    archive: &mut ZipArchive<Cursor<&[u8]>>,
) -> Option<String> {
    let target = relationships.get(relationship_id)?;
    let archive_path = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        format!("word/{}", target)
    };

    let mut file = match archive.by_name(&archive_path) {
        Ok(file) => file,
        Err(_) => {
            tracing::warn!("Embedded image {} not found in archive", archive_path);
            return None;
        }
    };

    let mut bytes = Vec::new();
    if file.read_to_end(&mut bytes).is_err() {
        tracing::warn!("Failed to read embedded image {}", archive_path);
        return None;
    }

    Some(format!(
        "<img src=\"data:{};base64,{}\" />",
        media_type(&archive_path),
        BASE64.encode(&bytes)
    ))
}

/// Guesses the media type of an embedded image from its extension
fn media_type(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Extracts an attribute value from an element, ignoring namespace prefixes
fn attribute_value(element: &quick_xml::events::BytesStart, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}
