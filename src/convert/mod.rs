//! Document format conversion
//!
//! This module normalizes heterogeneous document formats into HTML fragments.
//! The format is resolved once per file from its extension into a closed
//! variant, and each variant implements the same convert contract: raw bytes
//! in, HTML fragment plus extracted title out.

mod markdown;
mod plain;
mod word;

use crate::site::slugify;
use crate::{Result, SyncError};
use std::path::Path;

/// Supported document formats, dispatched by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Plain text (`.txt`)
    PlainText,
    /// Lightweight markup (`.md`, `.markdown`)
    Markdown,
    /// Word-processor document (`.docx`)
    Word,
}

impl DocumentFormat {
    /// Resolves the format for a file path from its extension
    ///
    /// Returns `None` for unrecognized extensions; the lister uses this to
    /// skip unsupported files, and [`convert`] turns it into an
    /// [`SyncError::UnsupportedFormat`].
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "docx" => Some(Self::Word),
            _ => None,
        }
    }

    /// Human-readable format name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlainText => "plain-text",
            Self::Markdown => "markdown",
            Self::Word => "word",
        }
    }
}

/// Raw bytes of a fetched document, waiting to be converted
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path relative to the repository root
    pub path: String,

    /// Resolved document format
    pub format: DocumentFormat,

    /// Raw file content
    pub bytes: Vec<u8>,
}

/// The HTML rendition of a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Path relative to the repository root
    pub path: String,

    /// HTML fragment for the site renderer
    pub html: String,

    /// Extracted title (first heading, or the file name stem)
    pub title: String,

    /// Sanitized path used for output naming and navigation linking
    pub slug: String,
}

/// Intermediate converter output before title fallback and slug assignment
#[derive(Debug)]
pub(crate) struct Fragment {
    pub html: String,
    pub title: Option<String>,
}

/// Converts a fetched document into its HTML rendition
///
/// Dispatches on the document's format variant. Conversion failures are
/// per-file errors: the caller records them and the run continues.
///
/// # Arguments
///
/// * `doc` - The fetched source document
///
/// # Returns
///
/// * `Ok(ConvertedDocument)` - HTML fragment, title, and slug
/// * `Err(SyncError::Conversion)` - The file could not be parsed
pub fn convert(doc: &SourceDocument) -> Result<ConvertedDocument> {
    let fragment = match doc.format {
        DocumentFormat::PlainText => plain::convert(&doc.bytes),
        DocumentFormat::Markdown => markdown::convert(&doc.bytes),
        DocumentFormat::Word => {
            word::convert(&doc.bytes).map_err(|reason| SyncError::Conversion {
                path: doc.path.clone(),
                reason,
            })?
        }
    };

    let title = fragment
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| file_stem(&doc.path));

    Ok(ConvertedDocument {
        path: doc.path.clone(),
        html: fragment.html,
        title,
        slug: slugify(&doc.path),
    })
}

/// Resolves a path's format, or fails with an unsupported-format error
pub fn detect_format(path: &str) -> Result<DocumentFormat> {
    DocumentFormat::from_path(path).ok_or_else(|| SyncError::UnsupportedFormat {
        path: path.to_string(),
    })
}

/// Returns the file name stem used as the fallback title
pub(crate) fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Escapes text for inclusion in HTML content
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
