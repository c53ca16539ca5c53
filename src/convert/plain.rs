//! Plain text conversion
//!
//! Wraps the file content in a preformatted block, preserving line breaks
//! and spacing. Plain text has no internal structure to extract a title
//! from, so the title always falls back to the file name stem.

use crate::convert::{escape_html, Fragment};

/// Converts plain text bytes into a preformatted HTML fragment
///
/// Non-UTF-8 content is decoded lossily; the replacement characters keep the
/// conversion deterministic for any input bytes.
pub(crate) fn convert(bytes: &[u8]) -> Fragment {
    let text = String::from_utf8_lossy(bytes);
    Fragment {
        html: format!("<pre class=\"plain-text\">{}</pre>", escape_html(&text)),
        title: None,
    }
}
