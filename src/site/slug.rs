//! Path slugification
//!
//! Output files and navigation links are named after a sanitized form of the
//! source path. Slugs are pure functions of the path, so the same tree always
//! produces the same file names.

/// Sanitizes a repository path into a slug
///
/// Lowercases the path and collapses every run of non-alphanumeric characters
/// into a single hyphen, trimming leading and trailing separators. The file
/// extension is part of the input, which keeps `guide.md` and `guide.txt`
/// from colliding.
///
/// # Arguments
///
/// * `path` - Path relative to the repository root
///
/// # Returns
///
/// * The sanitized slug, e.g. `docs-release-notes-txt`
pub fn slugify(path: &str) -> String {
    let mut slug = String::with_capacity(path.len());
    let mut pending_separator = false;

    for c in path.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_separator = true;
        }
    }

    slug
}
