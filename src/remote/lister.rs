//! Recursive directory listing
//!
//! Enumerates the remote documentation tree, transparently merging paginated
//! listing responses and guarding against traversal cycles with an explicit
//! visited-path set.

use crate::config::SourceConfig;
use crate::convert::DocumentFormat;
use crate::remote::client::RemoteClient;
use crate::remote::{EntryKind, RemoteEntry};
use crate::{ConfigError, Result};
use glob::Pattern;
use std::collections::{HashSet, VecDeque};

/// Compiled exclusion rules applied while listing
///
/// Files are skipped when their name matches `exclude-files` exactly or when
/// their path or name matches one of the `exclude-patterns` globs.
pub struct ExcludeFilters {
    patterns: Vec<Pattern>,
    files: HashSet<String>,
}

impl ExcludeFilters {
    /// Compiles the filters from the source configuration
    pub fn from_config(source: &SourceConfig) -> std::result::Result<Self, ConfigError> {
        let patterns = source
            .exclude_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            files: source.exclude_files.iter().cloned().collect(),
        })
    }

    /// Returns true if the given entry should be skipped
    pub fn is_excluded(&self, path: &str, name: &str) -> bool {
        if self.files.contains(name) {
            return true;
        }
        self.patterns
            .iter()
            .any(|p| p.matches(path) || p.matches(name))
    }
}

/// Lists the remote documentation tree under the configured root
///
/// Walks directories breadth-first, following pagination tokens within each
/// directory until exhausted. Only files in a supported document format that
/// pass the exclusion filters are returned. The result is sorted by path so
/// downstream stages see a deterministic sequence.
///
/// A directory path is visited at most once: if the remote reports the same
/// path again (a symlink loop, for example), the repeat is skipped rather
/// than recursed into.
///
/// # Arguments
///
/// * `client` - The remote API client
/// * `root` - Root directory to list, relative to the repository root
/// * `filters` - Compiled exclusion rules
///
/// # Returns
///
/// * `Ok(Vec<RemoteEntry>)` - File entries, sorted by path
/// * `Err(SyncError)` - Listing failed; the run must abort without mutation
pub async fn list_tree(
    client: &RemoteClient,
    root: &str,
    filters: &ExcludeFilters,
) -> Result<Vec<RemoteEntry>> {
    let mut files = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut pending: VecDeque<String> = VecDeque::new();

    visited.insert(root.to_string());
    pending.push_back(root.to_string());

    while let Some(dir) = pending.pop_front() {
        tracing::debug!("Listing directory: {}", if dir.is_empty() { "." } else { dir.as_str() });

        let mut page_token: Option<String> = None;

        loop {
            let page = client.list_directory_page(&dir, page_token.as_deref()).await?;

            for entry in page.entries {
                match entry.kind {
                    EntryKind::Dir => {
                        if visited.insert(entry.path.clone()) {
                            pending.push_back(entry.path);
                        } else {
                            tracing::warn!(
                                "Skipping already-visited directory {} (listing cycle)",
                                entry.path
                            );
                        }
                    }
                    EntryKind::File => {
                        if DocumentFormat::from_path(&entry.path).is_none() {
                            tracing::trace!("Skipping unsupported file {}", entry.path);
                            continue;
                        }
                        if filters.is_excluded(&entry.path, &entry.name) {
                            tracing::debug!("Skipping excluded file {}", entry.path);
                            continue;
                        }
                        files.push(entry);
                    }
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!("Listed {} documents under '{}'", files.len(), root);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;

    fn create_source_config(patterns: Vec<&str>, files: Vec<&str>) -> SourceConfig {
        SourceConfig {
            repository: "acme/handbook".to_string(),
            directory: "docs".to_string(),
            api_base_url: "https://api.example.com".to_string(),
            exclude_patterns: patterns.into_iter().map(String::from).collect(),
            exclude_files: files.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_no_filters_excludes_nothing() {
        let filters = ExcludeFilters::from_config(&create_source_config(vec![], vec![])).unwrap();
        assert!(!filters.is_excluded("docs/guide.md", "guide.md"));
    }

    #[test]
    fn test_exclude_file_by_name() {
        let filters =
            ExcludeFilters::from_config(&create_source_config(vec![], vec!["TODO.txt"])).unwrap();
        assert!(filters.is_excluded("docs/TODO.txt", "TODO.txt"));
        assert!(!filters.is_excluded("docs/notes.txt", "notes.txt"));
    }

    #[test]
    fn test_exclude_pattern_matches_path() {
        let filters =
            ExcludeFilters::from_config(&create_source_config(vec!["docs/drafts/*"], vec![]))
                .unwrap();
        assert!(filters.is_excluded("docs/drafts/wip.md", "wip.md"));
        assert!(!filters.is_excluded("docs/guide.md", "guide.md"));
    }

    #[test]
    fn test_exclude_pattern_matches_name() {
        let filters =
            ExcludeFilters::from_config(&create_source_config(vec!["*.draft.md"], vec![])).unwrap();
        assert!(filters.is_excluded("docs/chapter.draft.md", "chapter.draft.md"));
        assert!(!filters.is_excluded("docs/chapter.md", "chapter.md"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = ExcludeFilters::from_config(&create_source_config(vec!["["], vec![]));
        assert!(result.is_err());
    }
}
