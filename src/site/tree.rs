//! Site navigation tree
//!
//! Builds a nested navigation structure mirroring the remote directory
//! layout. Directory nodes are synthesized from path segments; document
//! nodes carry the extracted title and the slug linking them to their
//! rendered fragment. Children are ordered lexicographically by path
//! segment, so the same set of documents always yields the same tree.

use crate::site::slugify;
use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A node in the rendered navigation tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTreeNode {
    /// Display title (extracted document title, or directory name)
    pub title: String,

    /// Sanitized identifier; links document nodes to their fragment file
    pub slug: String,

    /// Source path for document nodes; absent for directories and the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Child nodes, lexicographic by path segment
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<SiteTreeNode>,
}

/// A synced document as seen by the tree builder
#[derive(Debug, Clone)]
pub struct SiteDocument {
    /// Path relative to the repository root
    pub path: String,

    /// Extracted title
    pub title: String,

    /// Sanitized path slug
    pub slug: String,
}

/// Intermediate directory being assembled
#[derive(Default)]
struct DirBuilder {
    children: BTreeMap<String, ChildBuilder>,
}

enum ChildBuilder {
    Dir(DirBuilder),
    Doc(SiteTreeNode),
}

/// Builds the navigation tree for a set of synced documents
///
/// Every slug must be unique across the whole tree, directory nodes
/// included; a collision is a fatal error because two fragments (or a
/// fragment and a directory link) would overwrite each other.
///
/// # Arguments
///
/// * `site_title` - Title for the root node
/// * `documents` - All documents in the synced state
///
/// # Returns
///
/// * `Ok(SiteTreeNode)` - The root of the navigation tree
/// * `Err(SyncError::SlugCollision)` - Two tree nodes sanitize to the same slug
pub fn build_site_tree(site_title: &str, documents: &[SiteDocument]) -> Result<SiteTreeNode> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for doc in documents {
        if let Some(first) = seen.insert(doc.slug.clone(), doc.path.clone()) {
            return Err(SyncError::SlugCollision {
                slug: doc.slug.clone(),
                first,
                second: doc.path.clone(),
            });
        }
    }

    // Directory nodes carry slugs too; the same directory appears once per
    // document under it, which is not a collision.
    for doc in documents {
        for dir_path in ancestor_dirs(&doc.path) {
            let slug = slugify(&dir_path);
            match seen.get(&slug) {
                Some(existing) if *existing == dir_path => {}
                Some(existing) => {
                    return Err(SyncError::SlugCollision {
                        slug,
                        first: existing.clone(),
                        second: dir_path,
                    });
                }
                None => {
                    seen.insert(slug, dir_path);
                }
            }
        }
    }

    let mut root = DirBuilder::default();
    for doc in documents {
        insert_document(&mut root, doc);
    }

    Ok(SiteTreeNode {
        title: site_title.to_string(),
        slug: String::new(),
        path: None,
        children: render_children(root, ""),
    })
}

/// Yields the directory paths above a document, outermost first
fn ancestor_dirs(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut dirs = Vec::new();
    for end in 1..segments.len() {
        dirs.push(segments[..end].join("/"));
    }
    dirs
}

/// Inserts one document into the builder, creating directory levels as needed
fn insert_document(root: &mut DirBuilder, doc: &SiteDocument) {
    let segments: Vec<&str> = doc.path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((file_name, dirs)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for dir in dirs {
        let child = current
            .children
            .entry(dir.to_string())
            .or_insert_with(|| ChildBuilder::Dir(DirBuilder::default()));
        current = match child {
            ChildBuilder::Dir(builder) => builder,
            // A file and directory sharing a path segment cannot both exist
            // on the remote; keep the directory if it somehow happens.
            ChildBuilder::Doc(_) => {
                *child = ChildBuilder::Dir(DirBuilder::default());
                match child {
                    ChildBuilder::Dir(builder) => builder,
                    ChildBuilder::Doc(_) => unreachable!(),
                }
            }
        };
    }

    current.children.insert(
        file_name.to_string(),
        ChildBuilder::Doc(SiteTreeNode {
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            path: Some(doc.path.clone()),
            children: Vec::new(),
        }),
    );
}

/// Renders a directory builder into ordered tree nodes
fn render_children(builder: DirBuilder, parent_path: &str) -> Vec<SiteTreeNode> {
    builder
        .children
        .into_iter()
        .map(|(segment, child)| match child {
            ChildBuilder::Doc(node) => node,
            ChildBuilder::Dir(dir) => {
                let dir_path = if parent_path.is_empty() {
                    segment.clone()
                } else {
                    format!("{}/{}", parent_path, segment)
                };
                SiteTreeNode {
                    title: segment,
                    slug: slugify(&dir_path),
                    path: None,
                    children: render_children(dir, &dir_path),
                }
            }
        })
        .collect()
}
