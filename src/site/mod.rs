//! Site structure
//!
//! Maps the flat set of synced documents onto the output site: stable slugs
//! for fragment file names and a nested navigation tree serialized alongside
//! them.

mod slug;
mod tree;

pub use slug::slugify;
pub use tree::{build_site_tree, SiteDocument, SiteTreeNode};
