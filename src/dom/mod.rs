//! Shadow-aware DOM snapshot and indexing module
//!
//! Native DOM queries stop at shadow boundaries; this module does not. It
//! provides:
//! - ElementNode: the snapshot wire format, shadow content included
//! - DomIndex: document-order index with composed selectors that cross
//!   shadow boundaries via a `::shadow` sentinel
//! - DomTree: a snapshot plus its index, with selector resolution
//! - selector: local-selector generation and matching

pub mod element;
pub mod index;
pub mod selector;
pub mod tree;

pub use element::{BoundingBox, ElementNode};
pub use index::{DomIndex, Entry, EntryId, PathStep};
pub use selector::SHADOW_SENTINEL;
pub use tree::DomTree;

use crate::error::Result;
use headless_chrome::Tab;
use std::sync::Arc;

/// Capture and index a snapshot of the tab's document, shadow trees included
pub fn extract_dom(tab: &Arc<Tab>) -> Result<DomTree> {
    DomTree::from_tab(tab)
}
