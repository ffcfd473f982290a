use crate::dom::element::ElementNode;
use crate::dom::index::{DomIndex, Entry, PathStep};
use crate::dom::selector::{LocalSelector, SHADOW_SENTINEL};
use crate::error::{GraderError, Result};
use headless_chrome::Tab;
use std::sync::Arc;

/// A point-in-time snapshot of a page together with its shadow-aware index.
///
/// The snapshot diverges silently from the live page as soon as the page
/// mutates; nothing here observes mutations. Callers that hit unexpectedly
/// empty lookups capture a fresh tree and start over.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// Root element of the snapshot
    pub root: ElementNode,

    /// Document-order index over the snapshot
    pub index: DomIndex,
}

impl DomTree {
    /// Index a snapshot root
    pub fn new(root: ElementNode) -> Self {
        let index = DomIndex::build(&root);
        Self { root, index }
    }

    /// Capture and index a fresh snapshot from a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        // The extraction script serializes the composed tree to a JSON string
        let js_code = include_str!("extract_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| GraderError::EvaluateFailed(format!("DOM extraction script failed: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| GraderError::SnapshotParseFailed("No value returned from DOM extraction".to_string()))?;

        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| GraderError::SnapshotParseFailed(format!("Failed to get JSON string: {}", e)))?;

        let root: ElementNode = serde_json::from_str(&json_str)
            .map_err(|e| GraderError::SnapshotParseFailed(format!("Failed to parse snapshot JSON: {}", e)))?;

        Ok(Self::new(root))
    }

    /// Rebuild the index from the held snapshot. The old index is discarded
    /// wholesale; there is no partial-update path.
    pub fn rebuild(&mut self) {
        self.index = DomIndex::build(&self.root);
    }

    /// Number of indexed elements
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the snapshot holds no elements
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Element for an exact composed selector, via the index
    pub fn get(&self, selector: &str) -> Option<&ElementNode> {
        self.element_of(self.index.get(selector)?)
    }

    /// Follow an entry's recorded path back to its element. Returns `None`
    /// once the snapshot no longer has that shape.
    pub fn element_of(&self, entry: &Entry) -> Option<&ElementNode> {
        let mut node = &self.root;
        for step in &entry.path {
            node = match *step {
                PathStep::Child(i) => node.children.get(i)?,
                PathStep::Shadow(i) => node.shadow_children.get(i)?,
            };
        }
        Some(node)
    }

    /// Resolve a composed selector against the snapshot without consulting
    /// the index.
    ///
    /// Segments are split on `>`. A [`SHADOW_SENTINEL`] segment descends
    /// into the current element's shadow tree, failing the resolution when
    /// there is none. Every other segment is a first-match, depth-first
    /// descendant query from the current scope root; the scope advances
    /// only at shadow boundaries. Exact for selectors this crate generated,
    /// which are the only ones it is asked to resolve.
    pub fn resolve(&self, selector: &str) -> Option<&ElementNode> {
        let mut scope: &[ElementNode] = std::slice::from_ref(&self.root);
        let mut current: Option<&ElementNode> = None;

        for token in selector.split('>').map(str::trim) {
            if token == SHADOW_SENTINEL {
                let host = current?;
                if !host.hosts_shadow() {
                    return None;
                }
                scope = &host.shadow_children;
            } else {
                let sel = LocalSelector::parse(token)?;
                current = Some(first_match(scope, &sel)?);
            }
        }

        current
    }
}

/// First element matching `sel` in a depth-first, document-order scan of the
/// scope. Shadow boundaries are opaque here, as they are to querySelector.
fn first_match<'a>(scope: &'a [ElementNode], sel: &LocalSelector) -> Option<&'a ElementNode> {
    for (pos, el) in scope.iter().enumerate() {
        if sel.matches(scope, pos) {
            return Some(el);
        }
        if let Some(found) = first_match(&el.children, sel) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grading_like_tree() -> ElementNode {
        ElementNode::new("body").with_children(vec![
            ElementNode::new("quiz-section").with_shadow_children(vec![
                ElementNode::new("div").with_attribute("class", "header"),
                ElementNode::new("attempt-result").with_shadow_children(vec![
                    ElementNode::new("input").with_attribute("class", "grade"),
                    ElementNode::new("input").with_attribute("class", "feedback"),
                ]),
            ]),
            ElementNode::new("quiz-section"),
        ])
    }

    #[test]
    fn test_round_trip_every_entry() {
        let tree = DomTree::new(grading_like_tree());

        for entry in tree.index.entries() {
            let via_path = tree.element_of(entry).expect("path must resolve");
            let via_resolve = tree.resolve(&entry.selector).expect("selector must resolve");
            let via_get = tree.get(&entry.selector).expect("get must resolve");

            assert!(std::ptr::eq(via_path, via_resolve), "{}", entry.selector);
            assert!(std::ptr::eq(via_path, via_get), "{}", entry.selector);
            assert_eq!(via_path.tag_name, entry.tag_name);
        }
    }

    #[test]
    fn test_resolve_crosses_nested_shadows() {
        let tree = DomTree::new(grading_like_tree());

        let el = tree
            .resolve("body > quiz-section:nth-of-type(1) > ::shadow > attempt-result > ::shadow > input.grade:nth-of-type(1)")
            .expect("nested shadow path must resolve");
        assert!(el.has_class("grade"));
    }

    #[test]
    fn test_resolve_fails_without_shadow_root() {
        let tree = DomTree::new(grading_like_tree());
        assert!(tree.resolve("body > ::shadow > div").is_none());
    }

    #[test]
    fn test_resolve_unknown_token_fails() {
        let tree = DomTree::new(grading_like_tree());
        assert!(tree.resolve("body > video").is_none());
        assert!(tree.resolve("").is_none());
    }

    #[test]
    fn test_get_unknown_selector() {
        let tree = DomTree::new(grading_like_tree());
        assert!(tree.get("body > nothing").is_none());
        assert!(tree.index.get("body > nothing").is_none());
    }

    #[test]
    fn test_element_of_tolerates_reshaped_tree() {
        let tree = DomTree::new(grading_like_tree());
        let deep = tree
            .index
            .get("body > quiz-section:nth-of-type(1) > ::shadow > attempt-result > ::shadow > input.grade:nth-of-type(1)")
            .expect("entry must exist")
            .clone();

        // Same index, shrunken snapshot: the stale path steps off the tree
        // and must come back None instead of pointing at the wrong node
        let mut reshaped = tree.clone();
        reshaped.root.children[0].shadow_children.truncate(1);
        assert!(reshaped.element_of(&deep).is_none());
    }

    #[test]
    fn test_rebuild_replaces_index() {
        let mut tree = DomTree::new(grading_like_tree());
        let before = tree.len();

        tree.root.add_child(ElementNode::new("aside"));
        // The index is a snapshot: stale until explicitly rebuilt
        assert_eq!(tree.len(), before);

        tree.rebuild();
        assert_eq!(tree.len(), before + 1);
        assert_eq!(tree.index.find_by_tag("aside").len(), 1);
    }

    #[test]
    fn test_resolve_scope_advances_only_at_shadow_boundaries() {
        // Both sections contain a div; a resolution of the second section's
        // div re-queries from the same scope root and lands on the first
        // match for the final token only. For generated selectors the nth
        // qualifiers keep this exact.
        let tree = DomTree::new(ElementNode::new("body").with_children(vec![
            ElementNode::new("section").with_children(vec![
                ElementNode::new("div").with_attribute("class", "x"),
            ]),
            ElementNode::new("section").with_children(vec![
                ElementNode::new("div").with_attribute("class", "y"),
            ]),
        ]));

        let second = tree
            .resolve("body > section:nth-of-type(2) > div.y")
            .expect("must resolve");
        assert!(second.has_class("y"));
    }
}
