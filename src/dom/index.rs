use crate::dom::element::{BoundingBox, ElementNode};
use crate::dom::selector::{self, SHADOW_SENTINEL};
use indexmap::IndexMap;

/// Opaque, stable handle for one indexed element.
///
/// The handle is the entry's position in the document-order sequence, so it
/// doubles as the element's global order. It is valid for the index that
/// produced it and meaningless across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    /// Document-order position of the entry
    pub fn order(self) -> usize {
        self.0
    }
}

/// One step from the snapshot root towards an indexed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// Descend into the nth light-DOM child
    Child(usize),
    /// Descend into the nth child of the shadow root
    Shadow(usize),
}

/// Index record for one element encountered during traversal.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Stable handle; positional operations anchor on this, never on the
    /// selector string, so a selector collision cannot misdirect them
    pub id: EntryId,

    /// Composed selector from the document root, with [`SHADOW_SENTINEL`]
    /// marking each boundary crossing. Used for page-side resolution and
    /// diagnostics; not guaranteed collision-free
    pub selector: String,

    /// Structural path from the snapshot root to the element
    pub path: Vec<PathStep>,

    /// Lowercased tag name
    pub tag_name: String,

    /// Element id attribute, when present and non-empty
    pub element_id: Option<String>,

    /// Class names at traversal time
    pub classes: Vec<String>,

    /// Geometry snapshot at traversal time; not kept live
    pub bounds: Option<BoundingBox>,

    /// Highest order assigned inside this element's subtree, shadow content
    /// included. Together with the order this gives the subtree extent used
    /// for containment checks
    pub subtree_end: usize,
}

impl Entry {
    /// Document-order position of this entry
    pub fn order(&self) -> usize {
        self.id.0
    }

    /// True when `other` lies inside this entry's subtree (shadow content
    /// counts; the entry itself does not)
    pub fn spans(&self, other: &Entry) -> bool {
        self.id.0 < other.id.0 && other.id.0 <= self.subtree_end
    }
}

/// Document-order index over a page snapshot, threaded through every open
/// shadow boundary.
///
/// Two views over the same traversal: `sequence` is the authoritative
/// document-order list with exactly one entry per element, and `by_key` maps
/// composed selectors back to entries. The index is a point-in-time value;
/// it is replaced wholesale on rebuild, never patched.
#[derive(Debug, Clone, Default)]
pub struct DomIndex {
    /// Entries in document order; source of truth for positional queries
    sequence: Vec<Entry>,

    /// Selector-keyed view. Keys are unique; when two elements compose a
    /// byte-identical selector the later one wins the key
    by_key: IndexMap<String, EntryId>,
}

impl DomIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from a snapshot root.
    ///
    /// Pre-order, depth-first: each element is numbered before its content,
    /// and a host's shadow content is numbered directly after the host,
    /// ahead of the host's own light children and of its next sibling.
    /// Never fails; an empty document yields an empty index.
    pub fn build(root: &ElementNode) -> Self {
        let mut index = Self::new();
        let mut path = Vec::new();
        index.visit(std::slice::from_ref(root), 0, "", &mut path);
        index
    }

    fn visit(
        &mut self,
        siblings: &[ElementNode],
        pos: usize,
        parent_path: &str,
        path: &mut Vec<PathStep>,
    ) {
        let el = &siblings[pos];
        let local = selector::local_selector(siblings, pos);
        let selector = if parent_path.is_empty() {
            local
        } else {
            format!("{} > {}", parent_path, local)
        };

        let id = EntryId(self.sequence.len());
        self.by_key.insert(selector.clone(), id);
        self.sequence.push(Entry {
            id,
            selector: selector.clone(),
            path: path.clone(),
            tag_name: el.tag_name.clone(),
            element_id: el.id().map(str::to_string),
            classes: el.classes().iter().map(|c| c.to_string()).collect(),
            bounds: el.bounding_box.clone(),
            subtree_end: id.0,
        });

        if el.hosts_shadow() {
            let shadow_path = format!("{} > {}", selector, SHADOW_SENTINEL);
            for i in 0..el.shadow_children.len() {
                path.push(PathStep::Shadow(i));
                self.visit(&el.shadow_children, i, &shadow_path, path);
                path.pop();
            }
        }

        for i in 0..el.children.len() {
            path.push(PathStep::Child(i));
            self.visit(&el.children, i, &selector, path);
            path.pop();
        }

        self.sequence[id.0].subtree_end = self.sequence.len() - 1;
    }

    /// Entry for an exact composed selector, or `None`
    pub fn get(&self, selector: &str) -> Option<&Entry> {
        self.by_key
            .get(selector)
            .and_then(|id| self.sequence.get(id.0))
    }

    /// Entry behind a handle; `None` once the handle outlives its index
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.sequence.get(id.0)
    }

    /// All entries in document order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.sequence.iter()
    }

    /// All composed selectors known to the keyed view
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    /// Number of indexed elements
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// All entries with the given tag, in document order. Tag comparison is
    /// case-insensitive; an absent tag yields an empty list, never an error.
    pub fn find_by_tag(&self, tag: &str) -> Vec<&Entry> {
        let tag = tag.to_ascii_lowercase();
        self.sequence.iter().filter(|e| e.tag_name == tag).collect()
    }

    /// All entries carrying the given class, in document order
    pub fn find_by_class(&self, class: &str) -> Vec<&Entry> {
        self.sequence
            .iter()
            .filter(|e| e.classes.iter().any(|c| c == class))
            .collect()
    }

    /// All entries with the given id attribute, in document order
    pub fn find_by_id(&self, id: &str) -> Vec<&Entry> {
        self.sequence
            .iter()
            .filter(|e| e.element_id.as_deref() == Some(id))
            .collect()
    }

    /// Entries with the given tag inside the anchor's subtree, shadow
    /// content included, in document order.
    ///
    /// Containment is decided by subtree-extent bookkeeping, not by
    /// comparing selector strings, so sibling subtrees whose selectors share
    /// a prefix never leak in. A dangling anchor yields an empty list.
    pub fn find_descendants_by_tag(&self, anchor: EntryId, tag: &str) -> Vec<&Entry> {
        let anchor = match self.entry(anchor) {
            Some(entry) => entry,
            None => return Vec::new(),
        };
        let tag = tag.to_ascii_lowercase();
        self.sequence[anchor.id.0 + 1..=anchor.subtree_end]
            .iter()
            .filter(|e| e.tag_name == tag)
            .collect()
    }

    /// Every matching entry strictly after the anchor, to the end of the
    /// document.
    ///
    /// Deliberately unbounded: the scan does not stop at the anchor's
    /// subtree or section, so results legitimately include elements of
    /// structurally later, unrelated parts of the page. Callers bound the
    /// result by count. For subtree-scoped lookups use
    /// [`find_descendants_by_tag`].
    pub fn find_following_tag(&self, anchor: EntryId, tag: &str) -> Vec<&Entry> {
        if anchor.0 >= self.sequence.len() {
            return Vec::new();
        }
        let tag = tag.to_ascii_lowercase();
        self.sequence[anchor.0 + 1..]
            .iter()
            .filter(|e| e.tag_name == tag)
            .collect()
    }

    /// Every `tag_b` entry after the first `tag_a` occurrence, in one scan
    /// of the sequence. An element matching `tag_a` is never collected as a
    /// `tag_b` match, even when the tags are equal.
    pub fn find_following_tag_by_name(&self, tag_a: &str, tag_b: &str) -> Vec<&Entry> {
        let tag_a = tag_a.to_ascii_lowercase();
        let tag_b = tag_b.to_ascii_lowercase();
        let mut seen_a = false;
        let mut results = Vec::new();
        for entry in &self.sequence {
            if entry.tag_name == tag_a {
                seen_a = true;
            } else if seen_a && entry.tag_name == tag_b {
                results.push(entry);
            }
        }
        results
    }
}
