//! Local selector generation and matching.
//!
//! A composed selector is a chain of these local segments joined by `" > "`,
//! with [`SHADOW_SENTINEL`] marking each shadow-boundary crossing. The
//! parser only accepts segments this module itself generates; it is not a
//! general CSS selector engine and does not try to be one.

use crate::dom::element::ElementNode;

/// Path segment marking a shadow-boundary crossing in a composed selector.
pub const SHADOW_SENTINEL: &str = "::shadow";

/// Compute the local selector for `siblings[pos]`.
///
/// A non-empty id wins outright. Otherwise the tag plus every class joined
/// by `.`, and a 1-based `:nth-of-type` qualifier counted among same-tag
/// siblings, added only when the element shares its tag with another sibling.
pub fn local_selector(siblings: &[ElementNode], pos: usize) -> String {
    let el = &siblings[pos];

    if let Some(id) = el.id() {
        return format!("#{}", id);
    }

    let mut sel = el.tag_name.clone();
    let classes = el.classes();
    if !classes.is_empty() {
        sel.push('.');
        sel.push_str(&classes.join("."));
    }

    let same_tag = siblings.iter().filter(|s| s.tag_name == el.tag_name).count();
    if same_tag > 1 {
        let nth = siblings[..pos]
            .iter()
            .filter(|s| s.tag_name == el.tag_name)
            .count()
            + 1;
        sel.push_str(&format!(":nth-of-type({})", nth));
    }

    sel
}

/// Parsed form of a single generated path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSelector {
    /// `#id`
    Id(String),
    /// `tag.class1.class2:nth-of-type(n)` with classes and nth optional
    Compound {
        tag: String,
        classes: Vec<String>,
        nth: Option<usize>,
    },
}

impl LocalSelector {
    /// Parse a segment previously produced by [`local_selector`]. Returns
    /// `None` for anything this crate would not generate.
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(id) = token.strip_prefix('#') {
            if id.is_empty() {
                return None;
            }
            return Some(Self::Id(id.to_string()));
        }

        let (head, nth) = match token.split_once(":nth-of-type(") {
            Some((head, rest)) => {
                let n: usize = rest.strip_suffix(')')?.parse().ok()?;
                (head, Some(n))
            }
            None => (token, None),
        };

        let mut parts = head.split('.');
        let tag = parts.next()?;
        if tag.is_empty() {
            return None;
        }
        let classes: Vec<String> = parts.map(str::to_string).collect();
        if classes.iter().any(|c| c.is_empty()) {
            return None;
        }

        Some(Self::Compound {
            tag: tag.to_ascii_lowercase(),
            classes,
            nth,
        })
    }

    /// Whether `siblings[pos]` matches this segment. The nth qualifier is
    /// checked against position among same-tag siblings, like nth-of-type.
    pub fn matches(&self, siblings: &[ElementNode], pos: usize) -> bool {
        let el = &siblings[pos];
        match self {
            Self::Id(id) => el.id() == Some(id.as_str()),
            Self::Compound { tag, classes, nth } => {
                if el.tag_name != *tag {
                    return false;
                }
                if !classes.iter().all(|c| el.has_class(c)) {
                    return false;
                }
                match nth {
                    None => true,
                    Some(n) => {
                        let position = siblings[..pos]
                            .iter()
                            .filter(|s| s.tag_name == *tag)
                            .count()
                            + 1;
                        position == *n
                    }
                }
            }
        }
    }
}
