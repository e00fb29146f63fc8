//! Generic tree query engine.
//!
//! Locates nodes in a parsed document by exact tag name and/or attribute
//! value, where attribute values are also matched per whitespace-separated
//! token (the usual multi-valued `class` semantics). The engine knows
//! nothing about any record shape; extractors compose it.

use ego_tree::NodeRef;
use scraper::Node;

/// Capability view of a document tree node.
///
/// The engine is written purely against this trait so it stays independent
/// of the concrete parser producing the tree.
pub trait TreeNode: Copy {
    /// Element tag name, or `None` for text/comment/document nodes.
    fn tag(&self) -> Option<&str>;

    /// Attribute value for `key`, if this is an element carrying it.
    fn attr(&self, key: &str) -> Option<&str>;

    /// Direct children in document order.
    fn child_nodes(&self) -> Vec<Self>;

    /// The text carried by this node itself, for text nodes.
    fn own_text(&self) -> Option<&str>;

    /// Concatenated text of this node and all descendants, document order.
    fn text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            if let Some(fragment) = node.own_text() {
                out.push_str(fragment);
            }
            let mut children = node.child_nodes();
            children.reverse();
            stack.extend(children);
        }
        out
    }
}

impl<'a> TreeNode for NodeRef<'a, Node> {
    fn tag(&self) -> Option<&str> {
        self.value().as_element().map(|element| element.name())
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.value().as_element().and_then(|element| element.attr(key))
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children().collect()
    }

    fn own_text(&self) -> Option<&str> {
        self.value().as_text().map(|text| &**text)
    }
}

/// Match criteria for [`find_all`] and [`find_first`].
///
/// Unset criteria match everything, so `TreeQuery::new()` selects every
/// node in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeQuery<'q> {
    tag: Option<&'q str>,
    attr: Option<(&'q str, &'q str)>,
}

impl<'q> TreeQuery<'q> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact element tag name.
    pub fn tag(mut self, tag: &'q str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Require an attribute whose value equals `value` exactly, or carries
    /// `value` as one whitespace-separated token.
    pub fn attr(mut self, key: &'q str, value: &'q str) -> Self {
        self.attr = Some((key, value));
        self
    }

    /// Shorthand for the common `class` token query.
    pub fn class(value: &'q str) -> Self {
        Self::new().attr("class", value)
    }

    fn matches<N: TreeNode>(&self, node: &N) -> bool {
        if let Some(tag) = self.tag {
            if node.tag() != Some(tag) {
                return false;
            }
        }
        if let Some((key, want)) = self.attr {
            let Some(value) = node.attr(key) else {
                return false;
            };
            if value != want && !value.split_whitespace().any(|token| token == want) {
                return false;
            }
        }
        true
    }
}

/// All matching nodes under (and including) `root`, in document order.
///
/// Traversal is an explicit-stack preorder walk; arbitrarily deep documents
/// cannot exhaust the call stack.
pub fn find_all<N: TreeNode>(root: N, query: &TreeQuery<'_>) -> Vec<N> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if query.matches(&node) {
            found.push(node);
        }
        let mut children = node.child_nodes();
        children.reverse();
        stack.extend(children);
    }
    found
}

/// First matching node in document order, if any.
pub fn find_first<N: TreeNode>(root: N, query: &TreeQuery<'_>) -> Option<N> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if query.matches(&node) {
            return Some(node);
        }
        let mut children = node.child_nodes();
        children.reverse();
        stack.extend(children);
    }
    None
}
