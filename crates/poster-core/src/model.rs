//! Document model: the poster body fragment as a tree over `petgraph`.
//!
//! A [`Fragment`] owns a `StableDiGraph` whose nodes are a synthetic
//! [`Node::Root`], [`Node::Element`] values, and [`Node::Text`] runs.
//! Edges go from parent → child. An `id_index` maps editor-assigned
//! identifiers to node indices so every lookup goes through the
//! identifier, never through a held reference, since the fragment may
//! be wholesale replaced by undo/redo.

use crate::id::{ElementId, IdAllocator};
use crate::style::StyleMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Reserved attribute carrying the editor-assigned element identifier.
pub const ELEMENT_ID_ATTR: &str = "data-element-id";

// ─── Roles ──────────────────────────────────────────────────────────────

/// Editing role of an element, derived from its tag. Drives which
/// property fields the editor offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Text,
    Image,
    Container,
    Other,
}

impl Role {
    /// Classify a tag name (case-insensitive) into a role.
    #[must_use]
    pub fn classify(tag: &str) -> Role {
        match tag.to_ascii_lowercase().as_str() {
            "img" => Role::Image,
            "div" => Role::Container,
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "span" | "strong" | "em" | "a" => {
                Role::Text
            }
            _ => Role::Other,
        }
    }
}

// ─── Elements ───────────────────────────────────────────────────────────

/// A source attribute. Attributes keep their document order so emitted
/// markup is deterministic; names are unique within an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// One element of the fragment.
///
/// The `style` attribute and the reserved identifier attribute are held
/// in dedicated fields rather than in `attrs`; the emitter reassembles
/// them in a fixed position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    /// Editor-assigned identifier, once tagged.
    pub id: Option<ElementId>,
    /// Remaining attributes in document order.
    pub attrs: SmallVec<[Attr; 4]>,
    /// Parsed `style` attribute.
    pub style: StyleMap,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_ascii_lowercase(),
            id: None,
            attrs: SmallVec::new(),
            style: StyleMap::new(),
        }
    }

    pub fn role(&self) -> Role {
        Role::classify(&self.tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing one in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value.to_string();
        } else {
            self.attrs.push(Attr {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Whitespace-separated classes from the `class` attribute.
    pub fn class_list(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether double-click may toggle in-place text editing.
    /// Anchors and images are excluded; plain containers are allowed.
    pub fn supports_inline_edit(&self) -> bool {
        matches!(
            self.tag.as_str(),
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "div" | "span" | "strong" | "em"
        )
    }
}

// ─── Nodes ──────────────────────────────────────────────────────────────

/// A node of the fragment tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Synthetic fragment root; never emitted.
    Root,
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

// ─── Fragment ───────────────────────────────────────────────────────────

/// The poster body fragment. Owned exclusively by an editor session and
/// mutated in place; history snapshots serialize it to markup text.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// The underlying directed graph.
    pub graph: StableDiGraph<Node, ()>,

    /// The synthetic root index.
    pub root: NodeIndex,

    /// Index from ElementId → NodeIndex for fast lookup.
    pub id_index: HashMap<ElementId, NodeIndex>,

    /// Explicit child ordering per parent. `StableDiGraph` hands freed
    /// indices back out on later inserts, so adjacency order alone
    /// cannot encode document order once anything has been removed.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Fragment {
    /// Create an empty fragment holding only the synthetic root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Node::Root);
        Self {
            graph,
            root,
            id_index: HashMap::new(),
            child_order: HashMap::new(),
        }
    }

    /// Append `node` as the last child of `parent`. Returns the new index.
    pub fn append_child(&mut self, parent: NodeIndex, node: Node) -> NodeIndex {
        let id = match &node {
            Node::Element(el) => el.id,
            _ => None,
        };
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        if let Some(id) = id {
            // First occurrence wins when input carries duplicated ids
            self.id_index.entry(id).or_insert(idx);
        }
        idx
    }

    /// Remove a node and its whole subtree, keeping every index
    /// synchronized. Removing the root is a no-op.
    pub fn remove_subtree(&mut self, idx: NodeIndex) {
        if idx == self.root {
            return;
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        self.remove_recursive(idx);
    }

    fn remove_recursive(&mut self, idx: NodeIndex) {
        for child in self.children(idx) {
            self.remove_recursive(child);
        }
        self.child_order.remove(&idx);
        if let Some(Node::Element(el)) = self.graph.remove_node(idx)
            && let Some(id) = el.id
            && self.id_index.get(&id) == Some(&idx)
        {
            self.id_index.remove(&id);
        }
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        self.graph.node_weight(idx).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        match self.graph.node_weight_mut(idx) {
            Some(Node::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Look up an element's index by its identifier.
    pub fn index_of(&self, id: ElementId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn element_by_id(&self, id: ElementId) -> Option<&Element> {
        self.index_of(id).and_then(|ix| self.element(ix))
    }

    pub fn element_by_id_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let ix = self.index_of(id)?;
        self.element_mut(ix)
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in document order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order.get(&idx).cloned().unwrap_or_default()
    }

    /// Depth-first walk of the whole tree, root included.
    #[must_use]
    pub fn document_order(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        self.walk(self.root, &mut out);
        out
    }

    fn walk(&self, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
        out.push(idx);
        for child in self.children(idx) {
            self.walk(child, out);
        }
    }

    /// Concatenated text of all descendant text runs.
    #[must_use]
    pub fn text_content(&self, idx: NodeIndex) -> String {
        let mut out = String::new();
        self.collect_text(idx, &mut out);
        out
    }

    fn collect_text(&self, idx: NodeIndex, out: &mut String) {
        if let Some(Node::Text(t)) = self.graph.node_weight(idx) {
            out.push_str(t);
        }
        for child in self.children(idx) {
            self.collect_text(child, out);
        }
    }

    /// Replace an element's children with a single text run. Markup
    /// nested under the element is flattened away; an empty string
    /// leaves the element childless.
    pub fn set_text_content(&mut self, idx: NodeIndex, text: &str) {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        if !text.is_empty() {
            self.append_child(idx, Node::Text(text.to_string()));
        }
    }

    /// Tag every element lacking an identifier, in document order.
    ///
    /// Idempotent: already-tagged elements are left alone, and their
    /// values advance the allocator first so fresh ids never collide
    /// with imported ones.
    pub fn assign_ids(&mut self, alloc: &mut IdAllocator) {
        let order = self.document_order();
        for &ix in &order {
            if let Some(el) = self.element(ix)
                && let Some(id) = el.id
            {
                alloc.reserve(id.as_str());
            }
        }
        for ix in order {
            let Some(el) = self.element_mut(ix) else {
                continue;
            };
            if el.id.is_some() {
                continue;
            }
            let id = alloc.next_id();
            el.id = Some(id);
            self.id_index.insert(id, ix);
        }
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str) -> Node {
        Node::Element(Element::new(tag))
    }

    #[test]
    fn classify_covers_the_role_map() {
        assert_eq!(Role::classify("img"), Role::Image);
        assert_eq!(Role::classify("IMG"), Role::Image);
        assert_eq!(Role::classify("div"), Role::Container);
        for tag in ["p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "strong", "em", "a"] {
            assert_eq!(Role::classify(tag), Role::Text, "tag {tag}");
        }
        assert_eq!(Role::classify("button"), Role::Other);
        assert_eq!(Role::classify("video"), Role::Other);
        assert_eq!(Role::classify("section"), Role::Other);
    }

    #[test]
    fn inline_edit_excludes_anchors_and_images() {
        assert!(Element::new("p").supports_inline_edit());
        assert!(Element::new("div").supports_inline_edit());
        assert!(Element::new("strong").supports_inline_edit());
        assert!(!Element::new("a").supports_inline_edit());
        assert!(!Element::new("img").supports_inline_edit());
    }

    #[test]
    fn append_preserves_document_order() {
        let mut f = Fragment::new();
        let root = f.root;
        let a = f.append_child(root, el("p"));
        let b = f.append_child(root, el("p"));
        let c = f.append_child(root, el("p"));
        assert_eq!(f.children(root), vec![a, b, c]);
    }

    #[test]
    fn order_survives_index_reuse() {
        let mut f = Fragment::new();
        let root = f.root;
        let a = f.append_child(root, el("p"));
        let b = f.append_child(root, el("p"));
        f.remove_subtree(a);
        // StableDiGraph may hand `a`'s slot back out here
        let c = f.append_child(root, el("p"));
        assert_eq!(
            f.children(root),
            vec![b, c],
            "insertion order must hold even when indices are reused"
        );
    }

    #[test]
    fn remove_subtree_cleans_every_index() {
        let mut f = Fragment::new();
        let root = f.root;
        let outer = f.append_child(root, el("div"));
        let inner = f.append_child(outer, el("p"));
        f.append_child(inner, Node::Text("hi".into()));
        let mut alloc = IdAllocator::new();
        f.assign_ids(&mut alloc);

        let inner_id = f.element(inner).and_then(|e| e.id).unwrap();
        f.remove_subtree(outer);

        assert!(f.children(root).is_empty());
        assert_eq!(f.index_of(inner_id), None);
        assert!(f.element(outer).is_none());
    }

    #[test]
    fn duplicate_ids_resolve_to_first_occurrence() {
        let mut f = Fragment::new();
        let root = f.root;
        let id = ElementId::intern("element-0");
        let mut first = Element::new("p");
        first.id = Some(id);
        let mut second = Element::new("p");
        second.id = Some(id);
        let a = f.append_child(root, Node::Element(first));
        f.append_child(root, Node::Element(second));
        assert_eq!(f.index_of(id), Some(a));
    }

    #[test]
    fn text_content_concatenates_nested_runs() {
        let mut f = Fragment::new();
        let root = f.root;
        let p = f.append_child(root, el("p"));
        f.append_child(p, Node::Text("Up to ".into()));
        let strong = f.append_child(p, el("strong"));
        f.append_child(strong, Node::Text("50% off".into()));
        f.append_child(p, Node::Text(" today".into()));
        assert_eq!(f.text_content(p), "Up to 50% off today");
    }

    #[test]
    fn set_text_content_flattens_children() {
        let mut f = Fragment::new();
        let root = f.root;
        let p = f.append_child(root, el("p"));
        let strong = f.append_child(p, el("strong"));
        f.append_child(strong, Node::Text("old".into()));

        f.set_text_content(p, "new text");
        assert_eq!(f.text_content(p), "new text");
        assert_eq!(f.children(p).len(), 1);

        f.set_text_content(p, "");
        assert!(f.children(p).is_empty());
    }

    #[test]
    fn assign_ids_is_idempotent() {
        let mut f = Fragment::new();
        let root = f.root;
        let a = f.append_child(root, el("div"));
        f.append_child(a, el("p"));
        let mut alloc = IdAllocator::new();

        f.assign_ids(&mut alloc);
        let ids: Vec<_> = f
            .document_order()
            .iter()
            .filter_map(|&ix| f.element(ix).and_then(|e| e.id))
            .collect();
        assert_eq!(ids.len(), 2);

        f.assign_ids(&mut alloc);
        let again: Vec<_> = f
            .document_order()
            .iter()
            .filter_map(|&ix| f.element(ix).and_then(|e| e.id))
            .collect();
        assert_eq!(ids, again, "re-running must assign nothing new");
    }

    #[test]
    fn assign_ids_avoids_imported_collisions() {
        let mut f = Fragment::new();
        let root = f.root;
        let fresh = f.append_child(root, el("p"));
        let mut tagged = Element::new("p");
        tagged.id = Some(ElementId::intern("element-0"));
        f.append_child(root, Node::Element(tagged));

        let mut alloc = IdAllocator::new();
        f.assign_ids(&mut alloc);
        let fresh_id = f.element(fresh).and_then(|e| e.id).unwrap();
        assert_eq!(fresh_id.as_str(), "element-1");
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut el = Element::new("img");
        el.set_attr("src", "a.png");
        el.set_attr("alt", "first");
        el.set_attr("src", "b.png");
        assert_eq!(el.attr("src"), Some("b.png"));
        assert_eq!(el.attrs[0].name, "src", "attribute order is stable");
    }

    #[test]
    fn class_list_splits_whitespace() {
        let mut el = Element::new("div");
        el.set_attr("class", "poster  hero\tbanner");
        assert_eq!(el.class_list(), vec!["poster", "hero", "banner"]);
    }
}
