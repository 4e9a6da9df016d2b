//! Arena-backed labeled trees.
//!
//! Nodes live in a flat vector and refer to their children by index, so a
//! tree never forms an ownership cycle and serializes as a plain list.

use std::fmt;

use crate::Result;
use crate::error::Error;
use crate::value::Value;

/// Index of a node within its [`NodeTree`]. The root is always 0.
pub type NodeId = usize;

/// One labeled element of a tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Node {
    /// Free-form label.
    pub label: String,
    /// Optional attached value.
    pub payload: Option<Value>,
    /// Child node indices, in insertion order.
    pub children: Vec<NodeId>,
}

/// A tree of [`Node`]s stored in an arena.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    /// Creates a single-node tree.
    #[must_use]
    pub fn new(label: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            nodes: vec![Node {
                label: label.into(),
                payload,
                children: Vec::new(),
            }],
        }
    }

    /// Rebuilds a tree from its arena, validating child links.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the arena is empty or any child index does
    /// not point forward to an existing node.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::invalid_input("node tree needs a root"));
        }
        for (id, node) in nodes.iter().enumerate() {
            if node.children.iter().any(|&c| c <= id || c >= nodes.len()) {
                return Err(Error::invalid_input(format!(
                    "node {id} has an invalid child link"
                )));
            }
        }
        Ok(Self { nodes })
    }

    /// The arena, root first.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `id` is not in the arena.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or_else(|| {
            Error::index_out_of_range(i64::try_from(id).unwrap_or(i64::MAX), self.nodes.len())
        })
    }

    /// Grafts a copy of `subtree` under node `parent`, returning the new
    /// index of the subtree's root.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `parent` is not in the arena.
    pub fn attach(&mut self, parent: NodeId, subtree: &NodeTree) -> Result<NodeId> {
        self.node(parent)?;
        let offset = self.nodes.len();
        for node in &subtree.nodes {
            let mut copy = node.clone();
            for child in &mut copy.children {
                *child += offset;
            }
            self.nodes.push(copy);
        }
        self.nodes[parent].children.push(offset);
        Ok(offset)
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn walk(tree: &NodeTree, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let node = &tree.nodes[id];
            write!(f, "({}", node.label)?;
            for &child in &node.children {
                write!(f, " ")?;
                walk(tree, child, f)?;
            }
            write!(f, ")")
        }
        walk(self, 0, f)
    }
}
