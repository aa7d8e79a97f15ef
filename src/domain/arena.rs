use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::diagnostics::Diagnostic;
use crate::domain::flatten::{RenderEvent, TreeFlattener};
use crate::domain::person::PersonRecord;

/// Tree node in the arena-based family forest.
///
/// All links are arena indices. The arena owns every node; `children` is the
/// only link that expresses tree ownership, `spouse` and `spouses` are plain
/// references to nodes placed elsewhere in the forest.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Person this node stands for
    pub person: PersonRecord,
    /// Node this one was attached under, None for roots and dropped nodes
    pub parent: Option<Index>,
    /// Children in input order
    pub children: Vec<Index>,
    /// Partner of a two-person marriage, or the anchor of a larger household
    pub spouse: Option<Index>,
    /// Partners of a household anchor (groups of more than two)
    pub spouses: Vec<Index>,
    /// Anchor of its marriage group for root selection and rendering
    pub is_primary: bool,
}

impl TreeNode {
    pub fn new(person: PersonRecord) -> Self {
        Self {
            person,
            parent: None,
            children: Vec::new(),
            spouse: None,
            spouses: Vec::new(),
            is_primary: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.person.id
    }

    pub fn has_spouse_link(&self) -> bool {
        self.spouse.is_some()
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.person.display_name(), self.id())
    }
}

/// Forest of family trees produced by [`HierarchyBuilder`](crate::domain::HierarchyBuilder).
///
/// Holds every indexed person, whether or not it ended up reachable from a
/// root, so lookups by id work for dropped records too.
#[derive(Debug, Default)]
pub struct Forest {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// id -> node, one entry per distinct id
    by_id: HashMap<String, Index>,
    /// Root nodes in input order
    roots: Vec<Index>,
    diagnostics: Vec<Diagnostic>,
}

impl Forest {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store `person`, replacing the record of an already indexed id.
    ///
    /// Returns the node index and whether an earlier record was replaced.
    pub(crate) fn upsert(&mut self, person: PersonRecord) -> (Index, bool) {
        if let Some(&idx) = self.by_id.get(&person.id) {
            if let Some(node) = self.arena.get_mut(idx) {
                node.person = person;
            }
            return (idx, true);
        }
        let id = person.id.clone();
        let idx = self.arena.insert(TreeNode::new(person));
        self.by_id.insert(id, idx);
        (idx, false)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<Index>) {
        self.roots = roots;
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    /// Look up a node by person id.
    pub fn node(&self, id: &str) -> Option<&TreeNode> {
        self.index_of(id).and_then(|idx| self.get_node(idx))
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_nodes(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.roots.iter().filter_map(|&idx| self.get_node(idx))
    }

    pub fn spouse_of(&self, node: &TreeNode) -> Option<&TreeNode> {
        node.spouse.and_then(|idx| self.get_node(idx))
    }

    pub fn spouses_of<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.spouses.iter().filter_map(|&idx| self.get_node(idx))
    }

    pub fn children_of<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.children.iter().filter_map(|&idx| self.get_node(idx))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of distinct people indexed.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Render sequence over all roots.
    pub fn flatten(&self) -> TreeFlattener<'_> {
        TreeFlattener::new(self)
    }

    /// Number of generations on the longest rendered line of descent.
    ///
    /// Walks the render sequence, so cyclic input still terminates.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut level = 1;
        let mut max_depth = 0;
        for event in self.flatten() {
            match event {
                RenderEvent::EnterPerson(_) => max_depth = max_depth.max(level),
                RenderEvent::OpenChildren => level += 1,
                RenderEvent::CloseChildren => level -= 1,
                RenderEvent::EnterSpouse(_) | RenderEvent::NodeSkipped(_) => {}
            }
        }
        max_depth
    }
}
