//! Flattening a forest into a render sequence.
//!
//! The flattener walks the forest depth-first in pre-order and yields
//! [`RenderEvent`]s lazily. A visited-id set, local to each flattener,
//! guarantees every person is entered at most once; revisits produce
//! [`RenderEvent::NodeSkipped`] so parent cycles terminate visibly.

use std::collections::HashSet;

use generational_arena::Index;

use crate::domain::arena::{Forest, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderEvent<'a> {
    EnterPerson(&'a TreeNode),
    EnterSpouse(&'a TreeNode),
    OpenChildren,
    CloseChildren,
    /// Person was already rendered; the subtree below it is not repeated.
    NodeSkipped(&'a str),
}

impl<'a> RenderEvent<'a> {
    /// Person id the event refers to, if any.
    pub fn id(&self) -> Option<&'a str> {
        match *self {
            RenderEvent::EnterPerson(node) | RenderEvent::EnterSpouse(node) => Some(node.id()),
            RenderEvent::NodeSkipped(id) => Some(id),
            RenderEvent::OpenChildren | RenderEvent::CloseChildren => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Visit(Index),
    Spouse(Index),
    Open,
    Close,
}

/// Lazy, cycle-safe pre-order traversal of a [`Forest`].
///
/// Each flattener starts from scratch; create a new one to re-traverse.
pub struct TreeFlattener<'a> {
    forest: &'a Forest,
    stack: Vec<Step>,
    visited: HashSet<&'a str>,
}

impl<'a> TreeFlattener<'a> {
    pub fn new(forest: &'a Forest) -> Self {
        Self::from_roots(forest, forest.roots())
    }

    /// Traverse only the subtrees below `roots`, in the given order.
    pub fn from_roots(forest: &'a Forest, roots: &[Index]) -> Self {
        // Reversed so the first root is popped first
        let stack = roots.iter().rev().map(|&idx| Step::Visit(idx)).collect();
        Self {
            forest,
            stack,
            visited: HashSet::new(),
        }
    }

    fn schedule(&mut self, node: &TreeNode) {
        // LIFO: pushed in reverse of the emission order
        if !node.children.is_empty() {
            self.stack.push(Step::Close);
            for &child in node.children.iter().rev() {
                self.stack.push(Step::Visit(child));
            }
            self.stack.push(Step::Open);
        }
        for &spouse in node.spouses.iter().rev() {
            self.stack.push(Step::Spouse(spouse));
        }
        if let Some(spouse) = node.spouse {
            self.stack.push(Step::Spouse(spouse));
        }
    }
}

impl<'a> Iterator for TreeFlattener<'a> {
    type Item = RenderEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let forest = self.forest;
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Visit(idx) => {
                    let Some(node) = forest.get_node(idx) else {
                        continue;
                    };
                    if !self.visited.insert(node.id()) {
                        return Some(RenderEvent::NodeSkipped(node.id()));
                    }
                    self.schedule(node);
                    return Some(RenderEvent::EnterPerson(node));
                }
                Step::Spouse(idx) => {
                    // Spouses are leaves here: their own links are not followed
                    if let Some(node) = forest.get_node(idx) {
                        if self.visited.insert(node.id()) {
                            return Some(RenderEvent::EnterSpouse(node));
                        }
                    }
                }
                Step::Open => return Some(RenderEvent::OpenChildren),
                Step::Close => return Some(RenderEvent::CloseChildren),
            }
        }
        None
    }
}
