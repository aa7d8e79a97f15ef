//! Presentation of render events: terminal trees and serializable views.

use serde::Serialize;
use termtree::Tree;

use crate::domain::{RenderEvent, TreeNode};

/// How people are labelled in the terminal tree.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub show_ids: bool,
    pub spouse_separator: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            show_ids: false,
            spouse_separator: " & ".to_string(),
        }
    }
}

impl RenderStyle {
    fn label(&self, node: &TreeNode) -> String {
        let person = &node.person;
        let mut label = person.display_name().to_string();
        if let Some(gender) = person.gender.as_deref().filter(|g| !g.is_empty()) {
            label.push_str(&format!(" ({})", gender));
        }
        if self.show_ids {
            label = format!("[{}] {}", node.id(), label);
        }
        label
    }
}

/// Fold a render sequence into one `termtree` per root.
///
/// A spouse is appended to the label of the person it was entered with;
/// skipped nodes become `↺` leaves.
pub fn to_termtrees<'a>(
    events: impl IntoIterator<Item = RenderEvent<'a>>,
    style: &RenderStyle,
) -> Vec<Tree<String>> {
    // One sibling list per open `OpenChildren`, plus the root level
    let mut levels: Vec<Vec<Tree<String>>> = vec![Vec::new()];

    for event in events {
        match event {
            RenderEvent::EnterPerson(node) => {
                if let Some(level) = levels.last_mut() {
                    level.push(Tree::new(style.label(node)));
                }
            }
            RenderEvent::EnterSpouse(node) => {
                if let Some(current) = levels.last_mut().and_then(|level| level.last_mut()) {
                    current.root.push_str(&style.spouse_separator);
                    current.root.push_str(&style.label(node));
                }
            }
            RenderEvent::NodeSkipped(id) => {
                if let Some(level) = levels.last_mut() {
                    level.push(Tree::new(format!("↺ {} (already shown)", id)));
                }
            }
            RenderEvent::OpenChildren => levels.push(Vec::new()),
            RenderEvent::CloseChildren => {
                let Some(children) = levels.pop() else {
                    continue;
                };
                match levels.last_mut().and_then(|level| level.last_mut()) {
                    Some(parent) => parent.leaves.extend(children),
                    // Unbalanced stream: keep what we have at the top level
                    None => levels.push(children),
                }
            }
        }
    }

    // Fold any unclosed levels back into their parents
    while levels.len() > 1 {
        if let Some(children) = levels.pop() {
            if let Some(parent) = levels.last_mut().and_then(|level| level.last_mut()) {
                parent.leaves.extend(children);
            }
        }
    }
    levels.pop().unwrap_or_default()
}

/// Owned, serializable form of a [`RenderEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventView {
    EnterPerson { id: String, name: String, primary: bool },
    EnterSpouse { id: String, name: String },
    OpenChildren,
    CloseChildren,
    NodeSkipped { id: String },
}

impl From<RenderEvent<'_>> for EventView {
    fn from(event: RenderEvent<'_>) -> Self {
        match event {
            RenderEvent::EnterPerson(node) => EventView::EnterPerson {
                id: node.id().to_string(),
                name: node.person.display_name().to_string(),
                primary: node.is_primary,
            },
            RenderEvent::EnterSpouse(node) => EventView::EnterSpouse {
                id: node.id().to_string(),
                name: node.person.display_name().to_string(),
            },
            RenderEvent::OpenChildren => EventView::OpenChildren,
            RenderEvent::CloseChildren => EventView::CloseChildren,
            RenderEvent::NodeSkipped(id) => EventView::NodeSkipped { id: id.to_string() },
        }
    }
}

impl std::fmt::Display for EventView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventView::EnterPerson { id, name, primary } => {
                write!(f, "person  {} {}", id, name)?;
                if *primary {
                    write!(f, " *")?;
                }
                Ok(())
            }
            EventView::EnterSpouse { id, name } => write!(f, "spouse  {} {}", id, name),
            EventView::OpenChildren => write!(f, "children {{"),
            EventView::CloseChildren => write!(f, "}}"),
            EventView::NodeSkipped { id } => write!(f, "skipped {}", id),
        }
    }
}
