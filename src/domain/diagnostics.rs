//! Data-quality findings collected while building a forest.
//!
//! None of these stop a build. They describe where the builder fell back to
//! its default resolution rule so callers can report bad data.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Record at `position` has an empty id and was ignored.
    MissingId { position: usize },
    /// A later record reused `id`; the record at `position` replaced the earlier one.
    DuplicateId { id: String, position: usize },
    /// `parent_id` does not resolve; the record was left out of the forest.
    OrphanedParent { id: String, parent_id: String },
    /// `id` sits on a parent cycle and was promoted to a root.
    ParentCycle { id: String },
}

impl Diagnostic {
    pub fn id(&self) -> Option<&str> {
        match self {
            Diagnostic::MissingId { .. } => None,
            Diagnostic::DuplicateId { id, .. }
            | Diagnostic::OrphanedParent { id, .. }
            | Diagnostic::ParentCycle { id } => Some(id),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingId { position } => {
                write!(f, "record #{} has no id, ignored", position)
            }
            Diagnostic::DuplicateId { id, position } => {
                write!(f, "duplicate id {}: record #{} wins", id, position)
            }
            Diagnostic::OrphanedParent { id, parent_id } => {
                write!(f, "{} references unknown parent {}, dropped", id, parent_id)
            }
            Diagnostic::ParentCycle { id } => {
                write!(f, "{} is part of a parent cycle, shown as root", id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_orphan_when_displayed_then_names_both_ids() {
        let d = Diagnostic::OrphanedParent {
            id: "5".into(),
            parent_id: "999".into(),
        };
        assert_eq!(d.id(), Some("5"));
        assert_eq!(d.to_string(), "5 references unknown parent 999, dropped");
    }

    #[test]
    fn given_missing_id_when_asking_id_then_none() {
        assert_eq!(Diagnostic::MissingId { position: 3 }.id(), None);
    }
}
