//! Hierarchy builder: rebuilds the family forest from flat person records.

use std::collections::{BTreeMap, HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::Forest;
use crate::domain::diagnostics::Diagnostic;
use crate::domain::person::PersonRecord;

/// Constructs a [`Forest`] from person records.
///
/// The only relationship hints are the parent reference and the shared
/// marriage tag. Building is total: malformed input degrades to the
/// documented fallbacks and is reported through [`Forest::diagnostics`].
#[derive(Debug, Clone)]
pub struct HierarchyBuilder {
    rescue_parent_cycles: bool,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self {
            rescue_parent_cycles: true,
        }
    }

    /// Promote one member of every parent cycle to a root (default: on).
    ///
    /// Without it, people whose ancestry loops back onto itself are not
    /// reachable from any root and silently disappear from the render.
    pub fn rescue_parent_cycles(mut self, enabled: bool) -> Self {
        self.rescue_parent_cycles = enabled;
        self
    }

    /// Build the forest. State lives only for the duration of the call.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn build(&self, records: &[PersonRecord]) -> Forest {
        let mut forest = Forest::new();

        index_records(&mut forest, records);
        let order = first_appearances(&forest, records);

        for (tag, members) in group_by_marriage_tag(&forest, &order) {
            trace!(tag = %tag, size = members.len(), "resolving marriage group");
            resolve_marriage_group(&mut forest, &members);
        }

        let mut roots = attach_children(&mut forest, &order);

        if self.rescue_parent_cycles {
            roots.extend(find_parent_cycles(&mut forest, &order));
        }

        roots.sort_by_key(|&(position, _)| position);
        debug!(roots = roots.len(), people = forest.len(), "forest built");
        forest.set_roots(roots.into_iter().map(|(_, idx)| idx).collect());
        forest
    }
}

/// Arena node per distinct id, last record wins.
fn index_records(forest: &mut Forest, records: &[PersonRecord]) {
    for (position, record) in records.iter().enumerate() {
        if record.id.is_empty() {
            debug!(position, "record without id ignored");
            forest.push_diagnostic(Diagnostic::MissingId { position });
            continue;
        }
        let (_, replaced) = forest.upsert(record.clone());
        if replaced {
            debug!(id = %record.id, position, "duplicate id, later record wins");
            forest.push_diagnostic(Diagnostic::DuplicateId {
                id: record.id.clone(),
                position,
            });
        }
    }
}

/// Each indexed node once, at the input position where its id first appears.
///
/// Later steps read the node's (winning) record, never the positional one.
fn first_appearances(forest: &Forest, records: &[PersonRecord]) -> Vec<(usize, Index)> {
    let mut seen = HashSet::new();
    records
        .iter()
        .enumerate()
        .filter_map(|(position, record)| Some((position, forest.index_of(&record.id)?)))
        .filter(|&(_, idx)| seen.insert(idx))
        .collect()
}

/// Buckets of node indices per marriage tag, members in first-appearance order.
fn group_by_marriage_tag(forest: &Forest, order: &[(usize, Index)]) -> BTreeMap<String, Vec<Index>> {
    let mut groups: BTreeMap<String, Vec<Index>> = BTreeMap::new();
    for &(_, idx) in order {
        let Some(tag) = forest.get_node(idx).and_then(|node| node.person.marriage_tag()) else {
            continue;
        };
        groups.entry(tag.to_string()).or_default().push(idx);
    }
    groups
}

fn has_parent(forest: &Forest, idx: Index) -> bool {
    forest
        .get_node(idx)
        .is_some_and(|node| node.person.has_parent())
}

fn resolve_marriage_group(forest: &mut Forest, members: &[Index]) {
    match members {
        [] | [_] => {}
        &[a, b] => link_pair(forest, a, b),
        _ => link_household(forest, members),
    }
}

/// Symmetric spouse link; the one with a parent anchors, else the first listed.
fn link_pair(forest: &mut Forest, a: Index, b: Index) {
    let primary = if has_parent(forest, b) && !has_parent(forest, a) {
        b
    } else {
        a
    };
    for (this, other) in [(a, b), (b, a)] {
        if let Some(node) = forest.get_node_mut(this) {
            node.spouse = Some(other);
            node.is_primary = this == primary;
        }
    }
}

/// Groups of three or more: one anchor carries everybody else as `spouses`.
fn link_household(forest: &mut Forest, members: &[Index]) {
    let (blood, married_in): (Vec<Index>, Vec<Index>) = members
        .iter()
        .partition(|&&idx| has_parent(forest, idx));

    let (anchor, partners) = match blood.first() {
        Some(&anchor) if !married_in.is_empty() => (anchor, married_in),
        _ => (members[0], members[1..].to_vec()),
    };

    for &partner in &partners {
        if let Some(node) = forest.get_node_mut(partner) {
            node.spouse = Some(anchor);
            node.is_primary = false;
        }
    }
    if let Some(node) = forest.get_node_mut(anchor) {
        node.is_primary = true;
        node.spouses = partners;
    }
}

/// Place each node once: under its parent, as a root, or nowhere.
///
/// Returns root candidates tagged with their first input position.
fn attach_children(forest: &mut Forest, order: &[(usize, Index)]) -> Vec<(usize, Index)> {
    let mut roots = Vec::new();

    for &(position, idx) in order {
        let Some(node) = forest.get_node(idx) else {
            continue;
        };
        let id = node.id().to_string();
        let renders_as_root = !node.has_spouse_link() || node.is_primary;

        match node.person.parent_ref().map(str::to_string) {
            Some(parent_id) => match forest.index_of(&parent_id) {
                Some(parent_idx) => {
                    if let Some(parent) = forest.get_node_mut(parent_idx) {
                        parent.children.push(idx);
                    }
                    if let Some(child) = forest.get_node_mut(idx) {
                        child.parent = Some(parent_idx);
                    }
                }
                None => {
                    debug!(id = %id, parent_id = %parent_id, "unknown parent, record dropped");
                    forest.push_diagnostic(Diagnostic::OrphanedParent { id, parent_id });
                }
            },
            None => {
                if renders_as_root {
                    roots.push((position, idx));
                } else {
                    trace!(id = %id, "non-primary spouse, rendered with partner");
                }
            }
        }
    }
    roots
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Nodes whose parent chain loops back onto itself, one per cycle.
///
/// The member appearing first in the input represents its cycle.
fn find_parent_cycles(forest: &mut Forest, order: &[(usize, Index)]) -> Vec<(usize, Index)> {
    let first_seen: HashMap<Index, usize> = order.iter().map(|&(position, idx)| (idx, position)).collect();

    let mut marks: HashMap<Index, Mark> = HashMap::new();
    let mut rescued = Vec::new();

    for &(_, start) in order {
        let mut path = Vec::new();
        let mut current = Some(start);

        while let Some(idx) = current {
            match marks.get(&idx) {
                Some(Mark::Done) => break,
                Some(Mark::OnPath) => {
                    let loop_start = path.iter().position(|&p| p == idx).unwrap_or(0);
                    if let Some(&representative) = path[loop_start..]
                        .iter()
                        .min_by_key(|&p| first_seen.get(p).copied().unwrap_or(usize::MAX))
                    {
                        let position = first_seen.get(&representative).copied().unwrap_or(usize::MAX);
                        rescued.push((position, representative));
                    }
                    break;
                }
                None => {
                    marks.insert(idx, Mark::OnPath);
                    path.push(idx);
                    current = forest.get_node(idx).and_then(|node| node.parent);
                }
            }
        }
        for idx in path {
            marks.insert(idx, Mark::Done);
        }
    }

    for &(_, idx) in &rescued {
        if let Some(node) = forest.get_node(idx) {
            let id = node.id().to_string();
            debug!(id = %id, "parent cycle, promoting to root");
            forest.push_diagnostic(Diagnostic::ParentCycle { id });
        }
    }
    rescued
}
