//! Tests for HierarchyBuilder

use rstest::rstest;

use kintree::domain::{Diagnostic, Forest, HierarchyBuilder, PersonRecord};
use kintree::util::testing;

fn person(id: &str, name: &str, gender: &str) -> PersonRecord {
    PersonRecord::new(id).with_name(name).with_gender(gender)
}

fn build(records: &[PersonRecord]) -> Forest {
    testing::init_test_setup();
    HierarchyBuilder::new().build(records)
}

fn root_ids(forest: &Forest) -> Vec<&str> {
    forest.root_nodes().map(|n| n.id()).collect()
}

fn child_ids<'a>(forest: &'a Forest, id: &str) -> Vec<&'a str> {
    let node = forest.node(id).expect("node exists");
    forest.children_of(node).map(|n| n.id()).collect()
}

fn spouse_id<'a>(forest: &'a Forest, id: &str) -> Option<&'a str> {
    let node = forest.node(id).expect("node exists");
    forest.spouse_of(node).map(|n| n.id())
}

fn is_primary(forest: &Forest, id: &str) -> bool {
    forest.node(id).expect("node exists").is_primary
}

// ============================================================
// Marriage pairs
// ============================================================

#[test]
fn given_pair_without_parents_when_building_then_single_root_with_spouse() {
    // Arrange: "1" is listed twice; the tagged record wins
    let records = vec![
        person("1", "Ann", "female"),
        person("2", "Bob", "male").with_tag("f1"),
        person("1", "Ann", "female").with_tag("f1"),
    ];

    // Act
    let forest = build(&records);

    // Assert: "1" is listed first, so it anchors the pair
    assert_eq!(root_ids(&forest), vec!["1"]);
    assert_eq!(spouse_id(&forest, "1"), Some("2"));
    assert_eq!(spouse_id(&forest, "2"), Some("1"));
    assert!(is_primary(&forest, "1"));
    assert!(!is_primary(&forest, "2"));
}

#[test]
fn given_pair_when_building_then_links_are_symmetric() {
    let records = vec![
        person("1", "Ann", "female").with_tag("f1"),
        person("2", "Bob", "male").with_tag("f1"),
    ];

    let forest = build(&records);

    assert_eq!(spouse_id(&forest, "1"), Some("2"));
    assert_eq!(spouse_id(&forest, "2"), Some("1"));
    assert_eq!(root_ids(&forest), vec!["1"]);
}

#[rstest]
#[case::neither_has_parent(false, false, "a")]
#[case::only_first_has_parent(true, false, "a")]
#[case::only_second_has_parent(false, true, "b")]
#[case::both_have_parents(true, true, "a")]
fn given_pair_when_building_then_primary_follows_parent_rule(
    #[case] a_has_parent: bool,
    #[case] b_has_parent: bool,
    #[case] expected_primary: &str,
) {
    // Arrange
    let mut a = person("a", "A", "female").with_tag("f1");
    let mut b = person("b", "B", "male").with_tag("f1");
    if a_has_parent {
        a = a.with_parent("p");
    }
    if b_has_parent {
        b = b.with_parent("p");
    }
    let records = vec![person("p", "P", "male"), a, b];

    // Act
    let forest = build(&records);

    // Assert: exactly one primary
    let other = if expected_primary == "a" { "b" } else { "a" };
    assert!(is_primary(&forest, expected_primary));
    assert!(!is_primary(&forest, other));
}

#[test]
fn given_whitespace_parent_in_pair_when_building_then_counts_as_no_parent() {
    // Arrange: "b" carries a blank parent, "a" is listed first
    let records = vec![
        person("a", "A", "female").with_tag("f1"),
        person("b", "B", "male").with_parent("  ").with_tag("f1"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    assert!(is_primary(&forest, "a"));
    assert!(!is_primary(&forest, "b"));
    assert_eq!(root_ids(&forest), vec!["a"]);
}

#[test]
fn given_spouse_marrying_into_family_when_building_then_not_a_second_root() {
    // Arrange: Bob is a child of Carl, Ann married in
    let records = vec![
        person("c", "Carl", "male"),
        person("a", "Ann", "female").with_tag("f1"),
        person("b", "Bob", "male").with_parent("c").with_tag("f1"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    assert_eq!(root_ids(&forest), vec!["c"]);
    assert_eq!(child_ids(&forest, "c"), vec!["b"]);
    assert!(is_primary(&forest, "b"));
    assert_eq!(spouse_id(&forest, "a"), Some("b"));
}

#[test]
fn given_lone_tag_holder_when_building_then_tag_is_ignored() {
    let records = vec![person("1", "Ann", "female").with_tag("f7")];

    let forest = build(&records);

    let node = forest.node("1").unwrap();
    assert!(node.spouse.is_none());
    assert!(node.spouses.is_empty());
    assert!(!node.is_primary);
    assert_eq!(root_ids(&forest), vec!["1"]);
}

#[test]
fn given_only_first_tag_entry_when_grouping_then_later_entries_are_ignored() {
    let records = vec![
        person("1", "Ann", "female").with_tag("f1").with_tag("f2"),
        person("2", "Bob", "male").with_tag("f2"),
    ];

    let forest = build(&records);

    assert_eq!(spouse_id(&forest, "1"), None);
    assert_eq!(spouse_id(&forest, "2"), None);
    assert_eq!(root_ids(&forest), vec!["1", "2"]);
}

// ============================================================
// Households with more than two members
// ============================================================

#[test]
fn given_multi_spouse_group_when_building_then_blood_relative_anchors() {
    // Arrange
    let records = vec![
        person("1", "Grandpa", "male"),
        person("2", "Raj", "male").with_parent("1").with_tag("f2"),
        person("3", "Sita", "female").with_tag("f2"),
        person("4", "Gita", "female").with_tag("f2"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    let anchor = forest.node("2").unwrap();
    assert!(anchor.is_primary);
    let partners: Vec<&str> = forest.spouses_of(anchor).map(|n| n.id()).collect();
    assert_eq!(partners, vec!["3", "4"]);
    for id in ["3", "4"] {
        assert_eq!(spouse_id(&forest, id), Some("2"));
        assert!(!is_primary(&forest, id));
    }
    assert_eq!(root_ids(&forest), vec!["1"]);
}

#[rstest]
#[case::nobody_has_parent(false)]
#[case::everybody_has_parent(true)]
fn given_multi_spouse_group_without_split_when_building_then_first_member_anchors(
    #[case] with_parents: bool,
) {
    // Arrange
    let members = ["x", "y", "z"].map(|id| {
        let p = person(id, id, "female").with_tag("f3");
        if with_parents {
            p.with_parent("root")
        } else {
            p
        }
    });
    let mut records = vec![person("root", "Root", "male")];
    records.extend(members);

    // Act
    let forest = build(&records);

    // Assert
    let anchor = forest.node("x").unwrap();
    assert!(anchor.is_primary);
    assert_eq!(anchor.spouses.len(), 2);
    assert_eq!(spouse_id(&forest, "y"), Some("x"));
    assert_eq!(spouse_id(&forest, "z"), Some("x"));
    let expected_roots = if with_parents {
        vec!["root"]
    } else {
        vec!["root", "x"]
    };
    assert_eq!(root_ids(&forest), expected_roots);
}

// ============================================================
// Children and roots
// ============================================================

#[test]
fn given_child_with_known_parent_when_building_then_attached_not_root() {
    let records = vec![
        person("1", "Ann", "female"),
        person("10", "Kid", "male").with_parent("1"),
    ];

    let forest = build(&records);

    assert_eq!(child_ids(&forest, "1"), vec!["10"]);
    assert!(!root_ids(&forest).contains(&"10"));
    assert_eq!(forest.node("10").unwrap().parent, forest.index_of("1"));
}

#[test]
fn given_children_out_of_order_when_building_then_keeps_input_order() {
    let records = vec![
        person("c3", "C3", "male").with_parent("p"),
        person("p", "P", "female"),
        person("c1", "C1", "male").with_parent("p"),
        person("c2", "C2", "female").with_parent("p"),
    ];

    let forest = build(&records);

    assert_eq!(child_ids(&forest, "p"), vec!["c3", "c1", "c2"]);
}

#[test]
fn given_several_roots_when_building_then_roots_follow_input_order() {
    let records = vec![
        person("9", "Z", "male"),
        person("3", "Y", "female"),
        person("5", "X", "male"),
    ];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["9", "3", "5"]);
}

#[test]
fn given_unknown_parent_when_building_then_record_is_dropped() {
    // Arrange
    let records = vec![
        person("1", "Ann", "female"),
        person("5", "X", "male").with_parent("999"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    assert_eq!(root_ids(&forest), vec!["1"]);
    assert!(child_ids(&forest, "1").is_empty());
    assert!(forest.node("5").is_some(), "still indexed for lookups");
    assert_eq!(
        forest.diagnostics(),
        &[Diagnostic::OrphanedParent {
            id: "5".into(),
            parent_id: "999".into()
        }]
    );
}

#[rstest]
#[case::empty("")]
#[case::blank("   ")]
fn given_blank_parent_when_building_then_treated_as_root(#[case] pid: &str) {
    let records = vec![person("1", "Ann", "female").with_parent(pid)];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["1"]);
}

#[test]
fn given_padded_parent_id_when_building_then_trimmed_for_lookup() {
    let records = vec![
        person("1", "Ann", "female"),
        person("2", "Kid", "male").with_parent(" 1 "),
    ];

    let forest = build(&records);

    assert_eq!(child_ids(&forest, "1"), vec!["2"]);
}

#[test]
fn given_incomplete_record_when_building_then_still_part_of_tree() {
    let records = vec![
        PersonRecord::new("1"),
        person("2", "Kid", "male").with_parent("1"),
    ];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["1"]);
    assert_eq!(child_ids(&forest, "1"), vec!["2"]);
}

// ============================================================
// Malformed input
// ============================================================

#[test]
fn given_duplicate_ids_when_building_then_last_wins_and_root_is_unique() {
    // Arrange
    let records = vec![
        person("3", "Old", "male"),
        person("3", "New", "male"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    assert_eq!(root_ids(&forest), vec!["3"]);
    assert_eq!(forest.node("3").unwrap().person.name.as_deref(), Some("New"));
    assert_eq!(forest.len(), 1);
    assert_eq!(
        forest.diagnostics(),
        &[Diagnostic::DuplicateId {
            id: "3".into(),
            position: 1
        }]
    );
}

#[test]
fn given_duplicate_id_with_parent_on_winning_record_when_building_then_attached_to_parent() {
    // Arrange
    let records = vec![
        person("2", "Parent", "female"),
        person("1", "Old", "male"),
        person("1", "New", "male").with_parent("2"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    assert_eq!(root_ids(&forest), vec!["2"]);
    assert_eq!(child_ids(&forest, "2"), vec!["1"]);
    assert_eq!(forest.node("1").unwrap().parent, forest.index_of("2"));
}

#[test]
fn given_duplicate_id_when_winning_record_drops_parent_then_becomes_root() {
    let records = vec![
        person("2", "Parent", "female"),
        person("1", "Old", "male").with_parent("2"),
        person("1", "New", "male"),
    ];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["2", "1"]);
    assert!(child_ids(&forest, "2").is_empty());
}

#[test]
fn given_duplicate_id_when_only_earlier_record_is_tagged_then_not_grouped() {
    // Arrange: the tag lives on the overwritten record only
    let records = vec![
        person("1", "Old", "male").with_tag("f1"),
        person("2", "Bea", "female").with_tag("f1"),
        person("1", "New", "male"),
    ];

    // Act
    let forest = build(&records);

    // Assert
    assert_eq!(spouse_id(&forest, "1"), None);
    assert_eq!(spouse_id(&forest, "2"), None);
    assert_eq!(root_ids(&forest), vec!["1", "2"]);
}

#[test]
fn given_record_without_id_when_building_then_ignored() {
    let records = vec![PersonRecord::default().with_name("Nobody"), person("1", "Ann", "female")];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["1"]);
    assert_eq!(forest.diagnostics(), &[Diagnostic::MissingId { position: 0 }]);
}

#[test]
fn given_self_parent_when_building_then_promoted_to_root() {
    let records = vec![person("A", "Loop", "male").with_parent("A")];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["A"]);
    assert_eq!(child_ids(&forest, "A"), vec!["A"]);
    assert_eq!(
        forest.diagnostics(),
        &[Diagnostic::ParentCycle { id: "A".into() }]
    );
}

#[test]
fn given_mutual_parents_when_building_then_first_listed_is_root() {
    let records = vec![
        person("x", "X", "male"),
        person("b", "B", "male").with_parent("a"),
        person("a", "A", "female").with_parent("b"),
        person("c", "C", "female").with_parent("a"),
    ];

    let forest = build(&records);

    assert_eq!(root_ids(&forest), vec!["x", "b"]);
    assert_eq!(forest.diagnostics().len(), 1);
}

#[test]
fn given_cycle_rescue_disabled_when_building_then_cycle_is_not_rendered() {
    testing::init_test_setup();
    let records = vec![person("A", "Loop", "male").with_parent("A")];

    let forest = HierarchyBuilder::new()
        .rescue_parent_cycles(false)
        .build(&records);

    assert!(forest.roots().is_empty());
    assert!(forest.diagnostics().is_empty());
}

#[test]
fn given_empty_input_when_building_then_empty_forest() {
    let forest = build(&[]);

    assert!(forest.is_empty());
    assert!(forest.roots().is_empty());
    assert_eq!(forest.depth(), 0);
}

#[test]
fn given_any_input_when_building_then_root_ids_are_unique() {
    let records = vec![
        person("1", "A", "male").with_tag("f1"),
        person("1", "A", "male").with_tag("f1"),
        person("2", "B", "female").with_tag("f1"),
        person("3", "C", "male"),
        person("3", "C", "male"),
        person("4", "D", "male").with_parent("4"),
    ];

    let forest = build(&records);

    let mut ids = root_ids(&forest);
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}
