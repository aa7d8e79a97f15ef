//! Flat views over the person list: listing, statistics, tags and ids.
//!
//! These views apply the presentation policy of the family register:
//! incomplete records (no name or no gender) are left out of the list and
//! the statistics, but never out of the tree or of lookups by id.

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::domain::PersonRecord;

/// Head counts over complete records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub male: usize,
    pub female: usize,
}

/// Entry offered when picking a parent or spouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonChoice<'a> {
    pub id: &'a str,
    pub name: Option<&'a str>,
    pub gender: Option<&'a str>,
}

fn numeric_id(record: &PersonRecord) -> Option<i64> {
    record.id.trim().parse().ok()
}

/// Complete records ordered by numeric id; non-numeric ids go last, in input order.
pub fn complete_people(records: &[PersonRecord]) -> Vec<&PersonRecord> {
    records
        .iter()
        .filter(|r| r.is_complete())
        .sorted_by_key(|r| match numeric_id(r) {
            Some(n) => (0, n),
            None => (1, 0),
        })
        .collect()
}

/// Complete records whose name contains `query`, ignoring case. A blank
/// query matches everybody.
pub fn search<'a>(records: &'a [PersonRecord], query: &str) -> Vec<&'a PersonRecord> {
    let needle = query.trim().to_lowercase();
    complete_people(records)
        .into_iter()
        .filter(|r| r.display_name().to_lowercase().contains(&needle))
        .collect()
}

pub fn stats(records: &[PersonRecord]) -> Stats {
    let gender_is = |r: &PersonRecord, g: &str| {
        r.gender
            .as_deref()
            .is_some_and(|gender| gender.eq_ignore_ascii_case(g))
    };
    records
        .iter()
        .filter(|r| r.is_complete())
        .fold(Stats::default(), |mut acc, r| {
            acc.total += 1;
            if gender_is(r, "male") {
                acc.male += 1;
            } else if gender_is(r, "female") {
                acc.female += 1;
            }
            acc
        })
}

/// Every tag value in use (all entries, not just the first), sorted.
pub fn all_tags(records: &[PersonRecord]) -> Vec<&str> {
    records
        .iter()
        .flat_map(|r| r.marriage_tags.iter().map(String::as_str))
        .unique()
        .sorted()
        .collect()
}

/// Next free marriage tag of the form `<prefix><n>`.
pub fn next_marriage_tag(records: &[PersonRecord], prefix: &str) -> String {
    let pattern = format!(r"^{}(\d+)$", regex::escape(prefix));
    let max = match Regex::new(&pattern) {
        Ok(re) => records
            .iter()
            .filter_map(|r| r.marriage_tag())
            .filter_map(|tag| re.captures(tag))
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0),
        Err(_) => 0,
    };
    format!("{}{}", prefix, max + 1)
}

/// Tag to give a new spouse of `spouse_id`: the partner's existing tag,
/// or a fresh one when the partner is unmarried or unknown.
pub fn tag_for_new_spouse(records: &[PersonRecord], spouse_id: &str, prefix: &str) -> String {
    records
        .iter()
        .rev()
        .find(|r| r.id == spouse_id)
        .and_then(|r| r.marriage_tag())
        .map(str::to_string)
        .unwrap_or_else(|| next_marriage_tag(records, prefix))
}

/// Id for the next record: one past the highest numeric id.
pub fn next_person_id(records: &[PersonRecord]) -> String {
    let max = records.iter().map(|r| numeric_id(r).unwrap_or(0)).max();
    match max {
        Some(max) => (max + 1).to_string(),
        None => "1".to_string(),
    }
}

/// Everybody, complete or not, as a selectable parent.
pub fn parent_choices(records: &[PersonRecord]) -> Vec<PersonChoice<'_>> {
    records
        .iter()
        .map(|r| PersonChoice {
            id: &r.id,
            name: r.name.as_deref(),
            gender: r.gender.as_deref(),
        })
        .collect()
}
