//! Family register service
//!
//! Reads one snapshot of the person list and runs the hierarchy builder on it.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, SnapshotError};
use crate::config::Settings;
use crate::domain::{Forest, HierarchyBuilder, PersonRecord};
use crate::infrastructure::traits::FileSystem;

/// Parse a family document.
///
/// Accepts a bare array of people, or an object holding the array under the
/// first of `collection_keys` that is present.
pub fn parse_snapshot(
    content: &str,
    collection_keys: &[String],
) -> ApplicationResult<Vec<PersonRecord>> {
    let document: Value = serde_json::from_str(content).map_err(SnapshotError::from)?;

    let people = match document {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => collection_keys
            .iter()
            .find_map(|key| map.remove(key))
            .ok_or_else(|| SnapshotError::MissingCollection(collection_keys.to_vec()))?,
        other => return Err(SnapshotError::UnexpectedShape(kind(&other)).into()),
    };

    Ok(serde_json::from_value(people).map_err(SnapshotError::from)?)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Service for loading the family register and building its forest.
pub struct FamilyService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl FamilyService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read the whole person list in one go.
    ///
    /// A single read keeps the build on one consistent point in time.
    #[instrument(level = "debug", skip(self))]
    pub fn load_snapshot(&self, path: &Path) -> ApplicationResult<Vec<PersonRecord>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read family data", path)?;

        let records = parse_snapshot(&content, &self.settings.collection_keys).map_err(|e| match e {
            ApplicationError::Snapshot(source) => ApplicationError::InvalidSnapshot {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!("load_snapshot: {} records from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn builder(&self) -> HierarchyBuilder {
        HierarchyBuilder::new().rescue_parent_cycles(self.settings.rescue_parent_cycles)
    }

    pub fn build_forest(&self, records: &[PersonRecord]) -> Forest {
        self.builder().build(records)
    }

    /// Look up any record by id, complete or not. Last record wins on duplicates.
    pub fn find_person<'a>(
        &self,
        records: &'a [PersonRecord],
        id: &str,
    ) -> ApplicationResult<&'a PersonRecord> {
        records
            .iter()
            .rev()
            .find(|r| r.id == id)
            .ok_or_else(|| ApplicationError::PersonNotFound(id.to_string()))
    }
}
