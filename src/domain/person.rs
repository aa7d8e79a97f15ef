//! Person records: the flat input the hierarchy is rebuilt from

use serde::{Deserialize, Serialize};

/// One person as supplied by the data store.
///
/// Only `id`, `parent_id` and `marriage_tags` drive the hierarchy; everything
/// else is carried along for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Id of the parent record (`pid` in the stored document)
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Marriage grouping tags; only the first entry is significant
    #[serde(rename = "tags", default, skip_serializing_if = "Vec::is_empty")]
    pub marriage_tags: Vec<String>,
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
}

impl PersonRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.marriage_tags.push(tag.into());
        self
    }

    /// Parent reference, trimmed. Blank and missing are the same thing.
    pub fn parent_ref(&self) -> Option<&str> {
        self.parent_id
            .as_deref()
            .map(str::trim)
            .filter(|pid| !pid.is_empty())
    }

    pub fn has_parent(&self) -> bool {
        self.parent_ref().is_some()
    }

    /// The authoritative marriage tag (first entry), if it is not blank.
    pub fn marriage_tag(&self) -> Option<&str> {
        self.marriage_tags
            .first()
            .map(String::as_str)
            .filter(|tag| !tag.trim().is_empty())
    }

    /// Both name and gender are present.
    ///
    /// Incomplete records still take part in the tree; list and stat views
    /// leave them out.
    pub fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.name) && present(&self.gender)
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
    }
}
