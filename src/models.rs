//! Board Models
//!
//! Data structures matching the remote authority's JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned item identifier
pub type ItemId = u32;

/// Board column an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    #[default]
    New,
    Working,
    Complete,
}

impl Bucket {
    /// Columns in display order
    pub const ALL: [Bucket; 3] = [Bucket::New, Bucket::Working, Bucket::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::New => "new",
            Bucket::Working => "working",
            Bucket::Complete => "complete",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Bucket::New),
            "working" => Some(Bucket::Working),
            "complete" => Some(Bucket::Complete),
            _ => None,
        }
    }

    /// Column title
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::New => "New",
            Bucket::Working => "Working",
            Bucket::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work item (matches the authority's record)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Column, called `status` on the wire
    #[serde(rename = "status", default)]
    pub bucket: Bucket,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_id: Option<u32>,
    /// Rank within the bucket, dense from 0 once settled
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(id: ItemId, title: impl Into<String>, bucket: Bucket, position: i32) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            bucket,
            start_date: None,
            due_date: None,
            project_id: None,
            position,
            important: false,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Create payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "status")]
    pub bucket: Bucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u32>,
}

impl NewItem {
    pub fn new(title: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            title: title.into(),
            bucket,
            ..Default::default()
        }
    }
}

/// Partial update, absent fields are left untouched by the authority
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
    pub bucket: Option<Bucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl ItemPatch {
    /// Patch that only moves the item to another bucket
    pub fn bucket(bucket: Bucket) -> Self {
        Self {
            bucket: Some(bucket),
            ..Default::default()
        }
    }

    pub fn apply(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        if let Some(bucket) = self.bucket {
            item.bucket = bucket;
        }
        if let Some(date) = self.start_date {
            item.start_date = Some(date);
        }
        if let Some(date) = self.due_date {
            item.due_date = Some(date);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositionEntry {
    pub id: ItemId,
    pub position: i32,
}

/// Batch reposition request, applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositionBatch {
    pub items: Vec<RepositionEntry>,
}

impl RepositionBatch {
    pub fn new(items: Vec<RepositionEntry>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
