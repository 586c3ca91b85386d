use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for a stored document, assigned by the database on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a section, assigned client-side before persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId(pub Uuid);

impl SectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier shared by every row produced by one crawl attempt of one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationId(pub Uuid);

impl GenerationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sha-256 digest of a document's raw content, kept for record-keeping only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn from_content(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One node of a chunked document: a heading plus the body that follows it,
/// with deeper headings nested as children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionNode {
    pub heading: String,
    pub level: i32,
    pub content: String,
    pub children: Vec<SectionNode>,
}

impl SectionNode {
    pub fn new(heading: impl Into<String>, level: i32, content: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            level,
            content: content.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SectionNode>) -> Self {
        self.children = children;
        self
    }
}

/// One ingested page as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub domain: String,
    pub url: String,
    pub path: String,
    pub content_hash: ContentHash,
    pub generation_id: GenerationId,
    pub generation_active: bool,
    pub inserted_at: DateTime<Utc>,
}

/// A document row to insert. The store assigns the id and the row starts
/// inactive; it becomes visible only when its generation is activated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub domain: String,
    pub url: String,
    pub path: String,
    pub content_hash: ContentHash,
    pub generation_id: GenerationId,
}

/// One flattened node of a document's content tree, fully formed before insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub document_id: DocumentId,
    pub parent_section_id: Option<SectionId>,
    pub heading: String,
    pub level: i32,
    pub content: String,
    pub position: i32,
}

/// A search match: a section joined with its owning document's location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHit {
    pub section: Section,
    pub url: String,
    pub path: String,
}
