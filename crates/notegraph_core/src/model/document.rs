//! Document handle model for notes and schemas.
//!
//! # Responsibility
//! - Describe the documents the external store hands to the graph engine.
//! - Keep note and schema fields in one tagged variant so identity rules are
//!   selected by exhaustive `match` instead of dynamic dispatch.
//!
//! # Invariants
//! - `id` is the store-internal identifier and never changes for a document.
//! - `children` holds child ids in declaration order.
//! - A note is a structural root when its `fname` is [`ROOT_FNAME`].
//!
//! # See also
//! - crate::graph::identity

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// File name shared by every hierarchy root (one per vault).
pub const ROOT_FNAME: &str = "root";

/// Document family rendered by a graph view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Markdown notes addressed by `fname.id`.
    Note,
    /// Schema entries addressed by id alone.
    Schema,
}

impl DocumentKind {
    /// Every kind known to the engine, in reload order.
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Note, DocumentKind::Schema];

    /// Stable lowercase name used in logs and CLI arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Schema => "schema",
        }
    }

    /// Parses a CLI/config value (`note|notes|schema|schemas`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "note" | "notes" => Some(Self::Note),
            "schema" | "schemas" => Some(Self::Schema),
            _ => None,
        }
    }
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One note as exposed by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteHandle {
    pub id: String,
    /// Hierarchical file name without extension, e.g. `projects.rust`.
    pub fname: String,
    /// Empty for stub notes that only exist to hold children.
    #[serde(default)]
    pub title: String,
    /// Vault directory relative to the workspace root.
    #[serde(default)]
    pub vault: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl NoteHandle {
    pub fn is_root(&self) -> bool {
        self.fname == ROOT_FNAME
    }
}

/// One schema entry inside a schema module file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaHandle {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// File name of the owning schema module, without extension.
    pub module: String,
    #[serde(default)]
    pub vault: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Opaque reference to one node of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentHandle {
    Note(NoteHandle),
    Schema(SchemaHandle),
}

impl DocumentHandle {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Note(_) => DocumentKind::Note,
            Self::Schema(_) => DocumentKind::Schema,
        }
    }

    /// Store-internal id (not the graph node id).
    pub fn internal_id(&self) -> &str {
        match self {
            Self::Note(note) => note.id.as_str(),
            Self::Schema(schema) => schema.id.as_str(),
        }
    }

    /// Raw title; schemas without a title report an empty string.
    pub fn title(&self) -> &str {
        match self {
            Self::Note(note) => note.title.as_str(),
            Self::Schema(schema) => schema.title.as_deref().unwrap_or(""),
        }
    }

    pub fn children(&self) -> &[String] {
        match self {
            Self::Note(note) => &note.children,
            Self::Schema(schema) => &schema.children,
        }
    }
}

impl From<NoteHandle> for DocumentHandle {
    fn from(value: NoteHandle) -> Self {
        Self::Note(value)
    }
}

impl From<SchemaHandle> for DocumentHandle {
    fn from(value: SchemaHandle) -> Self {
        Self::Schema(value)
    }
}
