//! Per-kind identity rules for graph nodes.
//!
//! # Responsibility
//! - Derive node id, filesystem path and label from one handle.
//! - Keep kind-specific rules in one lookup table.
//!
//! # Invariants
//! - Identical handle state yields an identical [`NodeIdentity`].
//! - Note ids are `fname.id`; schema ids are the bare schema id.
//! - Schema labels never come out empty; note labels may (stub notes).

use crate::model::document::{DocumentHandle, DocumentKind};
use crate::model::graph::GraphNode;
use std::path::Path;

/// Identity rules for one document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRules {
    pub kind: DocumentKind,
    /// File extension including the leading dot.
    pub extension: &'static str,
    /// Title-less handles of this kind are stubs and never become nodes.
    pub requires_title: bool,
    /// Human-readable name used in surface titles.
    pub display_name: &'static str,
}

const NOTE_RULES: KindRules = KindRules {
    kind: DocumentKind::Note,
    extension: ".md",
    requires_title: true,
    display_name: "Notes",
};

const SCHEMA_RULES: KindRules = KindRules {
    kind: DocumentKind::Schema,
    extension: ".yml",
    requires_title: false,
    display_name: "Schema",
};

/// Returns the rule table entry for `kind`.
pub fn rules_for(kind: DocumentKind) -> &'static KindRules {
    match kind {
        DocumentKind::Note => &NOTE_RULES,
        DocumentKind::Schema => &SCHEMA_RULES,
    }
}

/// Resolved identity of one handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub id: String,
    pub path: String,
    pub label: String,
}

impl NodeIdentity {
    /// Whether this identity belongs to a title-less stub of a titled kind.
    pub fn is_stub(&self, kind: DocumentKind) -> bool {
        rules_for(kind).requires_title && self.label.trim().is_empty()
    }

    pub fn into_node(self) -> GraphNode {
        GraphNode {
            id: self.id,
            path: self.path,
            label: self.label,
        }
    }
}

/// Whether `handle` is a title-less stub that never becomes a node.
pub fn is_stub_handle(handle: &DocumentHandle) -> bool {
    rules_for(handle.kind()).requires_title && node_label(handle).trim().is_empty()
}

/// Resolves id, path and label for `handle` under `workspace_root`.
pub fn identify(handle: &DocumentHandle, workspace_root: &Path) -> NodeIdentity {
    NodeIdentity {
        id: node_id(handle),
        path: document_path(handle, workspace_root),
        label: node_label(handle),
    }
}

/// Graph node id for `handle`.
pub fn node_id(handle: &DocumentHandle) -> String {
    match handle {
        DocumentHandle::Note(note) => format!("{}.{}", note.fname, note.id),
        DocumentHandle::Schema(schema) => schema.id.clone(),
    }
}

/// Absolute file path of the document backing `handle`.
pub fn document_path(handle: &DocumentHandle, workspace_root: &Path) -> String {
    let (vault, file_stem) = match handle {
        DocumentHandle::Note(note) => (note.vault.as_deref(), note.fname.as_str()),
        DocumentHandle::Schema(schema) => (schema.vault.as_deref(), schema.module.as_str()),
    };
    let extension = rules_for(handle.kind()).extension;

    let mut path = workspace_root.to_path_buf();
    if let Some(vault) = vault.map(str::trim).filter(|value| !value.is_empty()) {
        path.push(vault);
    }
    path.push(format!("{file_stem}{extension}"));
    path.to_string_lossy().into_owned()
}

fn node_label(handle: &DocumentHandle) -> String {
    match handle {
        DocumentHandle::Note(note) => note.title.clone(),
        DocumentHandle::Schema(schema) => match schema.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => schema.id.clone(),
        },
    }
}

/// Whether `path` carries the file extension of `kind`.
pub fn matches_kind_extension(kind: DocumentKind, path: &str) -> bool {
    path.ends_with(rules_for(kind).extension)
}
