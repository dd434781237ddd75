//! Rendering-surface boundary.
//!
//! # Responsibility
//! - Define the collaborator traits the host implements (surface, surface
//!   factory, file opener, notifier).
//! - Define the wire messages exchanged with a surface.
//!
//! # Invariants
//! - Outbound and inbound payload shapes are stable across hosts:
//!   `{type, payload}` with camelCase type tags.
//! - The engine never lays out or draws the graph; it only posts payloads.

use crate::model::graph::Graph;
use crate::model::view::ViewKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod content;

pub use content::WebviewTemplate;

/// Editor column a surface or document is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewColumn {
    Active,
    Beside,
    One,
    Two,
    Three,
}

/// Messages posted from the engine to a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Full graph replacement.
    Refresh(Graph),
    /// A document was opened in the editor; surfaces may highlight it.
    FileOpen { path: String },
}

/// Messages a surface sends back to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Surface script finished loading and wants the current graph.
    Ready,
    /// User clicked the node stored at `path`.
    Click { path: String },
}

impl InboundMessage {
    /// Parses one raw JSON message from a surface.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Host-side rendering surface (webview panel or equivalent).
pub trait RenderSurface: Send + Sync {
    /// Replaces the surface document.
    fn set_content(&self, html: String);
    /// Posts one message; returns `false` when the surface dropped it.
    fn post(&self, message: &OutboundMessage) -> bool;
    /// Maps a bundled asset file name to a URI the surface can load.
    fn asset_uri(&self, file_name: &str) -> String;
}

/// Creates rendering surfaces on first show of a view key.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self, key: ViewKey, title: &str, column: ViewColumn) -> Arc<dyn RenderSurface>;
}

/// Opens documents in the host editor.
pub trait FileOpener: Send + Sync {
    /// Opens `path` in `column`; returns a human-readable error on failure.
    fn open(&self, path: &str, column: ViewColumn) -> Result<(), String>;
}

/// User-visible notices.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    /// Shows (`active = true`) or clears a non-cancellable progress indicator.
    fn progress(&self, title: &str, active: bool);
}
