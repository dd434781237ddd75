//! Webview document templating.
//!
//! # Responsibility
//! - Fill the surface HTML template with the configured graph renderer.
//! - Rewrite `{{asset}}` placeholders into surface-loadable URIs.

use crate::surface::RenderSurface;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

static ASSET_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid asset placeholder regex"));

const GRAPH_PATH_VAR: &str = "${graphPath}";
const GRAPH_STYLES_PATH_VAR: &str = "${graphStylesPath}";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <link rel="stylesheet" href="${graphStylesPath}" />
  </head>
  <body>
    <svg id="graph"></svg>
    <script src="{{d3.min.js}}"></script>
    <script src="${graphPath}"></script>
  </body>
</html>
"#;

/// HTML template for graph surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebviewTemplate {
    html: String,
}

impl Default for WebviewTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl WebviewTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    /// Renders the document for `surface` using renderer `graph_type`.
    ///
    /// `${graphPath}` and `${graphStylesPath}` point at
    /// `graphs/<graph_type>/graph.{js,css}`; every `{{file}}` placeholder is
    /// replaced by `surface.asset_uri(file)`.
    pub fn render(&self, graph_type: &str, surface: &dyn RenderSurface) -> String {
        let graph_dir = format!("graphs/{}", graph_type.trim());
        let with_vars = self
            .html
            .replace(GRAPH_PATH_VAR, &format!("{{{{{graph_dir}/graph.js}}}}"))
            .replace(GRAPH_STYLES_PATH_VAR, &format!("{{{{{graph_dir}/graph.css}}}}"));

        ASSET_PLACEHOLDER_RE
            .replace_all(&with_vars, |caps: &Captures<'_>| {
                surface.asset_uri(caps[1].trim())
            })
            .into_owned()
    }
}
