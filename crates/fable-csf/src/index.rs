//! Index-input projection
//!
//! Flattens a parsed module into the per-story records the catalog indexer
//! consumes. The projection is lossy on purpose: only what the index needs
//! to route, search and badge a story crosses this boundary.

use serde::Serialize;

use crate::csf::CsfFile;
use crate::error::{CsfError, Result};

/// Per-story usage booleans surfaced to the indexer for telemetry and
/// feature badges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInputStats {
    pub factory: bool,
    pub play: bool,
    pub render: bool,
    pub loaders: bool,
    pub before_each: bool,
    pub globals: bool,
    pub tags: bool,
    pub story_fn: bool,
    pub mount: bool,
    pub module_mock: bool,
}

/// One story entry as the catalog indexer expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInput {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub import_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_component_path: Option<String>,
    pub export_name: String,
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_id: Option<String>,
    pub tags: Vec<String>,
    #[serde(rename = "__id")]
    pub id: String,
    #[serde(rename = "__stats")]
    pub stats: IndexInputStats,
}

impl CsfFile<'_> {
    /// Project every story into an index entry. Requires the module to have
    /// been parsed with a file name, since entries carry their import path.
    pub fn index_inputs(&self) -> Result<Vec<IndexInput>> {
        let Some(import_path) = self.options().file_name.clone() else {
            return Err(CsfError::invalid(
                "cannot create index inputs for a CSF file parsed without a fileName",
                None,
            ));
        };
        let meta = self.meta();
        let title = meta.title.clone().unwrap_or_default();
        Ok(self
            .stories()
            .iter()
            .map(|story| IndexInput {
                kind: "story",
                import_path: import_path.clone(),
                raw_component_path: meta.component_path.clone(),
                export_name: story.export_name.clone(),
                name: story.name.clone(),
                title: title.clone(),
                meta_id: meta.id.clone(),
                tags: story.tags.clone(),
                id: story.id.clone(),
                stats: story.stats,
            })
            .collect())
    }
}
