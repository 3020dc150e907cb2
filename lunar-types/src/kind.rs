//! Resource kinds addressable inside a user's storage area.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of resource a path is resolved for.
///
/// Document kinds hold one JSON file per resource; container kinds hold a
/// directory per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Workflow,
    Datasource,
    Llm,
    File,
    ComponentIndex,
    WorkflowIndex,
    Custom,
    Tmp,
    Venv,
}

impl ResourceKind {
    /// Every kind, in scaffold order.
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Workflow,
        ResourceKind::Datasource,
        ResourceKind::Llm,
        ResourceKind::File,
        ResourceKind::ComponentIndex,
        ResourceKind::WorkflowIndex,
        ResourceKind::Custom,
        ResourceKind::Tmp,
        ResourceKind::Venv,
    ];

    /// Whether each resource of this kind is a single JSON document.
    #[must_use]
    pub const fn is_document(self) -> bool {
        matches!(self, ResourceKind::Datasource | ResourceKind::Llm)
    }

    /// Stable snake_case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Workflow => "workflow",
            ResourceKind::Datasource => "datasource",
            ResourceKind::Llm => "llm",
            ResourceKind::File => "file",
            ResourceKind::ComponentIndex => "component_index",
            ResourceKind::WorkflowIndex => "workflow_index",
            ResourceKind::Custom => "custom",
            ResourceKind::Tmp => "tmp",
            ResourceKind::Venv => "venv",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| crate::Error::UnknownKind(s.to_string()))
    }
}

/// Per-workflow subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowArea {
    /// Generated reports.
    Report,
    /// Files produced or consumed by the workflow run.
    Files,
    /// The workflow's private virtual environment.
    Venv,
}

impl WorkflowArea {
    pub const ALL: [WorkflowArea; 3] = [WorkflowArea::Report, WorkflowArea::Files, WorkflowArea::Venv];
}
