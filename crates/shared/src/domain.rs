use std::fmt;

use serde::{Deserialize, Serialize};

/// Container lifecycle state as reported by the workspace service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkspaceState {
    BeforeStart,
    Running,
    Stopped,
}

impl WorkspaceState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeStart => "beforeStart",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global identity of a workspace: names are only unique within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceKey {
    pub project_name: String,
    pub workspace_name: String,
}

impl WorkspaceKey {
    pub fn new(project_name: impl Into<String>, workspace_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            workspace_name: workspace_name.into(),
        }
    }
}

impl fmt::Display for WorkspaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_name, self.workspace_name)
    }
}
