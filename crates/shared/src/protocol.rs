use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{domain::WorkspaceState, error::GraphDecodeError};

/// Full project → workspace mapping served by `GET /api/project`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectGraph(pub HashMap<String, Project>);

impl ProjectGraph {
    pub fn get(&self, project_name: &str) -> Option<&Project> {
        self.0.get(project_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Project)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Project)> for ProjectGraph {
    fn from_iter<I: IntoIterator<Item = (String, Project)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workspaces: HashMap<String, Workspace>,
}

impl Project {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            workspaces: HashMap::new(),
        }
    }

    pub fn with_workspace(mut self, name: impl Into<String>, workspace: Workspace) -> Self {
        self.workspaces.insert(name.into(), workspace);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Workspace {
    pub state: WorkspaceState,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub compose_project_name: String,
    #[serde(default)]
    pub remote_user: String,
    #[serde(default)]
    pub remote_workspace_folder: String,
    #[serde(default, rename = "IPAddress")]
    pub ip_address: String,
}

impl Workspace {
    pub fn new(state: WorkspaceState, branch_name: impl Into<String>) -> Self {
        Self {
            state,
            branch_name: branch_name.into(),
            path: String::new(),
            container_id: String::new(),
            compose_project_name: String::new(),
            remote_user: String::new(),
            remote_workspace_folder: String::new(),
            ip_address: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWorkspaceRequest {
    pub project_name: String,
    pub workspace_name: String,
    pub branch_name: String,
}

/// Body shared by the launch and down container endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkspaceActionRequest {
    pub project_name: String,
    pub workspace_name: String,
}

pub fn decode_graph(body: &[u8]) -> Result<ProjectGraph, GraphDecodeError> {
    Ok(serde_json::from_slice(body)?)
}

// The service marshals an unset workspace map as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
