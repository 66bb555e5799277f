use shared::domain::{WorkspaceKey, WorkspaceState};

use crate::{error::ClientError, transport::WorkspaceTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Launch,
    Down,
}

impl ContainerAction {
    /// Picks the toggle action from the last observed state. Only a running
    /// container is brought down; every other state launches.
    pub fn for_state(state: WorkspaceState) -> Self {
        if state.is_running() {
            Self::Down
        } else {
            Self::Launch
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateProject {
        name: String,
        path: String,
    },
    DeleteProject {
        name: String,
    },
    CreateWorkspace {
        key: WorkspaceKey,
        branch_name: Option<String>,
    },
    DeleteWorkspace {
        key: WorkspaceKey,
    },
    Container {
        key: WorkspaceKey,
        action: ContainerAction,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateProject { .. } => "create_project",
            Self::DeleteProject { .. } => "delete_project",
            Self::CreateWorkspace { .. } => "create_workspace",
            Self::DeleteWorkspace { .. } => "delete_workspace",
            Self::Container {
                action: ContainerAction::Launch,
                ..
            } => "launch_container",
            Self::Container {
                action: ContainerAction::Down,
                ..
            } => "down_container",
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        match self {
            Self::CreateProject { name, path } => {
                if name.is_empty() || path.is_empty() {
                    return Err(ClientError::validation("project name/path are required"));
                }
            }
            Self::DeleteProject { name } => {
                if name.is_empty() {
                    return Err(ClientError::validation("project name is required"));
                }
            }
            Self::CreateWorkspace { key, .. }
            | Self::DeleteWorkspace { key }
            | Self::Container { key, .. } => {
                if key.project_name.is_empty() || key.workspace_name.is_empty() {
                    return Err(ClientError::validation(
                        "project name/workspace name are required",
                    ));
                }
            }
        }
        Ok(())
    }

    pub async fn apply(&self, transport: &dyn WorkspaceTransport) -> Result<(), ClientError> {
        match self {
            Self::CreateProject { name, path } => transport.create_project(name, path).await,
            Self::DeleteProject { name } => transport.delete_project(name).await,
            Self::CreateWorkspace { key, branch_name } => {
                transport
                    .create_workspace(
                        &key.project_name,
                        &key.workspace_name,
                        branch_name.as_deref(),
                    )
                    .await
            }
            Self::DeleteWorkspace { key } => {
                transport
                    .delete_workspace(&key.project_name, &key.workspace_name)
                    .await
            }
            Self::Container {
                key,
                action: ContainerAction::Launch,
            } => {
                transport
                    .launch_container(&key.project_name, &key.workspace_name)
                    .await
            }
            Self::Container {
                key,
                action: ContainerAction::Down,
            } => {
                transport
                    .down_container(&key.project_name, &key.workspace_name)
                    .await
            }
        }
    }
}
