//! Console commands mapped onto session store actions.

use clap::Subcommand;
use client_core::{ClientError, SessionStore};
use shared::domain::WorkspaceKey;
use tracing::debug;

use crate::render;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List projects sorted by name.
    Projects,
    /// List every workspace across projects.
    Workspaces,
    /// Show a project and its workspaces.
    Project { name: String },
    /// Show every field of one workspace.
    Workspace { project: String, name: String },
    CreateProject { name: String, path: String },
    DeleteProject { name: String },
    CreateWorkspace {
        project: String,
        name: String,
        /// Defaults to `devco/<name>` on the server when omitted.
        #[arg(long)]
        branch: Option<String>,
    },
    DeleteWorkspace { project: String, name: String },
    /// Launch a stopped container or bring a running one down.
    Toggle { project: String, name: String },
    Launch { project: String, name: String },
    Down { project: String, name: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Workspaces => "workspaces",
            Self::Project { .. } => "project",
            Self::Workspace { .. } => "workspace",
            Self::CreateProject { .. } => "create_project",
            Self::DeleteProject { .. } => "delete_project",
            Self::CreateWorkspace { .. } => "create_workspace",
            Self::DeleteWorkspace { .. } => "delete_workspace",
            Self::Toggle { .. } => "toggle",
            Self::Launch { .. } => "launch",
            Self::Down { .. } => "down",
        }
    }
}

/// Mounts the store, applies at most one mutation and renders the view the
/// command lands on.
pub async fn execute(store: &SessionStore, command: &Command) -> Result<String, ClientError> {
    store.mount().await?;
    debug!(command = command.name(), "console: store mounted");

    match command {
        Command::Projects => Ok(render::project_list(&store.project_list().await)),
        Command::Workspaces => Ok(render::workspace_list(&store.workspace_list().await)),
        Command::Project { name } => show_project(store, name).await,
        Command::Workspace { project, name } => show_workspace(store, project, name).await,
        Command::CreateProject { name, path } => {
            store.create_project(name, path).await?;
            Ok(render::project_list(&store.project_list().await))
        }
        Command::DeleteProject { name } => {
            store.delete_project(name).await?;
            Ok(render::project_list(&store.project_list().await))
        }
        Command::CreateWorkspace {
            project,
            name,
            branch,
        } => {
            store
                .create_workspace(project, name, branch.as_deref())
                .await?;
            show_workspace(store, project, name).await
        }
        Command::DeleteWorkspace { project, name } => {
            store.delete_workspace(project, name).await?;
            show_project(store, project).await
        }
        Command::Toggle { project, name } => {
            let action = store.toggle_container(project, name).await?;
            let detail = show_workspace(store, project, name).await?;
            Ok(format!("Container {}\n{detail}", action.label()))
        }
        Command::Launch { project, name } => {
            store.launch_container(project, name).await?;
            show_workspace(store, project, name).await
        }
        Command::Down { project, name } => {
            store.down_container(project, name).await?;
            show_workspace(store, project, name).await
        }
    }
}

async fn show_project(store: &SessionStore, name: &str) -> Result<String, ClientError> {
    match store.project(name).await {
        Some(project) => Ok(render::project_detail(name, &project)),
        None => Err(ClientError::validation(format!(
            "project `{name}` not found"
        ))),
    }
}

async fn show_workspace(
    store: &SessionStore,
    project_name: &str,
    workspace_name: &str,
) -> Result<String, ClientError> {
    let key = WorkspaceKey::new(project_name, workspace_name);
    match store.workspace(project_name, workspace_name).await {
        Some(workspace) => Ok(render::workspace_detail(&key, &workspace)),
        None => Err(ClientError::validation(format!(
            "workspace `{key}` not found"
        ))),
    }
}
