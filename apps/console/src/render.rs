//! Plain-text rendering of the store's read views.

use std::fmt::Write as _;

use client_core::{projection::project_workspaces, ProjectListItem, WorkspaceListItem};
use shared::{
    domain::WorkspaceKey,
    protocol::{Project, Workspace},
};

pub fn project_list(projects: &[ProjectListItem]) -> String {
    if projects.is_empty() {
        return "No projects.\n".to_string();
    }
    let mut out = String::new();
    for project in projects {
        let _ = writeln!(
            out,
            "{}\t{}\tworkspaces: {}",
            project.name, project.path, project.workspace_count
        );
    }
    out
}

pub fn workspace_list(workspaces: &[WorkspaceListItem]) -> String {
    if workspaces.is_empty() {
        return "No workspaces.\n".to_string();
    }
    let mut out = String::new();
    for workspace in workspaces {
        let _ = writeln!(
            out,
            "{} / {}\t{}\t{}",
            workspace.project_name, workspace.workspace_name, workspace.state, workspace.branch_name
        );
    }
    out
}

pub fn project_detail(name: &str, project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project: {name}");
    let _ = writeln!(out, "Path: {}", project.path);
    let _ = writeln!(out, "Workspace count: {}", project.workspaces.len());
    for (workspace_name, workspace) in project_workspaces(project) {
        let _ = writeln!(
            out,
            "  {workspace_name}\t{}\t{}",
            workspace.state, workspace.branch_name
        );
    }
    out
}

pub fn workspace_detail(key: &WorkspaceKey, workspace: &Workspace) -> String {
    let fields = [
        ("State", workspace.state.as_str()),
        ("Branch", workspace.branch_name.as_str()),
        ("Path", workspace.path.as_str()),
        ("Container ID", workspace.container_id.as_str()),
        ("Compose project", workspace.compose_project_name.as_str()),
        ("Remote user", workspace.remote_user.as_str()),
        ("Remote folder", workspace.remote_workspace_folder.as_str()),
        ("IP address", workspace.ip_address.as_str()),
    ];
    let mut out = String::new();
    let _ = writeln!(out, "Workspace: {key}");
    for (label, value) in fields {
        let value = if value.is_empty() { "-" } else { value };
        let _ = writeln!(out, "{label}: {value}");
    }
    out
}
