//! Sorted read views derived from a project graph. Every function here is
//! total and leaves its input untouched.

use shared::{
    domain::WorkspaceState,
    protocol::{Project, ProjectGraph, Workspace},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectListItem {
    pub name: String,
    pub path: String,
    pub workspace_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceListItem {
    pub project_name: String,
    pub workspace_name: String,
    pub state: WorkspaceState,
    pub branch_name: String,
}

pub fn to_project_list(graph: &ProjectGraph) -> Vec<ProjectListItem> {
    let mut projects: Vec<ProjectListItem> = graph
        .iter()
        .map(|(name, project)| ProjectListItem {
            name: name.clone(),
            path: project.path.clone(),
            workspace_count: project.workspaces.len(),
        })
        .collect();
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    projects
}

pub fn to_workspace_list(graph: &ProjectGraph) -> Vec<WorkspaceListItem> {
    let mut workspaces: Vec<WorkspaceListItem> = graph
        .iter()
        .flat_map(|(project_name, project)| {
            project
                .workspaces
                .iter()
                .map(move |(workspace_name, workspace)| WorkspaceListItem {
                    project_name: project_name.clone(),
                    workspace_name: workspace_name.clone(),
                    state: workspace.state,
                    branch_name: workspace.branch_name.clone(),
                })
        })
        .collect();
    workspaces.sort_by(|a, b| {
        a.project_name
            .cmp(&b.project_name)
            .then_with(|| a.workspace_name.cmp(&b.workspace_name))
    });
    workspaces
}

/// Workspaces of a single project ordered by name, as shown on a project's
/// detail view.
pub fn project_workspaces(project: &Project) -> Vec<(&str, &Workspace)> {
    let mut workspaces: Vec<(&str, &Workspace)> = project
        .workspaces
        .iter()
        .map(|(name, workspace)| (name.as_str(), workspace))
        .collect();
    workspaces.sort_by(|a, b| a.0.cmp(b.0));
    workspaces
}

pub fn find_project<'a>(graph: &'a ProjectGraph, project_name: Option<&str>) -> Option<&'a Project> {
    let project_name = project_name.filter(|name| !name.is_empty())?;
    graph.get(project_name)
}

pub fn find_workspace<'a>(
    graph: &'a ProjectGraph,
    project_name: Option<&str>,
    workspace_name: Option<&str>,
) -> Option<&'a Workspace> {
    let project = find_project(graph, project_name)?;
    let workspace_name = workspace_name.filter(|name| !name.is_empty())?;
    project.workspaces.get(workspace_name)
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
