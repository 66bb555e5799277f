use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use shared::{
    domain::WorkspaceKey,
    protocol::{Project, ProjectGraph, Workspace},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    error::ClientError,
    mutation::{ContainerAction, Mutation},
    projection::{self, ProjectListItem, WorkspaceListItem},
    transport::WorkspaceTransport,
};

const STORE_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Reload the graph after a failed mutation as well, in case the server
    /// applied the effect before the failure was observed.
    pub reload_after_failed_mutation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    GraphReplaced,
    LoadingChanged(bool),
    BusyChanged(bool),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub graph: Option<ProjectGraph>,
    pub is_loading: bool,
    pub is_busy: bool,
    pub last_error: Option<String>,
}

struct SessionState {
    graph: Option<ProjectGraph>,
    last_error: Option<String>,
    disposed: bool,
}

/// Holds the last fetched project graph and routes every mutation through
/// validate → apply → reload. At most one mutation is in flight at a time.
pub struct SessionStore {
    transport: Arc<dyn WorkspaceTransport>,
    options: StoreOptions,
    inner: Mutex<SessionState>,
    busy: AtomicBool,
    pending_reloads: AtomicUsize,
    events: broadcast::Sender<StoreEvent>,
}

struct BusyGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> BusyGuard<'a> {
    fn acquire(store: &'a SessionStore) -> Result<Self, ClientError> {
        store
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::Busy)?;
        let _ = store.events.send(StoreEvent::BusyChanged(true));
        Ok(Self { store })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.busy.store(false, Ordering::Release);
        let _ = self.store.events.send(StoreEvent::BusyChanged(false));
    }
}

/// Counts one outstanding reload. Dropping it, including when the reload
/// future is cancelled, releases the count.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(store: &'a SessionStore) -> Self {
        if store.pending_reloads.fetch_add(1, Ordering::AcqRel) == 0 {
            let _ = store.events.send(StoreEvent::LoadingChanged(true));
        }
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.store.pending_reloads.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _ = self.store.events.send(StoreEvent::LoadingChanged(false));
        }
    }
}

impl SessionStore {
    pub fn new(transport: Arc<dyn WorkspaceTransport>, options: StoreOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(STORE_EVENT_CAPACITY);
        Arc::new(Self {
            transport,
            options,
            inner: Mutex::new(SessionState {
                graph: None,
                last_error: None,
                disposed: false,
            }),
            busy: AtomicBool::new(false),
            pending_reloads: AtomicUsize::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Initial load performed when a consumer first attaches.
    pub async fn mount(&self) -> Result<(), ClientError> {
        self.reload().await
    }

    /// Ends the store's lifecycle. Later actions fail with
    /// [`ClientError::Disposed`]; the last snapshot stays readable.
    pub async fn dispose(&self) {
        self.inner.lock().await.disposed = true;
        info!("store: disposed");
    }

    pub async fn reload(&self) -> Result<(), ClientError> {
        self.ensure_active().await?;
        let _loading = LoadingGuard::acquire(self);

        let result = self.transport.fetch_graph().await;
        let mut guard = self.inner.lock().await;
        match result {
            Ok(graph) => {
                info!(projects = graph.len(), "store: graph reloaded");
                guard.graph = Some(graph);
                guard.last_error = None;
                let _ = self.events.send(StoreEvent::GraphReplaced);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "store: reload failed; keeping previous graph");
                guard.last_error = Some(err.to_string());
                let _ = self.events.send(StoreEvent::Error(err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn mutate(&self, mutation: Mutation) -> Result<(), ClientError> {
        self.ensure_active().await?;
        if let Err(err) = mutation.validate() {
            self.record_error(&err).await;
            return Err(err);
        }

        let _busy = BusyGuard::acquire(self)?;
        info!(mutation = mutation.name(), "store: applying mutation");
        match mutation.apply(self.transport.as_ref()).await {
            Ok(()) => {
                info!(mutation = mutation.name(), "store: mutation applied; reloading");
                self.reload().await
            }
            Err(err) => {
                warn!(mutation = mutation.name(), error = %err, "store: mutation failed");
                if self.options.reload_after_failed_mutation {
                    let _ = self.reload().await;
                }
                self.record_error(&err).await;
                Err(err)
            }
        }
    }

    pub async fn create_project(&self, name: &str, path: &str) -> Result<(), ClientError> {
        self.mutate(Mutation::CreateProject {
            name: name.to_string(),
            path: path.to_string(),
        })
        .await
    }

    pub async fn delete_project(&self, name: &str) -> Result<(), ClientError> {
        self.mutate(Mutation::DeleteProject {
            name: name.to_string(),
        })
        .await
    }

    pub async fn create_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
        branch_name: Option<&str>,
    ) -> Result<(), ClientError> {
        self.mutate(Mutation::CreateWorkspace {
            key: WorkspaceKey::new(project_name, workspace_name),
            branch_name: branch_name.map(str::to_string),
        })
        .await
    }

    pub async fn delete_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.mutate(Mutation::DeleteWorkspace {
            key: WorkspaceKey::new(project_name, workspace_name),
        })
        .await
    }

    pub async fn launch_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.mutate(Mutation::Container {
            key: WorkspaceKey::new(project_name, workspace_name),
            action: ContainerAction::Launch,
        })
        .await
    }

    pub async fn down_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.mutate(Mutation::Container {
            key: WorkspaceKey::new(project_name, workspace_name),
            action: ContainerAction::Down,
        })
        .await
    }

    /// Launches or brings down the workspace container depending on the
    /// state seen in the last reload. No round trip confirms the state first.
    pub async fn toggle_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<ContainerAction, ClientError> {
        self.ensure_active().await?;
        let key = WorkspaceKey::new(project_name, workspace_name);
        let state = self
            .workspace(project_name, workspace_name)
            .await
            .map(|workspace| workspace.state);

        let Some(state) = state else {
            let err = if project_name.is_empty() || workspace_name.is_empty() {
                ClientError::validation("project name/workspace name are required")
            } else {
                ClientError::validation(format!("workspace `{key}` not found"))
            };
            self.record_error(&err).await;
            return Err(err);
        };

        let action = ContainerAction::for_state(state);
        info!(workspace = %key, %state, action = action.label(), "store: toggling container");
        self.mutate(Mutation::Container { key, action }).await?;
        Ok(action)
    }

    pub async fn clear_error(&self) {
        self.inner.lock().await.last_error = None;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let guard = self.inner.lock().await;
        SessionSnapshot {
            graph: guard.graph.clone(),
            is_loading: self.pending_reloads.load(Ordering::Acquire) > 0,
            is_busy: self.is_busy(),
            last_error: guard.last_error.clone(),
        }
    }

    /// The current graph, empty before the first successful load.
    pub async fn graph(&self) -> ProjectGraph {
        self.inner.lock().await.graph.clone().unwrap_or_default()
    }

    pub async fn has_loaded(&self) -> bool {
        self.inner.lock().await.graph.is_some()
    }

    pub async fn is_loading(&self) -> bool {
        self.pending_reloads.load(Ordering::Acquire) > 0
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.last_error.clone()
    }

    pub async fn project_list(&self) -> Vec<ProjectListItem> {
        let guard = self.inner.lock().await;
        guard
            .graph
            .as_ref()
            .map(projection::to_project_list)
            .unwrap_or_default()
    }

    pub async fn workspace_list(&self) -> Vec<WorkspaceListItem> {
        let guard = self.inner.lock().await;
        guard
            .graph
            .as_ref()
            .map(projection::to_workspace_list)
            .unwrap_or_default()
    }

    pub async fn project(&self, project_name: &str) -> Option<Project> {
        let guard = self.inner.lock().await;
        projection::find_project(guard.graph.as_ref()?, Some(project_name)).cloned()
    }

    pub async fn workspace(&self, project_name: &str, workspace_name: &str) -> Option<Workspace> {
        let guard = self.inner.lock().await;
        projection::find_workspace(
            guard.graph.as_ref()?,
            Some(project_name),
            Some(workspace_name),
        )
        .cloned()
    }

    async fn ensure_active(&self) -> Result<(), ClientError> {
        if self.inner.lock().await.disposed {
            return Err(ClientError::Disposed);
        }
        Ok(())
    }

    async fn record_error(&self, err: &ClientError) {
        if !err.is_reportable() {
            return;
        }
        self.inner.lock().await.last_error = Some(err.to_string());
        let _ = self.events.send(StoreEvent::Error(err.to_string()));
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
