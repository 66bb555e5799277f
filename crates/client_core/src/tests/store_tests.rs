use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use shared::domain::WorkspaceState;
use tokio::sync::Notify;

use super::*;

/// Parks one `fetch_graph` call until released. The scripted graph is taken
/// before parking, so responses can be delivered out of request order.
#[derive(Default)]
struct FetchGate {
    entered: Notify,
    release: Notify,
}

#[derive(Default)]
struct ScriptedTransport {
    graphs: Mutex<VecDeque<Result<ProjectGraph, ClientError>>>,
    fetch_gates: Mutex<VecDeque<Arc<FetchGate>>>,
    mutation_failures: Mutex<VecDeque<ClientError>>,
    calls: Mutex<Vec<String>>,
    hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedTransport {
    fn with_graphs(graphs: Vec<Result<ProjectGraph, ClientError>>) -> Self {
        Self {
            graphs: Mutex::new(graphs.into()),
            ..Self::default()
        }
    }

    fn holding_mutations(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.hold = Some((entered, release));
        self
    }

    fn gating_fetches(self, gates: Vec<Arc<FetchGate>>) -> Self {
        Self {
            fetch_gates: Mutex::new(gates.into()),
            ..self
        }
    }

    async fn fail_next_mutation(&self, err: ClientError) {
        self.mutation_failures.lock().await.push_back(err);
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record_mutation(&self, call: String) -> Result<(), ClientError> {
        self.calls.lock().await.push(call);
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }
        match self.mutation_failures.lock().await.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkspaceTransport for ScriptedTransport {
    async fn fetch_graph(&self) -> Result<ProjectGraph, ClientError> {
        self.calls.lock().await.push("fetch_graph".to_string());
        let result = self
            .graphs
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::validation("no scripted graph left")));
        let gate = self.fetch_gates.lock().await.pop_front();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        result
    }

    async fn create_project(&self, name: &str, path: &str) -> Result<(), ClientError> {
        self.record_mutation(format!("create_project {name} {path}"))
            .await
    }

    async fn delete_project(&self, name: &str) -> Result<(), ClientError> {
        self.record_mutation(format!("delete_project {name}")).await
    }

    async fn create_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
        branch_name: Option<&str>,
    ) -> Result<(), ClientError> {
        self.record_mutation(format!(
            "create_workspace {project_name} {workspace_name} [{}]",
            branch_name.unwrap_or_default()
        ))
        .await
    }

    async fn delete_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.record_mutation(format!("delete_workspace {project_name} {workspace_name}"))
            .await
    }

    async fn launch_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.record_mutation(format!("launch_container {project_name} {workspace_name}"))
            .await
    }

    async fn down_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.record_mutation(format!("down_container {project_name} {workspace_name}"))
            .await
    }
}

fn graph_with(project: &str, workspaces: &[(&str, WorkspaceState)]) -> ProjectGraph {
    let mut entry = Project::new(format!("/repos/{project}"));
    for (name, state) in workspaces {
        entry = entry.with_workspace(*name, Workspace::new(*state, format!("devco/{name}")));
    }
    [(project.to_string(), entry)].into_iter().collect()
}

fn server_error(message: &str) -> ClientError {
    ClientError::Transport {
        status: Some(500),
        message: message.to_string(),
    }
}

fn store_over(transport: ScriptedTransport) -> (Arc<ScriptedTransport>, Arc<SessionStore>) {
    let transport = Arc::new(transport);
    let store = SessionStore::new(transport.clone(), StoreOptions::default());
    (transport, store)
}

#[tokio::test]
async fn graph_is_absent_until_first_successful_load() {
    let (_transport, store) = store_over(ScriptedTransport::with_graphs(vec![Ok(graph_with(
        "alpha",
        &[],
    ))]));

    assert!(!store.has_loaded().await);
    assert!(store.project_list().await.is_empty());

    store.mount().await.expect("mount");

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.graph, Some(graph_with("alpha", &[])));
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_busy);
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test]
async fn failed_reload_keeps_previous_graph_and_records_message() {
    let first = graph_with("alpha", &[("ws", WorkspaceState::Running)]);
    let (_transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(first.clone()),
        Err(server_error("service unavailable")),
    ]));

    store.reload().await.expect("first reload");
    let err = store.reload().await.expect_err("second reload fails");

    assert_eq!(err.to_string(), "service unavailable");
    assert_eq!(store.graph().await, first);
    assert_eq!(store.last_error().await.as_deref(), Some("service unavailable"));
    assert!(!store.is_loading().await);
}

#[tokio::test]
async fn successful_reload_clears_previous_error() {
    let (_transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Err(server_error("boom")),
        Ok(graph_with("alpha", &[])),
    ]));

    let _ = store.reload().await;
    assert_eq!(store.last_error().await.as_deref(), Some("boom"));

    store.reload().await.expect("reload");
    assert_eq!(store.last_error().await, None);
}

#[tokio::test]
async fn repeated_reloads_with_stable_server_yield_same_views() {
    let graph = graph_with(
        "alpha",
        &[("b", WorkspaceState::Stopped), ("a", WorkspaceState::Running)],
    );
    let (_transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(graph.clone()),
        Ok(graph),
    ]));

    store.reload().await.expect("reload");
    let (projects, workspaces) = (store.project_list().await, store.workspace_list().await);
    store.reload().await.expect("reload");

    assert_eq!(store.project_list().await, projects);
    assert_eq!(store.workspace_list().await, workspaces);
}

#[tokio::test]
async fn successful_mutation_replaces_graph_with_fetched_value() {
    let before = graph_with("alpha", &[("old", WorkspaceState::Stopped)]);
    let after = graph_with("beta", &[]);
    let (transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(before),
        Ok(after.clone()),
    ]));

    store.mount().await.expect("mount");
    store
        .create_project("beta", "/repos/beta")
        .await
        .expect("create project");

    assert_eq!(store.graph().await, after);
    assert_eq!(
        transport.calls().await,
        vec![
            "fetch_graph",
            "create_project beta /repos/beta",
            "fetch_graph"
        ]
    );
    assert!(!store.is_busy());
}

#[tokio::test]
async fn validation_failure_sends_nothing() {
    let (transport, store) = store_over(ScriptedTransport::default());

    let err = store
        .create_project("", "/repos/alpha")
        .await
        .expect_err("validation");
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(
        store.last_error().await.as_deref(),
        Some("project name/path are required")
    );

    let err = store
        .create_workspace("alpha", "", None)
        .await
        .expect_err("validation");
    assert_eq!(err.to_string(), "project name/workspace name are required");
    assert!(store.delete_project("").await.is_err());

    assert!(transport.calls().await.is_empty());
}

#[tokio::test]
async fn failed_mutation_records_error_without_reload() {
    let graph = graph_with("alpha", &[]);
    let (transport, store) =
        store_over(ScriptedTransport::with_graphs(vec![Ok(graph.clone())]));
    store.mount().await.expect("mount");
    transport
        .fail_next_mutation(server_error("project has active workspaces"))
        .await;

    let err = store.delete_project("alpha").await.expect_err("delete fails");

    assert_eq!(err.status(), Some(500));
    assert_eq!(
        store.last_error().await.as_deref(),
        Some("project has active workspaces")
    );
    assert_eq!(store.graph().await, graph);
    assert_eq!(
        transport.calls().await,
        vec!["fetch_graph", "delete_project alpha"]
    );
    assert!(!store.is_busy());
}

#[tokio::test]
async fn failed_mutation_can_opt_into_reconcile_reload() {
    let reconciled = ProjectGraph::default();
    let transport = Arc::new(ScriptedTransport::with_graphs(vec![
        Ok(graph_with("alpha", &[])),
        Ok(reconciled.clone()),
    ]));
    let store = SessionStore::new(
        transport.clone(),
        StoreOptions {
            reload_after_failed_mutation: true,
        },
    );
    store.mount().await.expect("mount");
    transport
        .fail_next_mutation(server_error("response dropped"))
        .await;

    let err = store.delete_project("alpha").await.expect_err("delete fails");

    assert_eq!(err.to_string(), "response dropped");
    assert_eq!(store.graph().await, reconciled);
    assert_eq!(
        store.last_error().await.as_deref(),
        Some("response dropped")
    );
}

#[tokio::test]
async fn newer_error_replaces_older_one() {
    let (transport, store) = store_over(ScriptedTransport::default());
    let _ = store.create_project("", "").await;
    transport.fail_next_mutation(server_error("second")).await;

    let _ = store.delete_project("alpha").await;

    assert_eq!(store.last_error().await.as_deref(), Some("second"));
}

#[tokio::test]
async fn toggle_brings_running_workspace_down() {
    let (transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(graph_with("alpha", &[("ws", WorkspaceState::Running)])),
        Ok(graph_with("alpha", &[("ws", WorkspaceState::Stopped)])),
    ]));
    store.mount().await.expect("mount");

    let action = store.toggle_container("alpha", "ws").await.expect("toggle");

    assert_eq!(action, ContainerAction::Down);
    assert_eq!(
        store.workspace("alpha", "ws").await.map(|ws| ws.state),
        Some(WorkspaceState::Stopped)
    );
    assert!(transport
        .calls()
        .await
        .contains(&"down_container alpha ws".to_string()));
}

#[tokio::test]
async fn toggle_launches_stopped_and_fresh_workspaces() {
    let graph = graph_with(
        "alpha",
        &[
            ("fresh", WorkspaceState::BeforeStart),
            ("idle", WorkspaceState::Stopped),
        ],
    );
    let (transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(graph.clone()),
        Ok(graph.clone()),
        Ok(graph),
    ]));
    store.mount().await.expect("mount");

    assert_eq!(
        store.toggle_container("alpha", "fresh").await.expect("toggle"),
        ContainerAction::Launch
    );
    assert_eq!(
        store.toggle_container("alpha", "idle").await.expect("toggle"),
        ContainerAction::Launch
    );

    let calls = transport.calls().await;
    assert!(calls.contains(&"launch_container alpha fresh".to_string()));
    assert!(calls.contains(&"launch_container alpha idle".to_string()));
}

#[tokio::test]
async fn toggle_of_unknown_workspace_is_a_validation_error() {
    let (transport, store) = store_over(ScriptedTransport::with_graphs(vec![Ok(graph_with(
        "alpha",
        &[],
    ))]));
    store.mount().await.expect("mount");

    let err = store
        .toggle_container("alpha", "ghost")
        .await
        .expect_err("unknown workspace");

    assert_eq!(err, ClientError::validation("workspace `alpha/ghost` not found"));
    assert_eq!(transport.calls().await, vec!["fetch_graph"]);
}

#[tokio::test]
async fn concurrent_mutation_is_rejected_while_busy() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let (transport, store) = store_over(
        ScriptedTransport::with_graphs(vec![Ok(graph_with("alpha", &[]))])
            .holding_mutations(entered.clone(), release.clone()),
    );

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.create_project("beta", "/repos/beta").await })
    };
    entered.notified().await;
    assert!(store.is_busy());

    let err = store
        .delete_project("alpha")
        .await
        .expect_err("second mutation rejected");
    assert_eq!(err, ClientError::Busy);
    assert_eq!(store.last_error().await, None);

    release.notify_one();
    first.await.expect("join").expect("first mutation");

    assert!(!store.is_busy());
    assert_eq!(
        transport.calls().await,
        vec!["create_project beta /repos/beta", "fetch_graph"]
    );
}

#[tokio::test]
async fn disposed_store_rejects_actions_but_keeps_snapshot() {
    let graph = graph_with("alpha", &[]);
    let (transport, store) =
        store_over(ScriptedTransport::with_graphs(vec![Ok(graph.clone())]));
    store.mount().await.expect("mount");

    store.dispose().await;

    assert_eq!(store.reload().await, Err(ClientError::Disposed));
    assert_eq!(
        store.create_project("beta", "/b").await,
        Err(ClientError::Disposed)
    );
    assert_eq!(store.graph().await, graph);
    assert_eq!(transport.calls().await, vec!["fetch_graph"]);
}

#[tokio::test]
async fn events_signal_loading_busy_and_graph_replacement() {
    let (_transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(graph_with("alpha", &[])),
        Ok(graph_with("alpha", &[])),
    ]));
    let mut events = store.subscribe_events();

    store.mount().await.expect("mount");
    store.delete_workspace("alpha", "ws").await.expect("delete");

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            StoreEvent::LoadingChanged(true),
            StoreEvent::GraphReplaced,
            StoreEvent::LoadingChanged(false),
            StoreEvent::BusyChanged(true),
            StoreEvent::LoadingChanged(true),
            StoreEvent::GraphReplaced,
            StoreEvent::LoadingChanged(false),
            StoreEvent::BusyChanged(false),
        ]
    );
}

#[tokio::test]
async fn mutation_whose_reload_fails_reports_reload_error() {
    let before = graph_with("alpha", &[]);
    let (transport, store) = store_over(ScriptedTransport::with_graphs(vec![
        Ok(before.clone()),
        Err(server_error("down")),
    ]));
    store.mount().await.expect("mount");

    let err = store
        .create_project("beta", "/repos/beta")
        .await
        .expect_err("reload fails");

    assert_eq!(err.to_string(), "down");
    assert_eq!(store.graph().await, before);
    assert_eq!(store.last_error().await.as_deref(), Some("down"));
    assert!(!store.is_busy());
    assert!(!store.is_loading().await);
    assert_eq!(
        transport.calls().await,
        vec![
            "fetch_graph",
            "create_project beta /repos/beta",
            "fetch_graph"
        ]
    );
}

#[tokio::test]
async fn overlapping_reloads_stay_loading_until_last_finishes() {
    let first_gate = Arc::new(FetchGate::default());
    let second_gate = Arc::new(FetchGate::default());
    let first_graph = graph_with("first", &[]);
    let second_graph = graph_with("second", &[]);
    let (_transport, store) = store_over(
        ScriptedTransport::with_graphs(vec![Ok(first_graph.clone()), Ok(second_graph.clone())])
            .gating_fetches(vec![first_gate.clone(), second_gate.clone()]),
    );

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.reload().await })
    };
    first_gate.entered.notified().await;
    let second = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.reload().await })
    };
    second_gate.entered.notified().await;
    assert!(store.is_loading().await);

    second_gate.release.notify_one();
    second.await.expect("join").expect("second reload");
    assert!(store.is_loading().await);
    assert_eq!(store.graph().await, second_graph);

    first_gate.release.notify_one();
    first.await.expect("join").expect("first reload");
    assert!(!store.is_loading().await);
    assert_eq!(store.graph().await, first_graph);
}

#[tokio::test]
async fn cancelled_reload_clears_loading_flag() {
    let gate = Arc::new(FetchGate::default());
    let recovered = graph_with("alpha", &[]);
    let (_transport, store) = store_over(
        ScriptedTransport::with_graphs(vec![
            Ok(ProjectGraph::default()),
            Ok(recovered.clone()),
        ])
        .gating_fetches(vec![gate]),
    );
    let mut events = store.subscribe_events();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), store.reload()).await;

    assert!(timed_out.is_err());
    assert!(!store.is_loading().await);
    assert!(!store.has_loaded().await);
    assert_eq!(events.try_recv(), Ok(StoreEvent::LoadingChanged(true)));
    assert_eq!(events.try_recv(), Ok(StoreEvent::LoadingChanged(false)));

    store.reload().await.expect("reload after cancellation");
    assert_eq!(store.graph().await, recovered);
    assert!(!store.is_loading().await);
}
