use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use shared::protocol::{
    decode_graph, CreateProjectRequest, CreateWorkspaceRequest, ProjectGraph,
    WorkspaceActionRequest,
};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

/// One-shot request/response mapping for every workspace service operation.
/// Implementations keep no state and never retry.
#[async_trait]
pub trait WorkspaceTransport: Send + Sync {
    async fn fetch_graph(&self) -> Result<ProjectGraph, ClientError>;
    async fn create_project(&self, name: &str, path: &str) -> Result<(), ClientError>;
    async fn delete_project(&self, name: &str) -> Result<(), ClientError>;
    async fn create_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
        branch_name: Option<&str>,
    ) -> Result<(), ClientError>;
    async fn delete_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError>;
    async fn launch_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError>;
    async fn down_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError>;
}

pub struct HttpTransport {
    http: Client,
    server_url: String,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(server_url, None)
    }

    pub fn with_timeout(server_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let parsed = Url::parse(server_url).map_err(|e| {
            ClientError::validation(format!("invalid server url '{server_url}': {e}"))
        })?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            server_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(method = method.as_str(), path, "transport: sending request");
        self.http
            .request(method, format!("{}{path}", self.server_url))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        ensure_ok(response).await
    }

    async fn post_workspace_action(
        &self,
        path: &str,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.send(
            self.request(Method::POST, path)
                .json(&WorkspaceActionRequest {
                    project_name: project_name.to_string(),
                    workspace_name: workspace_name.to_string(),
                }),
        )
        .await?;
        Ok(())
    }
}

async fn ensure_ok(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let (body, read_error) = match response.text().await {
        Ok(body) => (body, None),
        Err(err) => (String::new(), Some(err.to_string())),
    };
    warn!(
        status = status.as_u16(),
        path = %url,
        read_error = ?read_error,
        "transport: request failed"
    );
    Err(ClientError::from_status(status.as_u16(), body))
}

#[async_trait]
impl WorkspaceTransport for HttpTransport {
    async fn fetch_graph(&self) -> Result<ProjectGraph, ClientError> {
        let body = self
            .send(self.request(Method::GET, "/api/project"))
            .await?
            .bytes()
            .await?;
        Ok(decode_graph(&body)?)
    }

    async fn create_project(&self, name: &str, path: &str) -> Result<(), ClientError> {
        self.send(
            self.request(Method::POST, "/api/project")
                .json(&CreateProjectRequest {
                    name: name.to_string(),
                    path: path.to_string(),
                }),
        )
        .await?;
        Ok(())
    }

    async fn delete_project(&self, name: &str) -> Result<(), ClientError> {
        self.send(
            self.request(Method::DELETE, "/api/project")
                .query(&[("pjname", name)]),
        )
        .await?;
        Ok(())
    }

    async fn create_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
        branch_name: Option<&str>,
    ) -> Result<(), ClientError> {
        self.send(
            self.request(Method::POST, "/api/workspace")
                .json(&CreateWorkspaceRequest {
                    project_name: project_name.to_string(),
                    workspace_name: workspace_name.to_string(),
                    branch_name: branch_name.unwrap_or_default().to_string(),
                }),
        )
        .await?;
        Ok(())
    }

    async fn delete_workspace(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.send(
            self.request(Method::DELETE, "/api/workspace")
                .query(&[("pjname", project_name), ("wsname", workspace_name)]),
        )
        .await?;
        Ok(())
    }

    async fn launch_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.post_workspace_action("/api/workspace/launch", project_name, workspace_name)
            .await
    }

    async fn down_container(
        &self,
        project_name: &str,
        workspace_name: &str,
    ) -> Result<(), ClientError> {
        self.post_workspace_action("/api/workspace/down", project_name, workspace_name)
            .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
