use std::{sync::Arc, time::Duration};

pub mod error;
pub mod mutation;
pub mod projection;
pub mod store;
pub mod transport;

pub use error::ClientError;
pub use mutation::{ContainerAction, Mutation};
pub use projection::{ProjectListItem, WorkspaceListItem};
pub use store::{SessionSnapshot, SessionStore, StoreEvent, StoreOptions};
pub use transport::{HttpTransport, WorkspaceTransport};

/// Builds a store backed by the HTTP transport for `server_url`. The store
/// is not mounted yet.
pub fn connect(
    server_url: &str,
    request_timeout: Option<Duration>,
    options: StoreOptions,
) -> Result<Arc<SessionStore>, ClientError> {
    let transport = HttpTransport::with_timeout(server_url, request_timeout)?;
    Ok(SessionStore::new(Arc::new(transport), options))
}
