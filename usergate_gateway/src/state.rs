//! Shared state between handlers.

use ::tonic::transport::Channel;
use ::usergate_common::user_grpc::user_service_client::UserServiceClient;

#[derive(Clone)]
pub(crate) struct AppState {
    client: UserServiceClient<Channel>,
}

impl AppState {
    pub(crate) fn new(client: UserServiceClient<Channel>) -> Self {
        Self { client }
    }

    /// Clients share the underlying channel, so every call gets its own handle.
    pub(crate) fn get_client(&self) -> UserServiceClient<Channel> {
        self.client.clone()
    }
}
