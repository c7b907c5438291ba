use ::std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use ::axum::{http::Uri, Router};
use ::tonic::transport::{Channel, Endpoint};
use ::tower_http::trace::TraceLayer;
use ::usergate_common::{
    anyhow::anyhow,
    error::{Result, UsergateError},
    serde::Deserialize,
    user_grpc::user_service_client::UserServiceClient,
};
use error::GatewayError;
use state::AppState;
use user::router::get_user_router;

pub(crate) mod error;
pub(crate) mod state;
pub(crate) mod user;

/// Configuration for the usergate gateway
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(crate = "usergate_common::serde")]
pub struct GatewayConfig {
    /// Address the HTTP server listens on
    pub listen_addr: SocketAddr,
    /// URI of the gRPC backend, e.g. `http://localhost:3000`
    pub backend_endpoint: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080)),
            backend_endpoint: "http://localhost:3000".to_owned(),
        }
    }
}

/// Create a client of the backend.
/// The connection is established on the first call, and re-established by the channel when lost.
pub fn connect_backend(endpoint: &str) -> Result<UserServiceClient<Channel>> {
    let channel = Endpoint::from_shared(endpoint.to_owned())
        .map_err(UsergateError::fail_to_connect_backend)?
        .connect_lazy();
    Ok(UserServiceClient::new(channel))
}

/// Answer every unknown route with a JSON error.
async fn no_route(uri: Uri) -> GatewayError {
    UsergateError::not_found(anyhow!("No route for {}", uri.path())).into()
}

/// This is the only entry for users to get the gateway.
/// # Return the router for the gateway
pub fn get_gateway(client: UserServiceClient<Channel>) -> Router {
    Router::new()
        .nest("/v1", get_user_router())
        .fallback(no_route)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(client))
}
