use ::std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};

use ::tokio::net::TcpListener;
use ::tonic::transport::{server::TcpIncoming, Server};
use ::usergate_common::{
    anyhow::anyhow,
    error::{Result, UsergateError},
    serde::Deserialize,
    user_grpc::user_service_server::UserServiceServer,
};
use service::UserServiceImpl;

pub mod service;

/// Configuration for the usergate backend
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(crate = "usergate_common::serde")]
pub struct BackendConfig {
    /// Address the gRPC server listens on
    pub listen_addr: SocketAddr,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3000)),
        }
    }
}

/// Serve the user service on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    // same default value of `nodelay` and `keepalive` as those in [Server]
    let tcp_incoming = TcpIncoming::from_listener(listener, false, None)
        .map_err(|err| UsergateError::fail_to_start_server(anyhow!(err)))?;

    Server::builder()
        .add_service(UserServiceServer::new(UserServiceImpl))
        .serve_with_incoming_shutdown(tcp_incoming, shutdown)
        .await
        .map_err(UsergateError::fail_to_start_server)
}
