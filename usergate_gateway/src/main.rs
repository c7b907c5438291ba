use ::tokio::net::TcpListener;
use ::tracing::info;
use ::usergate_common::{config::Args, error::Result, shutdown::shutdown_signal};
use ::usergate_gateway::{connect_backend, get_gateway, GatewayConfig};

#[tokio::main]
/// Start the usergate HTTP gateway
async fn main() -> Result<()> {
    // setup tracing
    tracing_subscriber::fmt::init();

    let GatewayConfig {
        listen_addr,
        backend_endpoint,
    } = Args::parse_args().load_config_or_default()?;

    let client = connect_backend(&backend_endpoint)?;
    let app = get_gateway(client);

    // run it
    let listener = TcpListener::bind(listen_addr).await?;
    info!(
        "Serving HTTP gateway on http://{}, backend at {}",
        listener.local_addr()?,
        backend_endpoint
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
