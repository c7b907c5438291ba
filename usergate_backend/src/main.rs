use ::tokio::net::TcpListener;
use ::tracing::info;
use ::usergate_backend::{serve, BackendConfig};
use ::usergate_common::{config::Args, error::Result, shutdown::shutdown_signal};

#[tokio::main]
/// Start the usergate backend
async fn main() -> Result<()> {
    // setup tracing
    tracing_subscriber::fmt::init();

    let BackendConfig { listen_addr } = Args::parse_args().load_config_or_default()?;

    let listener = TcpListener::bind(listen_addr).await?;
    info!("server listening at {}", listener.local_addr()?);

    serve(listener, shutdown_signal()).await
}
