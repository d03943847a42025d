use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use relay_chat::{cli::ServerArgs, logging::init_tracing, server::Server};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(std::io::stdout);

    let args = ServerArgs::parse();
    let listen = args.listen_addr();
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    let server = Server::new(listener);
    let addr = server.local_addr()?;
    info!("server listening on {}", addr);

    if let Err(err) = server.run_until_ctrl_c().await {
        warn!("server exited with error: {err:?}");
        return Err(err);
    }

    Ok(())
}
