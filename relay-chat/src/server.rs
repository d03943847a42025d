use std::{future::Future, io, net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{info, warn};

use crate::{
    connection::Connection,
    message::Message,
    registry::Registry,
    relay::Relay,
    session,
};

pub struct Server {
    listener: TcpListener,
    relay: Relay,
}

impl Server {
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            relay: Relay::new(Arc::new(Registry::new())),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.relay.registry())
    }

    /// Accepts connections until `shutdown` resolves or the listener fails
    /// for good. Sessions already running are left alone.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Server { listener, relay } = self;
        let listener = &listener;
        accept_loop(move || listener.accept(), &relay, shutdown).await
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

async fn accept_loop<A, Fut, F>(mut accept: A, relay: &Relay, shutdown: F) -> Result<()>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = io::Result<(TcpStream, SocketAddr)>>,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        select! {
            _ = &mut shutdown => {
                handle_shutdown(relay).await;
                break;
            }
            accept_result = accept() => {
                handle_accept_result(accept_result, relay).await?;
            }
        }
    }

    Ok(())
}

async fn handle_shutdown(relay: &Relay) {
    info!("server shutting down");
    relay.deliver(&Message::notice("Server shutting down.")).await;
}

async fn handle_accept_result(
    result: io::Result<(TcpStream, SocketAddr)>,
    relay: &Relay,
) -> io::Result<()> {
    match result {
        Ok((stream, peer)) => {
            register_and_spawn(stream, peer, relay).await;
            Ok(())
        }
        Err(err) if is_fatal_accept_error(&err) => {
            warn!(error = ?err, "listener failed, stopping accept loop");
            Err(err)
        }
        Err(err) => {
            warn!(error = ?err, "failed to accept connection");
            Ok(())
        }
    }
}

/// Errors that mean the listening socket itself is unusable.
fn is_fatal_accept_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::NotConnected | io::ErrorKind::Unsupported
    )
}

async fn register_and_spawn(stream: TcpStream, peer: SocketAddr, relay: &Relay) {
    let id = relay.registry().next_id();
    let (reader, writer) = stream.into_split();
    let connection = Arc::new(Connection::new(id, Some(peer), writer));

    if let Err(err) = relay.registry().add(Arc::clone(&connection)).await {
        warn!(%peer, error = %err, "dropping connection");
        return;
    }

    info!(client = %id, %peer, "client connected");
    tokio::spawn(session::run(reader, connection, relay.clone()));
}
