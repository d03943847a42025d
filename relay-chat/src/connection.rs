use std::{fmt, io, net::SocketAddr};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

/// Identity of one accepted stream, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Send side of a client stream.
///
/// The reading half stays with the session task; this handle is what the
/// registry owns and what broadcasts write to. Writes are serialized per
/// connection so two senders never interleave their bytes on one peer.
pub struct Connection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    writer: Mutex<BoxedWriter>,
}

impl Connection {
    pub fn new<W>(id: ConnectionId, peer: Option<SocketAddr>, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            peer,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub async fn send(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await
    }

    /// Shuts down the write half. Later sends fail.
    pub async fn close(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}
