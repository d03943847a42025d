use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use crate::{connection::Connection, message::Message, relay::Relay};

/// Largest chunk read from a client in one call.
pub const READ_CHUNK: usize = 4096;

/// Drives one registered connection until its stream closes.
///
/// Each successful read is relayed as one message, whatever its content. A
/// zero-length read or a read error ends the session: the connection leaves
/// the registry, the others get a departure notice, and the write half is
/// shut down.
pub async fn run<R>(mut reader: R, connection: Arc<Connection>, relay: Relay)
where
    R: AsyncRead + Unpin,
{
    let id = connection.id();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!(client = %id, "stream closed by peer");
                break;
            }
            Ok(n) => {
                let message = Message::chat(id, &buf[..n]);
                debug!(
                    client = %id,
                    bytes = n,
                    payload = %String::from_utf8_lossy(&buf[..n]),
                    "broadcasting"
                );
                relay.deliver(&message).await;
            }
            Err(error) => {
                warn!(client = %id, ?error, "receive failed");
                break;
            }
        }
    }

    finish(&connection, &relay).await;
}

/// Deregisters and closes `connection`. The departure is announced only if
/// this call was the one that removed it.
async fn finish(connection: &Connection, relay: &Relay) -> bool {
    let id = connection.id();
    let removed = relay.registry().remove(id).await.is_some();

    if removed {
        info!(client = %id, peer = ?connection.peer(), "client disconnected");
        relay.deliver(&Message::departure(id)).await;
    }

    if let Err(error) = connection.close().await {
        debug!(client = %id, ?error, "failed to shut down client stream");
    }
    removed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncWriteExt, DuplexStream},
        time::timeout,
    };

    use super::*;
    use crate::{connection::ConnectionId, registry::Registry};

    struct Peer {
        id: ConnectionId,
        connection: Arc<Connection>,
        inbox: DuplexStream,
    }

    async fn register(registry: &Registry) -> Peer {
        let (writer, inbox) = tokio::io::duplex(READ_CHUNK * 2);
        let id = registry.next_id();
        let connection = Arc::new(Connection::new(id, None, writer));
        registry.add(Arc::clone(&connection)).await.expect("add");
        Peer {
            id,
            connection,
            inbox,
        }
    }

    async fn read_chunk(reader: &mut DuplexStream) -> Vec<u8> {
        let mut buf = vec![0; READ_CHUNK * 2];
        let n = timeout(Duration::from_secs(1), reader.read(&mut buf))
            .await
            .expect("timed out")
            .expect("read");
        buf.truncate(n);
        buf
    }

    #[tokio::test]
    async fn relays_reads_and_announces_departure() {
        let registry = Arc::new(Registry::new());
        let relay = Relay::new(Arc::clone(&registry));
        let mut talker = register(&registry).await;
        let mut listener = register(&registry).await;

        let (mut client_side, server_side) = tokio::io::duplex(READ_CHUNK);
        let session = tokio::spawn(run(
            server_side,
            Arc::clone(&talker.connection),
            relay.clone(),
        ));

        client_side.write_all(b"hi there\n").await.expect("write");
        assert_eq!(
            read_chunk(&mut listener.inbox).await,
            format!("Client {}: hi there\n", talker.id).into_bytes()
        );

        drop(client_side);
        timeout(Duration::from_secs(1), session)
            .await
            .expect("session should end")
            .expect("join");

        assert!(!registry.contains(talker.id).await);
        assert_eq!(
            read_chunk(&mut listener.inbox).await,
            format!("Client {} has left the chat.", talker.id).into_bytes()
        );

        // The departed client's write half has been shut down.
        let mut rest = Vec::new();
        talker
            .inbox
            .read_to_end(&mut rest)
            .await
            .expect("read to end");
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn finishing_twice_announces_once() {
        let registry = Arc::new(Registry::new());
        let relay = Relay::new(Arc::clone(&registry));
        let leaver = register(&registry).await;
        let mut stayer = register(&registry).await;

        assert!(finish(&leaver.connection, &relay).await);
        assert!(!finish(&leaver.connection, &relay).await);

        assert_eq!(
            read_chunk(&mut stayer.inbox).await,
            format!("Client {} has left the chat.", leaver.id).into_bytes()
        );
        let mut buf = [0; 64];
        let again = timeout(Duration::from_millis(50), stayer.inbox.read(&mut buf)).await;
        assert!(again.is_err(), "no second departure notice");
    }

    #[tokio::test]
    async fn oversized_write_is_relayed_in_chunks() {
        let registry = Arc::new(Registry::new());
        let relay = Relay::new(Arc::clone(&registry));
        let talker = register(&registry).await;
        let mut listener = register(&registry).await;

        let (mut client_side, server_side) = tokio::io::duplex(READ_CHUNK * 4);
        let payload = vec![b'x'; READ_CHUNK + 10];
        client_side.write_all(&payload).await.expect("write");
        drop(client_side);

        run(server_side, Arc::clone(&talker.connection), relay).await;
        listener.connection.close().await.expect("close listener");

        let mut received = Vec::new();
        listener
            .inbox
            .read_to_end(&mut received)
            .await
            .expect("read");
        let prefix = format!("Client {}: ", talker.id);
        let text = String::from_utf8(received).expect("utf8");
        assert_eq!(text.matches(prefix.as_str()).count(), 2);
        assert_eq!(text.matches('x').count(), payload.len());
    }
}
