use crate::connection::ConnectionId;

/// Something to fan out to connected clients. Lives for one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Raw bytes from one receive call, forwarded as a single blob.
    Chat {
        sender: ConnectionId,
        payload: Vec<u8>,
    },
    /// A client's stream closed.
    Departure { client: ConnectionId },
    /// Server-originated text with no client behind it.
    Notice { text: String },
}

impl Message {
    pub fn chat(sender: ConnectionId, payload: &[u8]) -> Self {
        Self::Chat {
            sender,
            payload: payload.to_vec(),
        }
    }

    pub fn departure(client: ConnectionId) -> Self {
        Self::Departure { client }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice { text: text.into() }
    }

    /// Connection that must not receive this message.
    ///
    /// Departures have none: the departed client is already out of the
    /// registry when the notice goes out.
    pub fn sender(&self) -> Option<ConnectionId> {
        match self {
            Self::Chat { sender, .. } => Some(*sender),
            Self::Departure { .. } | Self::Notice { .. } => None,
        }
    }

    /// Bytes as they appear on a recipient's stream. No delimiter is added.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            Self::Chat { sender, payload } => {
                let mut wire = format!("Client {sender}: ").into_bytes();
                wire.extend_from_slice(payload);
                wire
            }
            Self::Departure { client } => format!("Client {client} has left the chat.").into_bytes(),
            Self::Notice { text } => text.clone().into_bytes(),
        }
    }
}
