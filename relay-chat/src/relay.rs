use std::sync::Arc;

use tracing::{debug, warn};

use crate::{message::Message, registry::Registry};

/// Outcome of one [`Relay::deliver`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// Synchronous fan-out over the registry.
///
/// Sends run one recipient at a time on the calling task, so a slow peer
/// delays the peers after it in the same snapshot. Failed recipients are
/// logged and skipped; their own session removes them once its read fails.
#[derive(Clone)]
pub struct Relay {
    registry: Arc<Registry>,
}

impl Relay {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn deliver(&self, message: &Message) -> Delivery {
        let recipients = self.registry.snapshot(message.sender()).await;
        let wire = message.to_wire();
        let mut delivery = Delivery::default();

        for recipient in recipients {
            match recipient.send(&wire).await {
                Ok(()) => delivery.delivered += 1,
                Err(error) => {
                    warn!(client = %recipient.id(), ?error, "failed to deliver message");
                    delivery.failed += 1;
                }
            }
        }

        debug!(
            sender = ?message.sender(),
            delivered = delivery.delivered,
            failed = delivery.failed,
            "broadcast complete"
        );
        delivery
    }
}
