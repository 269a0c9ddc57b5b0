//! Message routing
//!
//! Broadcast and directed delivery against the client registry. Delivery is
//! best-effort and independent per recipient: a closed or full sink is skipped and
//! nothing is reported back to the sender.

use tracing::debug;

use crate::client::ClientSink;
use crate::message::{Message, ServerLine};
use crate::registry::ClientRegistry;
use crate::types::ClientName;

/// Routes parsed messages to registered sinks
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: ClientRegistry,
}

impl MessageRouter {
    /// Create a router over the given registry
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    /// Deliver a message from `sender`
    ///
    /// Returns the number of lines successfully queued.
    pub fn route(&self, sender: &ClientName, message: Message) -> usize {
        match message {
            Message::Broadcast { body } => self.broadcast(sender, body),
            Message::Directed { recipients, body } => self.direct(sender, &recipients, body),
        }
    }

    /// Deliver to every registered client, sender included
    fn broadcast(&self, sender: &ClientName, body: String) -> usize {
        let line = ServerLine::Message {
            from: sender.clone(),
            body,
        };
        let delivered = deliver_all(&self.registry.snapshot_sinks(), &line);
        debug!("Broadcast from {} reached {} clients", sender, delivered);
        delivered
    }

    /// Deliver to each listed recipient in order
    fn direct(&self, sender: &ClientName, recipients: &[String], body: String) -> usize {
        let line = ServerLine::Message {
            from: sender.clone(),
            body,
        };

        let mut delivered = 0;
        for recipient in recipients {
            match self.registry.lookup_sink(recipient) {
                Some(sink) => {
                    if sink.send(line.clone()).is_ok() {
                        delivered += 1;
                    }
                }
                None => debug!("Dropping message from {} to unknown {}", sender, recipient),
            }
        }
        delivered
    }
}

fn deliver_all(sinks: &[ClientSink], line: &ServerLine) -> usize {
    sinks
        .iter()
        .filter(|sink| sink.send(line.clone()).is_ok())
        .count()
}
