//! Client sink definition
//!
//! The outbound half of a connection as seen by everybody else.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerLine;

/// Lines queued per client before further lines to it are dropped
pub const SINK_CAPACITY: usize = 1024;

/// Handle for delivering whole lines to one connected client
///
/// Lines are queued on a channel drained by that connection's single writer
/// task, so concurrent senders can never split or interleave a line. The
/// queue is bounded: a client that stops reading loses lines once
/// [`SINK_CAPACITY`] are pending, instead of growing server memory.
#[derive(Debug, Clone)]
pub struct ClientSink {
    sender: mpsc::Sender<ServerLine>,
}

impl ClientSink {
    /// Create a sink and the receiver its writer task drains
    pub fn channel() -> (Self, mpsc::Receiver<ServerLine>) {
        Self::with_capacity(SINK_CAPACITY)
    }

    /// Create a sink holding at most `capacity` pending lines
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ServerLine>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Queue a line for this client
    ///
    /// Never blocks. Fails if the writer task has ended (client disconnected)
    /// or the client is too far behind.
    pub fn send(&self, line: ServerLine) -> Result<(), SendError> {
        self.sender.try_send(line).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Check whether the writer task is gone
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_delivers_in_order() {
        let (sink, mut rx) = ClientSink::channel();
        sink.send(ServerLine::SubmitName).unwrap();
        sink.send(ServerLine::NameAccepted).unwrap();

        assert_eq!(rx.recv().await, Some(ServerLine::SubmitName));
        assert_eq!(rx.recv().await, Some(ServerLine::NameAccepted));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (sink, rx) = ClientSink::channel();
        drop(rx);

        assert!(sink.is_closed());
        assert!(matches!(
            sink.send(ServerLine::SubmitName),
            Err(SendError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_full_queue_drops_line() {
        let (sink, mut rx) = ClientSink::with_capacity(2);
        sink.send(ServerLine::SubmitName).unwrap();
        sink.send(ServerLine::SubmitName).unwrap();

        assert!(matches!(
            sink.send(ServerLine::NameAccepted),
            Err(SendError::QueueFull)
        ));

        // Draining makes room again
        assert_eq!(rx.recv().await, Some(ServerLine::SubmitName));
        assert!(sink.send(ServerLine::NameAccepted).is_ok());
    }
}
