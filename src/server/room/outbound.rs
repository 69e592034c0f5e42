//! Per-client outbound queue.
//!
//! The room holds the only sender; the session consumes the receiver as a
//! stream of batches so that events queued while a frame was being written
//! go out together in the next frame.

use futures_util::stream::{self, LocalBoxStream, StreamExt};
use log::error;
use tokio::sync::mpsc;

use super::messages::ServerEvent;
use crate::config::relay::OUTBOUND_QUEUE_CAPACITY;

pub type OutboundSender = mpsc::Sender<ServerEvent>;
pub type OutboundReceiver = mpsc::Receiver<ServerEvent>;

/// Create a bounded outbound queue for one client.
pub fn outbound_queue() -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// Events written to the socket as a single text frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundBatch(pub Vec<ServerEvent>);

impl OutboundBatch {
    /// Serialize every event and join them with newlines. Events that fail
    /// to serialize are logged and left out.
    pub fn to_frame(&self) -> String {
        self.0
            .iter()
            .filter_map(|event| match event.encode() {
                Ok(text) => Some(text),
                Err(e) => {
                    error!("[Session] Dropping outbound event {:?}: {}", event, e);
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Turn the receiving half into a stream of batches.
///
/// Each batch waits for one event, then takes whatever else is already
/// queued at that moment without waiting for more. The stream ends once the
/// room drops the sender and the queue is drained.
pub fn batches(receiver: OutboundReceiver) -> LocalBoxStream<'static, OutboundBatch> {
    stream::unfold(receiver, |mut receiver| async move {
        let first = receiver.recv().await?;
        let pending = receiver.len();
        let mut events = Vec::with_capacity(pending + 1);
        events.push(first);
        for _ in 0..pending {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        Some((OutboundBatch(events), receiver))
    })
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::server::room::messages::MessageOrigin;

    #[tokio::test]
    async fn test_batch_takes_everything_already_queued() {
        let (tx, rx) = outbound_queue();
        let mut stream = batches(rx);

        tx.try_send(ServerEvent::MatchFound {}).unwrap();
        tx.try_send(ServerEvent::AcceptedMatch {}).unwrap();
        tx.try_send(ServerEvent::JoinedMatch {}).unwrap();

        let batch = stream.next().await.expect("one batch");
        assert_eq!(
            batch.0,
            vec![ServerEvent::MatchFound {}, ServerEvent::AcceptedMatch {}, ServerEvent::JoinedMatch {}]
        );

        tx.try_send(ServerEvent::NoMatch {}).unwrap();
        let batch = stream.next().await.expect("second batch");
        assert_eq!(batch.0, vec![ServerEvent::NoMatch {}]);
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (tx, rx) = outbound_queue();
        let mut stream = batches(rx);

        tx.try_send(ServerEvent::partner_disconnected()).unwrap();
        drop(tx);

        let batch = stream.next().await.expect("queued events are still delivered");
        assert_eq!(batch.0.len(), 1);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_queue_is_bounded() {
        let (tx, _rx) = outbound_queue();
        for _ in 0..OUTBOUND_QUEUE_CAPACITY {
            tx.try_send(ServerEvent::NoMatch {}).unwrap();
        }
        assert!(matches!(
            tx.try_send(ServerEvent::NoMatch {}),
            Err(mpsc::error::TrySendError::Full(_))
        ));
    }

    #[test]
    fn test_frame_joins_events_with_newlines() {
        let batch = OutboundBatch(vec![
            ServerEvent::NoMatch {},
            ServerEvent::message_received(json!("yo"), MessageOrigin::User, 42),
        ]);
        assert_eq!(
            batch.to_frame(),
            "{\"Type\":\"NO_MATCH\",\"Payload\":{}}\n\
             {\"Type\":\"MESSAGE_RECEIVED\",\"Payload\":{\"message\":\"yo\",\"from\":\"USER\",\"time\":42}}"
        );
    }
}
