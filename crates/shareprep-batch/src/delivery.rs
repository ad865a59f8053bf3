//! Delivery tracking for sent batches.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use shareprep_core::{MessageId, MessageState, OutgoingMessage, PeerId, PrepareError, StoreError};

/// Snapshots of the delivery state of a set of messages. Every item carries
/// the state of all watched ids.
pub type MessageStateStream = BoxStream<'static, Vec<MessageState>>;

/// Completion fraction of a delivery. Emits `1.0` once everything is sent.
pub type DeliveryStream = BoxStream<'static, Result<f32, PrepareError>>;

/// Messaging store the prepared batch is handed to.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Enqueue `messages` for every peer, returning one id per message and peer.
    async fn enqueue(
        &self,
        peers: &[PeerId],
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<MessageId>, StoreError>;

    /// Current state of `ids`, followed by every change.
    fn messages_state(&self, ids: &[MessageId]) -> MessageStateStream;
}

pub struct DeliveryWatcher {
    store: Arc<dyn MessageStore>,
}

impl DeliveryWatcher {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Wait until none of `ids` is unsent, then emit `1.0` and finish.
    ///
    /// Ids absent from a snapshot count as sent. Intermediate snapshots
    /// produce nothing. A state stream that ends while
    /// messages are still unsent fails with `Delivery`.
    pub fn watch(&self, ids: Vec<MessageId>) -> DeliveryStream {
        if ids.is_empty() {
            return futures::stream::once(async { Ok(1.0) }).boxed();
        }

        let mut states = self.store.messages_state(&ids);
        let count = ids.len();

        Box::pin(async_stream::stream! {
            while let Some(snapshot) = states.next().await {
                // An id missing from the snapshot is no longer pending.
                let unsent = ids
                    .iter()
                    .filter(|id| snapshot.iter().any(|state| state.id == **id && state.unsent))
                    .count();

                if unsent == 0 {
                    tracing::info!(messages = count, "All messages delivered");
                    yield Ok(1.0);
                    return;
                }
                tracing::debug!(messages = count, unsent = unsent, "Waiting for delivery");
            }

            let error = PrepareError::Delivery("message state stream ended before delivery".to_string());
            crate::log_error(&error);
            yield Err(error);
        })
    }
}
