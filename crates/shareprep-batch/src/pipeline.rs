//! Share pipeline facade
//!
//! [`SharePipeline::prepare`] turns raw payloads into a running batch and
//! [`SharePipeline::send`] hands a finished batch to the messaging store.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use shareprep_core::{
    OutgoingMessage, PeerId, PipelineConfig, PrepareError, PreparedContent, RawPayload,
};
use shareprep_processing::{Collaborators, ItemStream, TransformContext, TransformRegistry};
use tokio_util::sync::CancellationToken;

use crate::aggregator::{ItemAggregator, PreparedBatch};
use crate::delivery::{DeliveryStream, DeliveryWatcher, MessageStore};
use crate::sources::{load_payloads, PayloadSource};

pub struct SharePipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
    registry: TransformRegistry,
    store: Arc<dyn MessageStore>,
}

impl SharePipeline {
    pub fn new(
        config: PipelineConfig,
        collaborators: Collaborators,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        let registry = TransformRegistry::new(collaborators.location_resolver.clone());
        Self {
            config,
            collaborators,
            registry,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start preparing `payloads` for `peer_id`.
    ///
    /// Items run concurrently once the batch is polled. A payload no transform
    /// accepts fails the batch with its index instead of leaving it pending.
    #[tracing::instrument(
        skip(self, payloads, extra_text),
        fields(peer_id = %peer_id, batch.size = payloads.len())
    )]
    pub fn prepare(
        &self,
        peer_id: PeerId,
        payloads: Vec<RawPayload>,
        extra_text: &str,
    ) -> PreparedBatch {
        let cancel = CancellationToken::new();
        let ctx = Arc::new(TransformContext {
            peer_id,
            config: self.config.clone(),
            collaborators: self.collaborators.clone(),
        });

        let items: Vec<ItemStream> = payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| {
                let kind = payload.kind();
                match self.registry.select(payload) {
                    Ok(transform) => transform.run(ctx.clone(), cancel.child_token()),
                    Err(e) => {
                        tracing::warn!(item.index = index, payload.kind = kind, error = %e, "No transform for payload");
                        stream::once(async move { Err(e) }).boxed()
                    }
                }
            })
            .collect();

        ItemAggregator::new(extra_text).aggregate(items, cancel)
    }

    /// Load every source, then [`prepare`](Self::prepare) what they produced.
    pub async fn prepare_from_sources(
        &self,
        peer_id: PeerId,
        sources: Vec<PayloadSource>,
        extra_text: &str,
    ) -> Result<PreparedBatch, PrepareError> {
        let payloads = load_payloads(sources).await?;
        Ok(self.prepare(peer_id, payloads, extra_text))
    }

    /// Enqueue `contents` for every peer and wait for delivery.
    ///
    /// Nothing is enqueued until the returned stream is polled.
    pub fn send(&self, peers: Vec<PeerId>, contents: Vec<PreparedContent>) -> DeliveryStream {
        let store = self.store.clone();
        let messages: Vec<OutgoingMessage> = contents.into_iter().map(OutgoingMessage::from).collect();

        Box::pin(async_stream::stream! {
            tracing::info!(peers = peers.len(), messages = messages.len(), "Sending prepared batch");

            let ids = match store.enqueue(&peers, messages).await {
                Ok(ids) => ids,
                Err(e) => {
                    let error = PrepareError::from(e);
                    crate::log_error(&error);
                    yield Err(error);
                    return;
                }
            };

            let mut delivery = DeliveryWatcher::new(store).watch(ids);
            while let Some(progress) = delivery.next().await {
                yield progress;
            }
        })
    }
}
