//! Batch aggregation
//!
//! All item streams of a batch are merged into one task that owns the
//! latest event of every item. Each time any item emits, the batch state is
//! recomputed from that whole table with [`combine`], so every emitted state
//! reflects one consistent snapshot.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use shareprep_core::{BatchState, ItemEvent, PrepareError, PreparedContent};
use shareprep_processing::ItemStream;
use tokio_util::sync::CancellationToken;

use crate::log_error;

/// Batch state for the latest event of every item, in item order.
///
/// Any item still `Preparing` makes the batch `Preparing`. Otherwise the first
/// item waiting on the user makes it `InteractionRequired`. The batch is `Done`
/// only when every item is done, with a non-empty `extra_text` placed first.
/// Everything else is `Progress` with the mean of the items' progress, done
/// items counting as 1.0.
pub fn combine(latest: &[ItemEvent], extra_text: &str) -> BatchState {
    if latest.iter().any(|event| matches!(event, ItemEvent::Preparing)) {
        return BatchState::Preparing;
    }

    let mut contents = Vec::with_capacity(latest.len() + 1);
    if !extra_text.is_empty() {
        contents.push(PreparedContent::Text(extra_text.to_string()));
    }
    let mut progress_sum = 0.0f32;
    let mut done = 0usize;

    for event in latest {
        match event {
            ItemEvent::Preparing => {}
            ItemEvent::Progress(fraction) => progress_sum += fraction,
            ItemEvent::InteractionRequired(content) => {
                return BatchState::InteractionRequired(vec![content.clone()]);
            }
            ItemEvent::Done(content) => {
                contents.push(content.clone());
                progress_sum += 1.0;
                done += 1;
            }
        }
    }

    if done == latest.len() {
        BatchState::Done(contents)
    } else {
        BatchState::Progress(progress_sum / latest.len() as f32)
    }
}

/// Fans item streams into a single batch state stream.
#[derive(Debug, Clone, Default)]
pub struct ItemAggregator {
    extra_text: String,
}

impl ItemAggregator {
    /// `extra_text`, when non-empty, leads the finished batch as a text item.
    pub fn new(extra_text: impl Into<String>) -> Self {
        Self {
            extra_text: extra_text.into(),
        }
    }

    /// Run `items` concurrently. The batch ends after `Done`, on the first
    /// item error, or when `cancel` fires. Ending early cancels `cancel` so
    /// every item releases what it holds.
    pub fn aggregate(&self, items: Vec<ItemStream>, cancel: CancellationToken) -> PreparedBatch {
        let size = items.len();
        let extra_text = self.extra_text.clone();
        let token = cancel.clone();

        // `None` marks the end of an item stream so stalls can be told apart
        // from completion.
        let tagged: Vec<BoxStream<'static, (usize, Option<Result<ItemEvent, PrepareError>>)>> =
            items
                .into_iter()
                .enumerate()
                .map(|(index, events)| {
                    events
                        .map(move |event| (index, Some(event)))
                        .chain(stream::once(async move { (index, None) }))
                        .boxed()
                })
                .collect();

        let states = Box::pin(async_stream::stream! {
            let mut latest = vec![ItemEvent::Preparing; size];
            let initial = combine(&latest, &extra_text);
            let finished = initial.is_done();
            let mut last = initial.clone();
            yield Ok(initial);
            if finished {
                return;
            }

            let mut merged = stream::select_all(tagged);
            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = merged.next() => Some(next),
                };

                let failure = match next {
                    None => PrepareError::Cancelled,
                    Some(None) => {
                        tracing::debug!(batch.size = size, state = ?last, "All item streams finished");
                        return;
                    }
                    Some(Some((index, Some(Ok(event))))) => {
                        latest[index] = event;
                        let state = combine(&latest, &extra_text);
                        if matches!((&state, &last), (BatchState::Preparing, BatchState::Preparing)) {
                            continue;
                        }
                        let finished = state.is_done();
                        last = state.clone();
                        yield Ok(state);
                        if finished {
                            tracing::info!(batch.size = size, "Batch prepared");
                            return;
                        }
                        continue;
                    }
                    Some(Some((_, Some(Err(PrepareError::Cancelled))))) => PrepareError::Cancelled,
                    Some(Some((index, Some(Err(e))))) => PrepareError::item(index, e),
                    Some(Some((index, None))) => {
                        if latest[index].is_terminal() {
                            continue;
                        }
                        PrepareError::ItemStalled { index }
                    }
                };

                cancel.cancel();
                drop(merged);
                log_error(&failure);
                yield Err(failure);
                return;
            }
        });

        tracing::debug!(batch.size = size, "Aggregating share items");

        PreparedBatch {
            states,
            cancel: token,
        }
    }
}

/// Running batch. Dropping it cancels every item that is still working.
pub struct PreparedBatch {
    states: BoxStream<'static, Result<BatchState, PrepareError>>,
    cancel: CancellationToken,
}

impl PreparedBatch {
    /// Ask every item to stop. The stream then ends with `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the batch to its final state.
    pub async fn finish(mut self) -> Result<BatchState, PrepareError> {
        let mut last = None;
        while let Some(state) = self.next().await {
            last = Some(state?);
        }
        last.ok_or(PrepareError::Cancelled)
    }
}

impl Stream for PreparedBatch {
    type Item = Result<BatchState, PrepareError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.states.poll_next_unpin(cx)
    }
}

impl Drop for PreparedBatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
