//! Stub collaborators for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use shareprep_batch::{MessageStateStream, MessageStore};
use shareprep_core::{
    FileUpload, MessageId, MessageState, OutgoingMessage, PeerId, PixelDimensions, StoreError,
    UploadError, UploadEvent, UploadedMediaHandle,
};
use shareprep_processing::{ConvertedGif, GifConverter, UploadStream, Uploader, WaveformExtractor};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Counts resources opened by stubs and still alive.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    open: AtomicUsize,
    opened: AtomicUsize,
}

impl ResourceTracker {
    pub fn acquire(self: &Arc<Self>) -> ResourceGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        ResourceGuard {
            tracker: self.clone(),
        }
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

pub struct ResourceGuard {
    tracker: Arc<ResourceTracker>,
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.tracker.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Image {
        data: Bytes,
        dimensions: PixelDimensions,
    },
    File(FileUpload),
}

#[derive(Debug, Clone)]
pub enum UploadBehavior {
    /// Progress 0.5, then a handle.
    Complete,
    /// Progress 0.5, then nothing until dropped.
    Hold,
    Fail(String),
}

pub struct StubUploader {
    pub requests: Mutex<Vec<Recorded>>,
    pub tracker: Arc<ResourceTracker>,
    behavior: UploadBehavior,
}

impl StubUploader {
    pub fn new(behavior: UploadBehavior) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            tracker: Arc::new(ResourceTracker::default()),
            behavior,
        }
    }

    pub fn with_tracker(behavior: UploadBehavior, tracker: Arc<ResourceTracker>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            tracker,
            behavior,
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, request: Recorded) -> UploadStream {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let guard = self.tracker.acquire();
        let behavior = self.behavior.clone();

        Box::pin(async_stream::stream! {
            let _guard = guard;
            yield Ok(UploadEvent::Progress(0.5));
            match behavior {
                UploadBehavior::Complete => {
                    yield Ok(UploadEvent::Result(UploadedMediaHandle::new(format!("media-{}", index))));
                }
                UploadBehavior::Hold => futures::future::pending::<()>().await,
                UploadBehavior::Fail(message) => yield Err(UploadError::Rejected(message)),
            }
        })
    }
}

impl Uploader for StubUploader {
    fn upload_image(&self, _peer_id: PeerId, data: Bytes, dimensions: PixelDimensions) -> UploadStream {
        self.respond(Recorded::Image { data, dimensions })
    }

    fn upload_file(&self, _peer_id: PeerId, file: FileUpload) -> UploadStream {
        self.respond(Recorded::File(file))
    }
}

pub struct FailingGifConverter;

#[async_trait]
impl GifConverter for FailingGifConverter {
    async fn convert(&self, _data: Bytes) -> anyhow::Result<ConvertedGif> {
        Err(anyhow::anyhow!("ffmpeg exited with status 1"))
    }
}

/// Never finishes; holds a tracked resource while converting.
pub struct HangingGifConverter {
    pub tracker: Arc<ResourceTracker>,
}

#[async_trait]
impl GifConverter for HangingGifConverter {
    async fn convert(&self, _data: Bytes) -> anyhow::Result<ConvertedGif> {
        let _guard = self.tracker.acquire();
        futures::future::pending::<()>().await;
        Err(anyhow::anyhow!("unreachable"))
    }
}

pub struct NoWaveform;

#[async_trait]
impl WaveformExtractor for NoWaveform {
    async fn extract_waveform(&self, _path: &std::path::Path) -> Option<Bytes> {
        None
    }
}

/// Message store backed by a watch channel of delivery flags.
pub struct StubStore {
    next_id: AtomicUsize,
    pub enqueued: Mutex<Vec<(PeerId, OutgoingMessage)>>,
    states: watch::Sender<HashMap<MessageId, bool>>,
}

impl Default for StubStore {
    fn default() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            enqueued: Mutex::new(Vec::new()),
            states: watch::channel(HashMap::new()).0,
        }
    }
}

impl StubStore {
    pub fn mark_sent(&self, id: MessageId) {
        self.states.send_modify(|states| {
            states.insert(id, false);
        });
    }

    pub fn ids(&self) -> Vec<MessageId> {
        let mut ids: Vec<_> = self.states.borrow().keys().copied().collect();
        ids.sort_by_key(|id| id.id);
        ids
    }
}

#[async_trait]
impl MessageStore for StubStore {
    async fn enqueue(
        &self,
        peers: &[PeerId],
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<MessageId>, StoreError> {
        if peers.iter().any(|peer| peer.0 == 0) {
            return Err(StoreError::PeerNotFound(0));
        }

        let mut ids = Vec::new();
        let mut enqueued = self.enqueued.lock().unwrap();
        for peer in peers {
            for message in &messages {
                let id = MessageId {
                    peer_id: *peer,
                    id: self.next_id.fetch_add(1, Ordering::SeqCst) as i32,
                };
                enqueued.push((*peer, message.clone()));
                ids.push(id);
            }
        }
        self.states.send_modify(|states| {
            for id in &ids {
                states.insert(*id, true);
            }
        });
        Ok(ids)
    }

    fn messages_state(&self, ids: &[MessageId]) -> MessageStateStream {
        let ids = ids.to_vec();
        WatchStream::new(self.states.subscribe())
            .map(move |states| {
                ids.iter()
                    .filter_map(|id| {
                        states.get(id).map(|unsent| MessageState {
                            id: *id,
                            unsent: *unsent,
                        })
                    })
                    .collect()
            })
            .boxed()
    }
}
