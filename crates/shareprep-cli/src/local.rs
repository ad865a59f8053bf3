//! Local collaborators
//!
//! `DirectoryUploader` "uploads" into a directory and `InMemoryMessageStore`
//! pretends to deliver messages after a fixed delay. Together they let the
//! whole pipeline run on one machine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use shareprep_batch::{MessageStateStream, MessageStore};
use shareprep_core::{
    FileSource, FileUpload, MessageId, MessageState, OutgoingMessage, PeerId, PixelDimensions,
    StoreError, UploadError, UploadEvent, UploadedMediaHandle,
};
use shareprep_processing::{UploadStream, Uploader};
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Writes every upload into `dir` and reports progress per written chunk.
/// The returned handle is the stored file name.
pub struct DirectoryUploader {
    dir: PathBuf,
    chunk_size: usize,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn write(&self, name: String, data: Bytes) -> UploadStream {
        let path = self.dir.join(&name);
        let chunk_size = self.chunk_size;

        Box::pin(async_stream::stream! {
            let mut file = match tokio::fs::File::create(&path).await {
                Ok(file) => file,
                Err(e) => {
                    yield Err(UploadError::Io(e));
                    return;
                }
            };

            let total = data.len().max(1);
            let mut written = 0usize;
            for chunk in data.chunks(chunk_size) {
                if let Err(e) = file.write_all(chunk).await {
                    yield Err(UploadError::Io(e));
                    return;
                }
                written += chunk.len();
                yield Ok(UploadEvent::Progress(written as f32 / total as f32));
            }
            if let Err(e) = file.flush().await {
                yield Err(UploadError::Io(e));
                return;
            }

            tracing::info!(path = %path.display(), bytes = data.len(), "Stored upload");
            yield Ok(UploadEvent::Result(UploadedMediaHandle::new(name)));
        })
    }
}

impl Uploader for DirectoryUploader {
    fn upload_image(&self, peer_id: PeerId, data: Bytes, dimensions: PixelDimensions) -> UploadStream {
        tracing::debug!(peer_id = %peer_id, dimensions = %dimensions, "Uploading photo");
        self.write(format!("{}.jpg", Uuid::new_v4()), data)
    }

    fn upload_file(&self, peer_id: PeerId, file: FileUpload) -> UploadStream {
        let id = Uuid::new_v4();
        let name = match file.file_name() {
            Some(file_name) => format!("{}-{}", id, sanitize(file_name)),
            None => id.to_string(),
        };
        tracing::debug!(
            peer_id = %peer_id,
            mime_type = %file.mime_type,
            large = file.hint_file_is_large,
            attributes = ?file.attributes,
            "Uploading file"
        );

        if let Some(thumbnail) = &file.thumbnail {
            let thumb_path = self.dir.join(format!("{}.thumb.jpg", id));
            let thumbnail = thumbnail.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::fs::write(&thumb_path, &thumbnail).await {
                    tracing::warn!(path = %thumb_path.display(), error = %e, "Failed to store thumbnail");
                }
            });
        }

        match file.source {
            FileSource::Data(data) => self.write(name, data),
            FileSource::Resource(resource) => {
                let target = self.dir.join(&name);
                Box::pin(async_stream::stream! {
                    if let Some(adjustments) = &resource.adjustments {
                        let sidecar = target.with_extension("adjustments.json");
                        if let Err(e) = tokio::fs::write(&sidecar, &adjustments.data).await {
                            yield Err(UploadError::Io(e));
                            return;
                        }
                    }
                    match tokio::fs::copy(&resource.path, &target).await {
                        Ok(bytes) => {
                            tracing::info!(
                                source = %resource.path.display(),
                                path = %target.display(),
                                bytes = bytes,
                                "Stored video resource"
                            );
                            yield Ok(UploadEvent::Progress(1.0));
                            yield Ok(UploadEvent::Result(UploadedMediaHandle::new(name)));
                        }
                        Err(e) => yield Err(UploadError::Io(e)),
                    }
                })
            }
        }
    }
}

fn sanitize(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|name| name.to_string_lossy().replace(|c: char| c.is_control(), "_"))
        .unwrap_or_else(|| "file".to_string())
}

/// Message store that marks every message sent `delay` after it is enqueued.
pub struct InMemoryMessageStore {
    next_id: AtomicI32,
    delay: Duration,
    messages: Mutex<Vec<(MessageId, OutgoingMessage)>>,
    states: Arc<watch::Sender<HashMap<MessageId, bool>>>,
}

impl InMemoryMessageStore {
    pub fn new(delay: Duration) -> Self {
        let (states, _) = watch::channel(HashMap::new());
        Self {
            next_id: AtomicI32::new(1),
            delay,
            messages: Mutex::new(Vec::new()),
            states: Arc::new(states),
        }
    }

    pub fn messages(&self) -> Vec<(MessageId, OutgoingMessage)> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn enqueue(
        &self,
        peers: &[PeerId],
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<MessageId>, StoreError> {
        let mut ids = Vec::with_capacity(peers.len() * messages.len());
        {
            let mut stored = self
                .messages
                .lock()
                .map_err(|e| StoreError::EnqueueFailed(e.to_string()))?;
            for peer_id in peers {
                for message in &messages {
                    let id = MessageId {
                        peer_id: *peer_id,
                        id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    };
                    stored.push((id, message.clone()));
                    ids.push(id);
                }
            }
        }

        self.states.send_modify(|states| {
            for id in &ids {
                states.insert(*id, true);
            }
        });

        let states = self.states.clone();
        let delay = self.delay;
        let sent = ids.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            states.send_modify(|states| {
                for id in &sent {
                    states.insert(*id, false);
                }
            });
            tracing::debug!(messages = sent.len(), "Messages marked sent");
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
