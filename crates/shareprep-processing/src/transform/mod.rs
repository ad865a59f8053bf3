//! Per-item transforms
//!
//! Every share item is turned into an [`ItemStream`]: zero or more
//! `Preparing`/`Progress` events followed by exactly one terminal event, or
//! an error. Transforms only orchestrate. Encoding, conversion, uploading and
//! geocoding go through [`Collaborators`].
//!
//! Cancellation is cooperative. [`ItemTransform::run`] races the transform
//! against a [`CancellationToken`]; when the token fires the inner stream is
//! dropped before `Cancelled` is reported, which kills child processes,
//! removes temp files and aborts in-flight uploads owned by that stream.

mod animation;
mod audio;
mod document;
mod location;
mod photo;
mod video;

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use image::DynamicImage;
use shareprep_core::{
    AudioPayload, ContactData, DataPayload, ItemEvent, MediaReference, PeerId, PipelineConfig,
    PixelDimensions, PrepareError, PreparedContent, UnpreparedContent, UploadEvent, VideoPayload,
};
use tokio_util::sync::CancellationToken;

use crate::audio::FfmpegWaveformExtractor;
use crate::document::PdftoppmThumbnailer;
use crate::gif::FfmpegGifConverter;
use crate::location::MapLinkResolver;
use crate::traits::{
    GifConverter, LocationResolver, PdfThumbnailer, UploadStream, Uploader, VideoConverter,
    WaveformExtractor,
};
use crate::video::PresetVideoConverter;

pub type ItemStream = BoxStream<'static, Result<ItemEvent, PrepareError>>;

/// The external subsystems a transform may call.
#[derive(Clone)]
pub struct Collaborators {
    pub uploader: Arc<dyn Uploader>,
    pub gif_converter: Arc<dyn GifConverter>,
    pub video_converter: Arc<dyn VideoConverter>,
    pub waveform_extractor: Arc<dyn WaveformExtractor>,
    pub location_resolver: Arc<dyn LocationResolver>,
    pub pdf_thumbnailer: Arc<dyn PdfThumbnailer>,
}

impl Collaborators {
    /// ffmpeg, pdftoppm and map-link backed collaborators around `uploader`.
    pub fn from_config(uploader: Arc<dyn Uploader>, config: &PipelineConfig) -> anyhow::Result<Self> {
        Ok(Self {
            uploader,
            gif_converter: Arc::new(FfmpegGifConverter::new(
                config.ffmpeg_path.clone(),
                config.ffprobe_path.clone(),
            )?),
            video_converter: Arc::new(PresetVideoConverter),
            waveform_extractor: Arc::new(FfmpegWaveformExtractor::new(config.ffmpeg_path.clone())?),
            location_resolver: Arc::new(MapLinkResolver),
            pdf_thumbnailer: Arc::new(PdftoppmThumbnailer::new(config.pdftoppm_path.clone())?),
        })
    }

    pub fn with_gif_converter(mut self, converter: Arc<dyn GifConverter>) -> Self {
        self.gif_converter = converter;
        self
    }

    pub fn with_video_converter(mut self, converter: Arc<dyn VideoConverter>) -> Self {
        self.video_converter = converter;
        self
    }

    pub fn with_waveform_extractor(mut self, extractor: Arc<dyn WaveformExtractor>) -> Self {
        self.waveform_extractor = extractor;
        self
    }

    pub fn with_location_resolver(mut self, resolver: Arc<dyn LocationResolver>) -> Self {
        self.location_resolver = resolver;
        self
    }

    pub fn with_pdf_thumbnailer(mut self, thumbnailer: Arc<dyn PdfThumbnailer>) -> Self {
        self.pdf_thumbnailer = thumbnailer;
        self
    }
}

/// Everything a running transform needs besides its payload.
pub struct TransformContext {
    pub peer_id: PeerId,
    pub config: PipelineConfig,
    pub collaborators: Collaborators,
}

/// One selected transform per share item.
#[derive(Debug, Clone)]
pub enum ItemTransform {
    /// Host-resized image bytes, uploaded as is.
    ScaledImage {
        data: Bytes,
        dimensions: PixelDimensions,
    },
    /// Decoded image, fitted and re-encoded as a photo.
    Photo(Arc<DynamicImage>),
    /// Still image bytes, decoded, fitted and re-encoded.
    StillImage(DataPayload),
    Video(VideoPayload),
    /// GIF bytes with their header dimensions.
    Gif {
        payload: DataPayload,
        dimensions: PixelDimensions,
    },
    File(DataPayload),
    Audio(AudioPayload),
    Text(String),
    /// A link the location resolver recognised.
    Location(String),
    Contact(ContactData),
}

impl ItemTransform {
    pub fn kind(&self) -> &'static str {
        match self {
            ItemTransform::ScaledImage { .. } => "scaled_image",
            ItemTransform::Photo(_) => "photo",
            ItemTransform::StillImage(_) => "still_image",
            ItemTransform::Video(_) => "video",
            ItemTransform::Gif { .. } => "gif",
            ItemTransform::File(_) => "file",
            ItemTransform::Audio(_) => "audio",
            ItemTransform::Text(_) => "text",
            ItemTransform::Location(_) => "location",
            ItemTransform::Contact(_) => "contact",
        }
    }

    /// Start the transform. Nothing happens until the stream is polled.
    pub fn run(self, ctx: Arc<TransformContext>, cancel: CancellationToken) -> ItemStream {
        tracing::debug!(item.kind = self.kind(), peer_id = %ctx.peer_id, "Starting item transform");

        let events = match self {
            ItemTransform::ScaledImage { data, dimensions } => {
                photo::scaled_image(ctx, data, dimensions)
            }
            ItemTransform::Photo(image) => photo::photo(ctx, image),
            ItemTransform::StillImage(payload) => photo::still_image(ctx, payload),
            ItemTransform::Video(video) => video::video(ctx, video),
            ItemTransform::Gif {
                payload,
                dimensions,
            } => animation::gif(ctx, payload, dimensions),
            ItemTransform::File(payload) => document::file(ctx, payload),
            ItemTransform::Audio(audio) => audio::audio(ctx, audio),
            ItemTransform::Text(text) => immediate(ItemEvent::Done(PreparedContent::Text(text))),
            ItemTransform::Location(url) => location::location(ctx, url),
            ItemTransform::Contact(contact) => immediate(ItemEvent::InteractionRequired(
                UnpreparedContent::Contact(contact),
            )),
        };

        cancellable(events, cancel)
    }
}

fn immediate(event: ItemEvent) -> ItemStream {
    futures::stream::once(async move { Ok(event) }).boxed()
}

/// Forward `events` until `cancel` fires, then drop them and report
/// `Cancelled`.
fn cancellable(events: ItemStream, cancel: CancellationToken) -> ItemStream {
    Box::pin(async_stream::stream! {
        let mut events = events;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = events.next() => Some(next),
            };
            match next {
                Some(Some(event)) => yield event,
                Some(None) => return,
                None => {
                    drop(events);
                    yield Err(PrepareError::Cancelled);
                    return;
                }
            }
        }
    })
}

/// Map upload subsystem events 1:1 onto item events.
fn upload_events(upload: UploadStream) -> ItemStream {
    Box::pin(async_stream::stream! {
        let mut upload = upload;
        while let Some(event) = upload.next().await {
            match event {
                Ok(UploadEvent::Progress(fraction)) => {
                    yield Ok(ItemEvent::Progress(fraction.clamp(0.0, 1.0)));
                }
                Ok(UploadEvent::Result(handle)) => {
                    yield Ok(ItemEvent::Done(PreparedContent::Media(MediaReference::Uploaded(handle))));
                    return;
                }
                Err(e) => {
                    yield Err(PrepareError::from(e));
                    return;
                }
            }
        }
        yield Err(PrepareError::UploadFailed("upload ended without a result".to_string()));
    })
}

/// Run CPU-bound image work off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, PrepareError>
where
    F: FnOnce() -> Result<T, PrepareError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PrepareError::ImageEncoding(format!("Image task failed: {}", e)))?
}
