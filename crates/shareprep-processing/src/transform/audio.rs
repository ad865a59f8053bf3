use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use shareprep_core::constants::{DEFAULT_FILE_NAME, MIME_AUDIO_OGG};
use shareprep_core::{AudioPayload, FileAttribute, FileSource, FileUpload, ItemEvent, PrepareError};

use super::{upload_events, ItemStream, TransformContext};

pub(super) fn audio(ctx: Arc<TransformContext>, audio: AudioPayload) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let data = match tokio::fs::read(&audio.path).await {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::warn!(error = %e, path = %audio.path.display(), "Failed to read audio file");
                yield Err(PrepareError::Io(e));
                return;
            }
        };

        let duration = audio.duration.unwrap_or(0.0).max(0.0);
        let is_voice = audio
            .is_voice
            .unwrap_or(duration == 0.0 || duration < ctx.config.voice_max_secs);
        let waveform = ctx
            .collaborators
            .waveform_extractor
            .extract_waveform(&audio.path)
            .await;
        let file_name = audio
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        let file = FileUpload {
            hint_file_is_large: ctx.config.is_large_file(data.len()),
            source: FileSource::Data(data),
            thumbnail: None,
            mime_type: MIME_AUDIO_OGG.to_string(),
            attributes: vec![
                FileAttribute::Audio {
                    is_voice,
                    duration: duration as u32,
                    title: audio.title.clone(),
                    performer: audio.artist.clone(),
                    waveform,
                },
                FileAttribute::FileName(file_name),
            ],
        };

        let mut upload = upload_events(ctx.collaborators.uploader.upload_file(ctx.peer_id, file));
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}
