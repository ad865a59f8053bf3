use std::sync::Arc;

use futures::StreamExt;
use shareprep_core::constants::MIME_VIDEO_MP4;
use shareprep_core::{
    FileAttribute, FileSource, FileUpload, ItemEvent, LocalVideoResource, PrepareError,
    VideoFlags, VideoPayload,
};
use uuid::Uuid;

use super::{upload_events, ItemStream, TransformContext};
use crate::video::{VideoAdjustments, VideoPreset};

/// Upload a local video as a resource the upload subsystem transcodes with
/// the attached adjustments.
pub(super) fn video(ctx: Arc<TransformContext>, video: VideoPayload) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let file = match build_upload(&ctx, &video) {
            Ok(file) => file,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        let mut upload = upload_events(ctx.collaborators.uploader.upload_file(ctx.peer_id, file));
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}

fn build_upload(ctx: &TransformContext, video: &VideoPayload) -> Result<FileUpload, PrepareError> {
    let adjustments = VideoAdjustments::for_payload(video);
    let preset = adjustments
        .as_ref()
        .map(|adj| adj.preset)
        .unwrap_or(VideoPreset::CompressedMedium);

    let dimensions = ctx.collaborators.video_converter.dimensions(
        video.source.dimensions,
        adjustments.as_ref(),
        preset,
    );

    let duration = adjustments
        .as_ref()
        .and_then(|adj| adj.trimmed_duration())
        .unwrap_or(video.source.duration)
        .max(0.0);

    let resource_adjustments = adjustments
        .as_ref()
        .map(|adj| adj.to_resource())
        .transpose()
        .map_err(|e| PrepareError::TranscodeFailed(format!("{:#}", e)))?;

    tracing::debug!(
        width = dimensions.width,
        height = dimensions.height,
        duration = duration,
        round = video.round_message,
        "Prepared video upload"
    );

    Ok(FileUpload {
        source: FileSource::Resource(LocalVideoResource {
            random_id: Uuid::new_v4(),
            path: video.source.path.clone(),
            adjustments: resource_adjustments,
        }),
        thumbnail: None,
        mime_type: MIME_VIDEO_MP4.to_string(),
        attributes: vec![FileAttribute::Video {
            duration: duration as u32,
            size: dimensions,
            flags: VideoFlags {
                supports_streaming: true,
                instant_round: video.round_message,
            },
        }],
        hint_file_is_large: duration > ctx.config.large_video_secs,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use shareprep_core::{PixelDimensions, TrimRange, VideoSource};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::transform::test_support::*;
    use crate::transform::ItemTransform;

    fn payload(duration: f64) -> VideoPayload {
        VideoPayload {
            source: VideoSource {
                path: PathBuf::from("/videos/clip.mov"),
                dimensions: PixelDimensions::new(1920, 1080),
                duration,
            },
            round_message: false,
            frame: None,
            trim: None,
        }
    }

    #[tokio::test]
    async fn test_plain_video_upload() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());

        let events =
            collect(ItemTransform::Video(payload(200.5)).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));

        let file = uploader.single_file();
        assert_eq!(file.mime_type, "video/mp4");
        assert!(file.hint_file_is_large);
        match &file.source {
            FileSource::Resource(resource) => {
                assert_eq!(resource.path, PathBuf::from("/videos/clip.mov"));
                assert!(resource.adjustments.is_none());
            }
            other => panic!("Expected resource source, got {:?}", other),
        }
        assert_eq!(
            file.attributes,
            vec![FileAttribute::Video {
                duration: 200,
                size: PixelDimensions::new(848, 476),
                flags: VideoFlags {
                    supports_streaming: true,
                    instant_round: false
                },
            }]
        );
    }

    #[tokio::test]
    async fn test_round_video_is_square_with_adjustments() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let mut video = payload(12.0);
        video.round_message = true;
        video.frame = Some((1920.0, 1080.0));

        collect(ItemTransform::Video(video).run(ctx, CancellationToken::new())).await;

        let file = uploader.single_file();
        assert!(!file.hint_file_is_large);
        let FileSource::Resource(resource) = &file.source else {
            panic!("Expected resource source");
        };
        let adjustments = resource.adjustments.as_ref().unwrap();
        assert_eq!(adjustments.digest.len(), 32);
        let decoded: VideoAdjustments = serde_json::from_slice(&adjustments.data).unwrap();
        assert_eq!(decoded.preset, VideoPreset::VideoMessage);

        assert!(matches!(
            &file.attributes[0],
            FileAttribute::Video { duration: 12, size, flags }
                if *size == PixelDimensions::new(240, 240) && flags.instant_round && flags.supports_streaming
        ));
    }

    #[tokio::test]
    async fn test_trimmed_video_reports_trimmed_duration() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let mut video = payload(600.0);
        video.trim = Some(TrimRange {
            start: 10.0,
            end: 40.0,
        });

        collect(ItemTransform::Video(video).run(ctx, CancellationToken::new())).await;

        let file = uploader.single_file();
        assert!(!file.hint_file_is_large);
        assert!(matches!(file.attributes[0], FileAttribute::Video { duration: 30, .. }));
    }
}
