use std::sync::Arc;

use futures::StreamExt;
use shareprep_core::constants::{
    CONVERTED_GIF_FILE_NAME, FALLBACK_GIF_FILE_NAME, MIME_ANIMATED_GIF, MIME_VIDEO_MP4,
};
use shareprep_core::{
    DataPayload, FileAttribute, FileSource, FileUpload, ItemEvent, PixelDimensions, VideoFlags,
};

use super::{upload_events, ItemStream, TransformContext};

/// Convert a GIF to a muted MP4 and upload it. When conversion fails the
/// original GIF is uploaded instead; that is not an error.
pub(super) fn gif(
    ctx: Arc<TransformContext>,
    payload: DataPayload,
    dimensions: PixelDimensions,
) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let file = match ctx.collaborators.gif_converter.convert(payload.data.clone()).await {
            Ok(converted) => FileUpload {
                hint_file_is_large: ctx.config.is_large_file(converted.data.len()),
                source: FileSource::Data(converted.data),
                thumbnail: None,
                mime_type: MIME_VIDEO_MP4.to_string(),
                attributes: vec![
                    FileAttribute::Video {
                        duration: converted.duration.max(0.0) as u32,
                        size: dimensions,
                        flags: VideoFlags {
                            supports_streaming: true,
                            instant_round: false,
                        },
                    },
                    FileAttribute::Animated,
                    FileAttribute::FileName(CONVERTED_GIF_FILE_NAME.to_string()),
                ],
            },
            Err(e) => {
                tracing::warn!(error = %e, "GIF conversion failed, uploading original GIF");
                FileUpload {
                    hint_file_is_large: ctx.config.is_large_file(payload.data.len()),
                    source: FileSource::Data(payload.data),
                    thumbnail: None,
                    mime_type: MIME_ANIMATED_GIF.to_string(),
                    attributes: vec![
                        FileAttribute::ImageSize(dimensions),
                        FileAttribute::Animated,
                        FileAttribute::FileName(
                            payload
                                .file_name
                                .unwrap_or_else(|| FALLBACK_GIF_FILE_NAME.to_string()),
                        ),
                    ],
                }
            }
        };

        let mut upload = upload_events(ctx.collaborators.uploader.upload_file(ctx.peer_id, file));
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::traits::ConvertedGif;
    use crate::transform::test_support::*;
    use crate::transform::ItemTransform;

    fn gif_payload(file_name: Option<&str>) -> DataPayload {
        DataPayload {
            data: Bytes::from_static(b"GIF89a\x02\x00\x03\x00"),
            file_name: file_name.map(str::to_string),
            mime_type: Some("image/gif".to_string()),
        }
    }

    #[tokio::test]
    async fn test_converted_gif_is_uploaded_as_mp4() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context_with(uploader.clone(), |c| {
            c.with_gif_converter(Arc::new(StubGifConverter {
                result: Some(ConvertedGif {
                    data: Bytes::from_static(b"mp4"),
                    duration: 2.7,
                }),
            }))
        });

        let transform = ItemTransform::Gif {
            payload: gif_payload(Some("cat.gif")),
            dimensions: PixelDimensions::new(2, 3),
        };
        let events = collect(transform.run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));

        let file = uploader.single_file();
        assert_eq!(file.mime_type, "video/mp4");
        assert_eq!(file.source, FileSource::Data(Bytes::from_static(b"mp4")));
        assert_eq!(file.file_name(), Some("animation.mp4"));
        assert!(file.is_animated());
        assert!(matches!(
            file.attributes[0],
            FileAttribute::Video { duration: 2, size, .. } if size == PixelDimensions::new(2, 3)
        ));
    }

    #[tokio::test]
    async fn test_failed_conversion_falls_back_to_original() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());

        let transform = ItemTransform::Gif {
            payload: gif_payload(None),
            dimensions: PixelDimensions::new(2, 3),
        };
        let events = collect(transform.run(ctx, CancellationToken::new())).await;
        assert!(events.iter().all(|e| e.is_ok()));
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));

        let file = uploader.single_file();
        assert_eq!(file.mime_type, "animation/gif");
        assert_eq!(file.source, FileSource::Data(gif_payload(None).data));
        assert_eq!(
            file.attributes,
            vec![
                FileAttribute::ImageSize(PixelDimensions::new(2, 3)),
                FileAttribute::Animated,
                FileAttribute::FileName("animation.gif".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fallback_keeps_caller_file_name() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let transform = ItemTransform::Gif {
            payload: gif_payload(Some("party.gif")),
            dimensions: PixelDimensions::new(2, 3),
        };
        collect(transform.run(ctx, CancellationToken::new())).await;
        assert_eq!(uploader.single_file().file_name(), Some("party.gif"));
    }
}
