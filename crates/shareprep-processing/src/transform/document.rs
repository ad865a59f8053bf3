use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use shareprep_core::constants::{DEFAULT_FILE_NAME, MIME_OCTET_STREAM, MIME_PDF};
use shareprep_core::{DataPayload, FileAttribute, FileSource, FileUpload, ItemEvent};

use super::{run_blocking, upload_events, ItemStream, TransformContext};
use crate::image::encode_jpeg;

pub(super) fn file(ctx: Arc<TransformContext>, payload: DataPayload) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let mime_type = payload
            .mime_type
            .clone()
            .unwrap_or_else(|| MIME_OCTET_STREAM.to_string());

        let thumbnail = if mime_type == MIME_PDF {
            pdf_thumbnail(&ctx, payload.data.clone()).await
        } else {
            None
        };

        let file = FileUpload {
            hint_file_is_large: ctx.config.is_large_file(payload.data.len()),
            source: FileSource::Data(payload.data),
            thumbnail,
            mime_type,
            attributes: vec![FileAttribute::FileName(
                payload
                    .file_name
                    .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            )],
        };

        let mut upload = upload_events(ctx.collaborators.uploader.upload_file(ctx.peer_id, file));
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}

/// JPEG preview of the first page. A missing preview never fails the upload.
async fn pdf_thumbnail(ctx: &TransformContext, data: Bytes) -> Option<Bytes> {
    let page = ctx
        .collaborators
        .pdf_thumbnailer
        .render(data, ctx.config.pdf_thumbnail_box())
        .await?;

    let quality = ctx.config.pdf_thumbnail_quality;
    match run_blocking(move || encode_jpeg(&page, quality)).await {
        Ok(jpeg) => Some(jpeg),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode PDF preview");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use image::{DynamicImage, RgbImage};
    use shareprep_core::PixelDimensions;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::traits::PdfThumbnailer;
    use crate::transform::test_support::*;
    use crate::transform::ItemTransform;

    struct BlankPage;

    #[async_trait]
    impl PdfThumbnailer for BlankPage {
        async fn render(&self, _data: Bytes, bounds: PixelDimensions) -> Option<DynamicImage> {
            Some(DynamicImage::ImageRgb8(RgbImage::new(bounds.width / 2, bounds.height)))
        }
    }

    #[tokio::test]
    async fn test_generic_file_defaults() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let payload = DataPayload {
            data: Bytes::from(vec![0u8; 5 * 1024 * 1024 + 1]),
            file_name: None,
            mime_type: None,
        };

        let events = collect(ItemTransform::File(payload).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));

        let file = uploader.single_file();
        assert_eq!(file.mime_type, "application/octet-stream");
        assert_eq!(file.file_name(), Some("file"));
        assert!(file.hint_file_is_large);
        assert!(file.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_pdf_gets_thumbnail() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context_with(uploader.clone(), |c| c.with_pdf_thumbnailer(Arc::new(BlankPage)));
        let payload = DataPayload {
            data: Bytes::from_static(b"%PDF-1.4\n"),
            file_name: Some("report.pdf".to_string()),
            mime_type: Some("application/pdf".to_string()),
        };

        collect(ItemTransform::File(payload).run(ctx, CancellationToken::new())).await;

        let file = uploader.single_file();
        assert_eq!(file.file_name(), Some("report.pdf"));
        assert!(!file.hint_file_is_large);
        let thumbnail = file.thumbnail.expect("pdf thumbnail");
        assert_eq!(&thumbnail[..2], &[0xFF, 0xD8]);
        assert_eq!(
            crate::image::probe_dimensions(&thumbnail),
            Some(PixelDimensions::new(128, 256))
        );
    }

    #[tokio::test]
    async fn test_pdf_without_preview_still_uploads() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let payload = DataPayload {
            data: Bytes::from_static(b"%PDF-1.4\n"),
            file_name: None,
            mime_type: Some("application/pdf".to_string()),
        };

        let events = collect(ItemTransform::File(payload).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));
        assert!(uploader.single_file().thumbnail.is_none());
    }
}
