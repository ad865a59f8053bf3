use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use image::DynamicImage;
use shareprep_core::{DataPayload, ItemEvent, PixelDimensions};

use super::{run_blocking, upload_events, ItemStream, TransformContext};
use crate::image::{decode, encode_jpeg, fit_image, image_dimensions};

pub(super) fn scaled_image(
    ctx: Arc<TransformContext>,
    data: Bytes,
    dimensions: PixelDimensions,
) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);
        let mut upload = upload_events(
            ctx.collaborators.uploader.upload_image(ctx.peer_id, data, dimensions),
        );
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}

pub(super) fn photo(ctx: Arc<TransformContext>, image: Arc<DynamicImage>) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let bounds = ctx.config.image_box();
        let quality = ctx.config.photo_jpeg_quality;
        let encoded = run_blocking(move || {
            let fitted = fit_image(&image, bounds);
            let dimensions = image_dimensions(&fitted);
            encode_jpeg(&fitted, quality).map(|data| (data, dimensions))
        })
        .await;

        let (data, dimensions) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        let mut upload = upload_events(
            ctx.collaborators.uploader.upload_image(ctx.peer_id, data, dimensions),
        );
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}

pub(super) fn still_image(ctx: Arc<TransformContext>, payload: DataPayload) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let bounds = ctx.config.image_box();
        let quality = ctx.config.data_image_jpeg_quality;
        let source = payload.data;
        let encoded = run_blocking(move || {
            let image = decode(&source)?;
            let fitted = fit_image(&image, bounds);
            let dimensions = image_dimensions(&fitted);
            encode_jpeg(&fitted, quality).map(|data| (data, dimensions))
        })
        .await;

        let (data, dimensions) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        let mut upload = upload_events(
            ctx.collaborators.uploader.upload_image(ctx.peer_id, data, dimensions),
        );
        while let Some(event) = upload.next().await {
            yield event;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::image::probe_dimensions;
    use crate::transform::test_support::*;
    use crate::transform::ItemTransform;

    #[tokio::test]
    async fn test_photo_is_fitted_and_reencoded() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let image = Arc::new(DynamicImage::ImageRgb8(RgbImage::new(2560, 1920)));

        let events = collect(ItemTransform::Photo(image).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));

        let requests = uploader.requests.lock().unwrap();
        match &requests[0] {
            Recorded::Image { data, dimensions } => {
                assert_eq!(*dimensions, PixelDimensions::new(1280, 960));
                assert_eq!(&data[..2], &[0xFF, 0xD8]);
                assert_eq!(probe_dimensions(data), Some(PixelDimensions::new(1280, 960)));
            }
            other => panic!("Expected image upload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_still_image_bytes_are_reencoded_as_jpeg() {
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(300, 200))
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();

        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context(uploader.clone());
        let payload = DataPayload {
            data: Bytes::from(png.into_inner()),
            file_name: Some("shot.png".to_string()),
            mime_type: Some("image/png".to_string()),
        };

        let events =
            collect(ItemTransform::StillImage(payload).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Ok(ItemEvent::Done(_)))));

        let requests = uploader.requests.lock().unwrap();
        assert!(matches!(
            &requests[0],
            Recorded::Image { dimensions, data } if *dimensions == PixelDimensions::new(300, 200) && data[..2] == [0xFF, 0xD8]
        ));
    }

    #[tokio::test]
    async fn test_undecodable_still_image_fails() {
        let ctx = context(Arc::new(RecordingUploader::default()));
        let payload = DataPayload {
            data: Bytes::from_static(b"\x89PNG\r\n\x1a\ntruncated"),
            file_name: None,
            mime_type: None,
        };
        let events =
            collect(ItemTransform::StillImage(payload).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events.last(), Some(Err(e)) if e.error_code() == "IMAGE_ENCODING_FAILED"));
    }
}
