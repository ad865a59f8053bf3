use std::sync::Arc;

use futures::StreamExt;
use shareprep_core::{
    ItemEvent, LocationResolution, MediaReference, PreparedContent, StandaloneMedia,
};

use super::{ItemStream, TransformContext};

/// Resolve a location link to map media. Anything short of a resolved place
/// sends the link as text.
pub(super) fn location(ctx: Arc<TransformContext>, url: String) -> ItemStream {
    Box::pin(async_stream::stream! {
        yield Ok(ItemEvent::Preparing);

        let mut resolutions = ctx.collaborators.location_resolver.resolve(&url);
        let content = match resolutions.next().await {
            Some(Ok(LocationResolution::Place(place))) => PreparedContent::Media(
                MediaReference::Standalone(StandaloneMedia::Map(place.into())),
            ),
            Some(Ok(LocationResolution::RawText(text))) => PreparedContent::Text(text),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Location resolution failed, sending link as text");
                PreparedContent::Text(url.clone())
            }
            None => {
                tracing::warn!("Location resolver returned nothing, sending link as text");
                PreparedContent::Text(url.clone())
            }
        };
        drop(resolutions);

        yield Ok(ItemEvent::Done(content));
    })
}

#[cfg(test)]
mod tests {
    use shareprep_core::MapMedia;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::traits::{LocationResolver, LocationStream};
    use crate::transform::test_support::*;
    use crate::transform::ItemTransform;

    struct FailingResolver;

    impl LocationResolver for FailingResolver {
        fn is_location_url(&self, _url: &str) -> bool {
            true
        }

        fn resolve(&self, _url: &str) -> LocationStream {
            futures::stream::iter(vec![Err(anyhow::anyhow!("geocoder offline"))]).boxed()
        }
    }

    struct TextResolver;

    impl LocationResolver for TextResolver {
        fn is_location_url(&self, _url: &str) -> bool {
            true
        }

        fn resolve(&self, _url: &str) -> LocationStream {
            futures::stream::iter(vec![Ok(LocationResolution::RawText(
                "Meet at the fountain".to_string(),
            ))])
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_place_becomes_map_media_with_venue() {
        let ctx = context(Arc::new(RecordingUploader::default()));
        let url = "https://maps.apple.com/?ll=52.5219,13.4132&q=Alexanderplatz".to_string();

        let events = collect(ItemTransform::Location(url).run(ctx, CancellationToken::new())).await;
        assert!(matches!(events[0], Ok(ItemEvent::Preparing)));
        match &events[1] {
            Ok(ItemEvent::Done(PreparedContent::Media(MediaReference::Standalone(
                StandaloneMedia::Map(MapMedia { latitude, longitude, venue }),
            )))) => {
                assert_eq!((*latitude, *longitude), (52.5219, 13.4132));
                assert_eq!(venue.as_ref().map(|v| v.title.as_str()), Some("Alexanderplatz"));
            }
            other => panic!("Expected map media, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolver_error_falls_back_to_text() {
        let ctx = context_with(Arc::new(RecordingUploader::default()), |c| {
            c.with_location_resolver(Arc::new(FailingResolver))
        });
        let url = "https://maps.example.com/somewhere".to_string();

        let events =
            collect(ItemTransform::Location(url.clone()).run(ctx, CancellationToken::new())).await;
        assert!(matches!(
            events.last(),
            Some(Ok(ItemEvent::Done(PreparedContent::Text(t)))) if *t == url
        ));
    }

    #[tokio::test]
    async fn test_unresolved_link_sends_resolver_text() {
        let uploader = Arc::new(RecordingUploader::default());
        let ctx = context_with(uploader.clone(), |c| c.with_location_resolver(Arc::new(TextResolver)));

        let events = collect(
            ItemTransform::Location("https://maps.example.com/fountain".to_string())
                .run(ctx, CancellationToken::new()),
        )
        .await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(ItemEvent::Preparing)));
        assert!(matches!(
            &events[1],
            Ok(ItemEvent::Done(PreparedContent::Text(t))) if t == "Meet at the fountain"
        ));
        assert!(uploader.requests.lock().unwrap().is_empty());
    }
}
