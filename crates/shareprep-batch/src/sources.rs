//! Payload loading from host-provided sources.

use futures::stream::{BoxStream, StreamExt};
use shareprep_core::{PayloadFields, PrepareError, RawPayload};

/// One shared item as delivered by the host. Only the first value is used.
pub type PayloadSource = BoxStream<'static, anyhow::Result<PayloadFields>>;

/// Read the first value of every source, in order.
///
/// Sources that end without a value contribute nothing. A failing source
/// fails the whole load, as does a field bag no payload kind accepts.
#[tracing::instrument(skip(sources), fields(sources = sources.len()))]
pub async fn load_payloads(sources: Vec<PayloadSource>) -> Result<Vec<RawPayload>, PrepareError> {
    let mut payloads = Vec::with_capacity(sources.len());

    for (index, mut source) in sources.into_iter().enumerate() {
        let fields = match source.next().await {
            Some(Ok(fields)) => fields,
            Some(Err(e)) => {
                tracing::warn!(item.index = index, error = %e, "Payload source failed");
                return Err(PrepareError::SourceFailed {
                    index,
                    message: format!("{:#}", e),
                });
            }
            None => {
                tracing::debug!(item.index = index, "Payload source was empty");
                continue;
            }
        };

        let payload = RawPayload::try_from(fields).map_err(|e| PrepareError::item(index, e))?;
        tracing::debug!(item.index = index, item.kind = payload.kind(), "Loaded payload");
        payloads.push(payload);
    }

    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn source(values: Vec<anyhow::Result<PayloadFields>>) -> PayloadSource {
        stream::iter(values).boxed()
    }

    fn text(value: &str) -> PayloadFields {
        PayloadFields {
            text: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_takes_first_value_in_order() {
        let payloads = load_payloads(vec![
            source(vec![Ok(text("one")), Ok(text("ignored"))]),
            source(vec![]),
            source(vec![Ok(text("two"))]),
        ])
        .await
        .unwrap();

        let texts: Vec<_> = payloads
            .into_iter()
            .map(|p| match p {
                RawPayload::Text(t) => t,
                other => panic!("Expected text, got {}", other.kind()),
            })
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_source_error_fails_load() {
        let err = load_payloads(vec![
            source(vec![Ok(text("one"))]),
            source(vec![Err(anyhow::anyhow!("attachment unavailable"))]),
        ])
        .await
        .unwrap_err();

        match err {
            PrepareError::SourceFailed { index, message } => {
                assert_eq!(index, 1);
                assert!(message.contains("attachment unavailable"));
            }
            other => panic!("Expected source failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fields_from_json() {
        let fields: PayloadFields =
            serde_json::from_str(r#"{"url":"https://example.com","text":"look"}"#).unwrap();
        let payloads = load_payloads(vec![source(vec![Ok(fields)])]).await.unwrap();
        assert!(matches!(&payloads[0], RawPayload::Text(t) if t == "look"));
    }

    #[tokio::test]
    async fn test_empty_field_bag_is_unrecognized() {
        let err = load_payloads(vec![source(vec![Ok(PayloadFields::default())])])
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), PrepareError::UnrecognizedPayload(_)));
        assert!(matches!(err, PrepareError::ItemFailed { index: 0, .. }));
    }
}
