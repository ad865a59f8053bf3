//! Transform selection.
//!
//! `RawPayload` already fixes the coarse kind of an item. What remains is
//! content sniffing inside the ambiguous kinds: opaque bytes may be a GIF, a
//! still image or any other file, a URL may be a location link, and contact
//! bytes must parse as a vCard. The checks run in a fixed order because a
//! payload can satisfy more than one of them.

use std::sync::Arc;

use shareprep_core::{DataPayload, PrepareError, RawPayload};

use crate::contact::parse_vcard;
use crate::gif::is_gif;
use crate::image::probe_dimensions;
use crate::traits::LocationResolver;
use crate::transform::ItemTransform;

pub struct TransformRegistry {
    location_resolver: Arc<dyn LocationResolver>,
}

impl TransformRegistry {
    pub fn new(location_resolver: Arc<dyn LocationResolver>) -> Self {
        Self { location_resolver }
    }

    pub fn select(&self, payload: RawPayload) -> Result<ItemTransform, PrepareError> {
        let transform = match payload {
            RawPayload::ScaledImage { data, dimensions } => {
                ItemTransform::ScaledImage { data, dimensions }
            }
            RawPayload::Image(image) => ItemTransform::Photo(image),
            RawPayload::Video(video) => ItemTransform::Video(video),
            RawPayload::Data(data) => select_data(data),
            RawPayload::Audio(audio) => ItemTransform::Audio(audio),
            RawPayload::Text(text) => ItemTransform::Text(text),
            RawPayload::Url(url) => {
                if self.location_resolver.is_location_url(&url) {
                    ItemTransform::Location(url)
                } else {
                    ItemTransform::Text(url)
                }
            }
            RawPayload::Contact(vcard) => match parse_vcard(&vcard) {
                Some(contact) => ItemTransform::Contact(contact),
                None => {
                    return Err(PrepareError::UnrecognizedPayload(
                        "contact is not a readable vCard".to_string(),
                    ))
                }
            },
        };

        tracing::debug!(item.kind = transform.kind(), "Selected transform");
        Ok(transform)
    }
}

/// GIF when the signature matches and the header is readable, then any other
/// readable image, then a plain file.
fn select_data(payload: DataPayload) -> ItemTransform {
    match probe_dimensions(&payload.data) {
        Some(dimensions) if is_gif(&payload.data) => ItemTransform::Gif {
            payload,
            dimensions,
        },
        Some(_) => ItemTransform::StillImage(payload),
        None => ItemTransform::File(payload),
    }
}
