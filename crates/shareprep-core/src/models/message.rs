use serde::{Deserialize, Serialize};

use super::content::{MediaReference, PreparedContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub i64);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageId {
    pub peer_id: PeerId,
    pub id: i32,
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.peer_id, self.id)
    }
}

/// A message ready to be enqueued. Prepared text becomes the message text,
/// prepared media becomes an attachment with empty text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub media: Option<MediaReference>,
}

impl From<PreparedContent> for OutgoingMessage {
    fn from(content: PreparedContent) -> Self {
        match content {
            PreparedContent::Text(text) => OutgoingMessage { text, media: None },
            PreparedContent::Media(media) => OutgoingMessage {
                text: String::new(),
                media: Some(media),
            },
        }
    }
}

/// Delivery status of one enqueued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageState {
    pub id: MessageId,
    pub unsent: bool,
}
