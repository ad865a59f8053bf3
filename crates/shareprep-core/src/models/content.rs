//! Lifecycle events and the content they resolve to.

use bytes::Bytes;
use serde::Serialize;

/// Opaque token identifying media already accepted by the upload subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UploadedMediaHandle(String);

impl UploadedMediaHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UploadedMediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapVenue {
    pub title: String,
    pub address: Option<String>,
    pub provider: Option<String>,
    pub venue_id: Option<String>,
    pub venue_type: Option<String>,
}

/// A map pin, optionally labelled as a venue. Sent without an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMedia {
    pub latitude: f64,
    pub longitude: f64,
    pub venue: Option<MapVenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StandaloneMedia {
    Map(MapMedia),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MediaReference {
    Uploaded(UploadedMediaHandle),
    Standalone(StandaloneMedia),
}

/// Final, sendable form of a share item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PreparedContent {
    Text(String),
    Media(MediaReference),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactPhone {
    pub label: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactData {
    pub formatted_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub organization: Option<String>,
    pub phone_numbers: Vec<ContactPhone>,
    pub emails: Vec<String>,
    pub urls: Vec<String>,
    pub birthday: Option<String>,
    /// The vCard as received, kept so the user can forward it unchanged.
    #[serde(skip)]
    pub vcard: Bytes,
}

impl ContactData {
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => self
                .formatted_name
                .clone()
                .or_else(|| self.organization.clone())
                .unwrap_or_default(),
        }
    }
}

/// Content that cannot be sent until the user makes a choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UnpreparedContent {
    Contact(ContactData),
}

/// A resolved location produced by the map-link resolver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub title: Option<String>,
    pub address: Option<String>,
    pub provider: Option<String>,
    pub venue_id: Option<String>,
    pub venue_type: Option<String>,
}

impl From<Place> for MapMedia {
    fn from(place: Place) -> Self {
        let venue = place.title.map(|title| MapVenue {
            title,
            address: place.address,
            provider: place.provider,
            venue_id: place.venue_id,
            venue_type: place.venue_type,
        });
        MapMedia {
            latitude: place.latitude,
            longitude: place.longitude,
            venue,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationResolution {
    Place(Place),
    RawText(String),
}

/// One step in the life of a single share item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    Preparing,
    Progress(f32),
    InteractionRequired(UnpreparedContent),
    Done(PreparedContent),
}

impl ItemEvent {
    /// `Done` and `InteractionRequired` end an item stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemEvent::Done(_) | ItemEvent::InteractionRequired(_))
    }
}

/// Combined state of a whole share batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum BatchState {
    Preparing,
    Progress(f32),
    InteractionRequired(Vec<UnpreparedContent>),
    Done(Vec<PreparedContent>),
}

impl BatchState {
    pub fn is_done(&self) -> bool {
        matches!(self, BatchState::Done(_))
    }
}
