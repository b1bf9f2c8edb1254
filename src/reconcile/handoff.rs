//! One-shot payloads carried from an earlier workflow step into the first
//! create of a record, e.g. photos picked while searching for a hotel before
//! the lodging activity exists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub caption: Option<String>,
}

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateHandoff {
    /// External identifier of the selection (e.g. a hotel search result id).
    pub source_ref: String,
    pub media: Vec<MediaRef>,
}

impl CreateHandoff {
    pub fn new(source_ref: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            media: Vec::new(),
        }
    }

    pub fn with_media(mut self, media: impl IntoIterator<Item = MediaRef>) -> Self {
        self.media.extend(media);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}
