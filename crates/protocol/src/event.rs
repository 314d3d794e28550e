//! Versioned event envelope
//!
//! Every record on the activity topic is an `Event`: a typed, versioned
//! envelope around an opaque data payload. The envelope lets consumers
//! reject records they do not understand before decoding the payload.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::{Bytes, Result};

/// Event type published by the activity publisher
pub const NETWORK_ACTIVITY_EVENT_TYPE: EventType = EventType {
    name: Cow::Borrowed("NetworkActivity"),
    major_version: 1,
};

/// Mimetype of the activity payload
pub const NETWORK_ACTIVITY_MIMETYPE: Mimetype = Mimetype::ApplicationBincode;

/// Name and major version of an event schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub name: Cow<'static, str>,
    pub major_version: u32,
}

impl EventType {
    /// Check if two event types describe the same schema
    ///
    /// Names are compared case-sensitively; only the major version matters.
    #[inline]
    pub fn matches(&self, other: &EventType) -> bool {
        self.name == other.name && self.major_version == other.major_version
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.name, self.major_version)
    }
}

/// Encoding of the event data payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mimetype {
    /// Opaque bytes
    ApplicationOctetStream,
    /// UTF-8 JSON
    ApplicationJson,
    /// bincode-encoded serde value
    ApplicationBincode,
}

impl Mimetype {
    /// Get the MIME string for this type
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationOctetStream => "application/octet-stream",
            Self::ApplicationJson => "application/json",
            Self::ApplicationBincode => "application/bincode",
        }
    }
}

impl std::fmt::Display for Mimetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope for a single record on an event bus topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Schema of the data payload
    pub event_type: EventType,

    /// Encoding of the data payload
    pub mimetype: Mimetype,

    /// Free-form tags for querying
    pub metadata: BTreeMap<String, String>,

    /// When the envelope was created
    pub created: DateTime<Utc>,

    /// Encoded payload
    pub data: Vec<u8>,
}

impl Event {
    /// Create an envelope stamped with the current time
    pub fn new(event_type: EventType, mimetype: Mimetype, data: Vec<u8>) -> Self {
        Self {
            event_type,
            mimetype,
            metadata: BTreeMap::new(),
            created: Utc::now(),
            data,
        }
    }

    /// Serialize the envelope to wire bytes
    pub fn encode(&self) -> Result<Bytes> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(ProtocolError::encode)
    }

    /// Parse an envelope from wire bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(ProtocolError::decode)
    }
}
