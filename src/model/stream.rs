use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a stream. The engine stores identifiers only;
/// stream metadata lives in an external registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self { Self(id) }
}
