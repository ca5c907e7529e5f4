//! Typed ID wrappers for the composition hierarchy.
//!
//! Newtype wrappers around UUIDs prevent mixing segment, sequence, and
//! resource identifiers. Ordering across a run is defined by first-seen
//! registration in the scoped contexts, never by the UUID values themselves.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a segment of the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(Uuid);

impl SegmentId {
    /// Generate a new random segment ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SegmentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<SegmentId> for Uuid {
    fn from(id: SegmentId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a sequence (virtual track).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(Uuid);

impl SequenceId {
    /// Generate a new random sequence ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SequenceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<SequenceId> for Uuid {
    fn from(id: SequenceId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SequenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an essence resource within one (segment, sequence)
/// cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generate a new random resource ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ResourceId> for Uuid {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a virtual track.
///
/// A closed set: every sequence in a composition is one of these, and the
/// sequence-iterator node selects sequences by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    Video,
    Audio,
    Subtitle,
}

impl SequenceType {
    /// The lowercase token used in templates and descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceType::Video => "video",
            SequenceType::Audio => "audio",
            SequenceType::Subtitle => "subtitle",
        }
    }
}

impl std::fmt::Display for SequenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SequenceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" => Ok(SequenceType::Video),
            "audio" => Ok(SequenceType::Audio),
            "subtitle" => Ok(SequenceType::Subtitle),
            other => Err(format!("unknown sequence type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_id_creation() {
        let id1 = SegmentId::new();
        let id2 = SegmentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_segment_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let seg_id = SegmentId::from(uuid);
        let uuid_back: Uuid = seg_id.into();
        assert_eq!(uuid, uuid_back);
    }

    #[test]
    fn test_sequence_id_serialization() {
        let id = SequenceId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: SequenceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_resource_id_display() {
        let id = ResourceId::new();
        let display = format!("{}", id);
        assert!(!display.is_empty());
    }

    #[test]
    fn test_different_id_types() {
        let uuid = Uuid::new_v4();
        let _seg = SegmentId::from(uuid);
        let _seq = SequenceId::from(uuid);
        // Type system prevents mixing these at compile time
    }

    #[test]
    fn test_sequence_type_roundtrip() {
        for ty in [
            SequenceType::Video,
            SequenceType::Audio,
            SequenceType::Subtitle,
        ] {
            let parsed: SequenceType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_sequence_type_serde_lowercase() {
        let json = serde_json::to_string(&SequenceType::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        let back: SequenceType = serde_json::from_str("\"subtitle\"").unwrap();
        assert_eq!(back, SequenceType::Subtitle);
    }

    #[test]
    fn test_sequence_type_unknown() {
        assert!("timedtext".parse::<SequenceType>().is_err());
    }
}
