//! Composition timeline document.
//!
//! The timeline is produced by an upstream composition parser and handed to
//! this tool as JSON: segments in playback order, each carrying the virtual
//! tracks (sequences) active in that segment, each of those carrying its
//! essence resources. [`Timeline::populate`] registers every coordinate with
//! the hierarchical contexts, which seed the built-in `num` / `uuid` /
//! `type` parameters, and then adds the document's free-form parameters on
//! top. No schema validation happens here beyond well-typedness.

use crate::context::ContextStore;
use imfconv_common::{ResourceId, SegmentId, SequenceId, SequenceType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub segments: Vec<TimelineSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSegment {
    /// Generated when the document omits it.
    #[serde(default)]
    pub id: SegmentId,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    #[serde(default)]
    pub sequences: Vec<TimelineSequence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSequence {
    #[serde(default)]
    pub id: SequenceId,
    #[serde(rename = "type")]
    pub seq_type: SequenceType,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
    #[serde(default)]
    pub resources: Vec<TimelineResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResource {
    #[serde(default)]
    pub id: ResourceId,
    #[serde(default)]
    pub parameters: IndexMap<String, String>,
}

impl Timeline {
    /// Register every coordinate and parameter with the store.
    ///
    /// Walks segments in document order, so the `num` ordinals the contexts
    /// assign follow playback order. A sequence listed under several segments
    /// (a track spanning the timeline) registers once; its resources still
    /// land in the per-(segment, sequence) cell they belong to.
    pub fn populate(&self, store: &mut ContextStore) {
        for segment in &self.segments {
            store.segments_mut().init(segment.id);
            for (name, value) in &segment.parameters {
                store
                    .segments_mut()
                    .add_parameter(segment.id, name.as_str(), value.as_str());
            }
            for sequence in &segment.sequences {
                store.sequences_mut().init(sequence.seq_type, sequence.id);
                for (name, value) in &sequence.parameters {
                    store.sequences_mut().add_parameter(
                        sequence.seq_type,
                        sequence.id,
                        name.as_str(),
                        value.as_str(),
                    );
                }
                for resource in &sequence.resources {
                    store
                        .resources_mut()
                        .init(segment.id, sequence.id, resource.id);
                    for (name, value) in &resource.parameters {
                        store.resources_mut().add_parameter(
                            segment.id,
                            sequence.id,
                            resource.id,
                            name.as_str(),
                            value.as_str(),
                        );
                    }
                }
            }
        }
    }

    /// Total resource count across all cells.
    pub fn resource_count(&self) -> usize {
        self.segments
            .iter()
            .flat_map(|s| &s.sequences)
            .map(|q| q.resources.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextInfo;

    fn parse(json: &str) -> Timeline {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_populate_assigns_document_order_ordinals() {
        let timeline = parse(
            r#"{
              "name": "feature",
              "segments": [
                {"parameters": {"label": "reel-1"}, "sequences": [
                  {"type": "video", "resources": [
                    {"parameters": {"essence": "/in/v0.mxf"}},
                    {"parameters": {"essence": "/in/v1.mxf"}}
                  ]}
                ]},
                {"parameters": {"label": "reel-2"}, "sequences": [
                  {"type": "video", "resources": [{"parameters": {"essence": "/in/v2.mxf"}}]},
                  {"type": "audio", "resources": []}
                ]}
              ]
            }"#,
        );
        let mut store = ContextStore::new();
        timeline.populate(&mut store);

        let segments = store.segments().uuids();
        assert_eq!(segments.len(), 2);
        let first = ContextInfo {
            segment: Some(segments[0]),
            ..ContextInfo::empty()
        };
        let second = ContextInfo {
            segment: Some(segments[1]),
            ..ContextInfo::empty()
        };
        assert_eq!(store.segments().parameter("num", &first).unwrap(), "0");
        assert_eq!(
            store.segments().parameter("label", &first).unwrap(),
            "reel-1"
        );
        assert_eq!(store.segments().parameter("num", &second).unwrap(), "1");

        assert_eq!(store.sequences().uuids(SequenceType::Video).len(), 2);
        assert_eq!(store.sequences().uuids(SequenceType::Audio).len(), 1);
        assert_eq!(timeline.resource_count(), 3);
    }

    #[test]
    fn test_populate_seeds_uuid_from_document_id() {
        let seg = SegmentId::new();
        let timeline = Timeline {
            name: None,
            segments: vec![TimelineSegment {
                id: seg,
                parameters: IndexMap::new(),
                sequences: Vec::new(),
            }],
        };
        let mut store = ContextStore::new();
        timeline.populate(&mut store);
        let info = ContextInfo {
            segment: Some(seg),
            ..ContextInfo::empty()
        };
        assert_eq!(
            store.segments().parameter("uuid", &info).unwrap(),
            seg.to_string()
        );
    }

    #[test]
    fn test_missing_ids_are_generated() {
        let timeline = parse(
            r#"{"segments": [{"sequences": [{"type": "audio", "resources": [{}]}]}]}"#,
        );
        assert_eq!(timeline.segments.len(), 1);
        let mut store = ContextStore::new();
        timeline.populate(&mut store);
        assert_eq!(store.segments().uuids().len(), 1);
        assert_eq!(store.sequences().uuids(SequenceType::Audio).len(), 1);
    }

    #[test]
    fn test_track_spanning_segments_registers_once() {
        let track = SequenceId::new();
        let timeline = parse(&format!(
            r#"{{
              "segments": [
                {{"sequences": [{{"id": "{track}", "type": "video", "resources": [{{"parameters": {{"essence": "a.mxf"}}}}]}}]}},
                {{"sequences": [{{"id": "{track}", "type": "video", "resources": [{{"parameters": {{"essence": "b.mxf"}}}}]}}]}}
              ]
            }}"#
        ));
        let mut store = ContextStore::new();
        timeline.populate(&mut store);

        let videos = store.sequences().uuids(SequenceType::Video);
        assert_eq!(videos, vec![track]);

        let segments = store.segments().uuids();
        for (idx, segment) in segments.iter().enumerate() {
            let cell = store.resources().uuids(*segment, track);
            assert_eq!(cell.len(), 1, "segment {idx} should hold one resource");
            let info = ContextInfo {
                segment: Some(*segment),
                sequence: Some(track),
                resource: Some(cell[0]),
                ..ContextInfo::empty()
            };
            // Per-cell ordinals restart at zero in every segment.
            assert_eq!(store.resources().parameter("num", &info).unwrap(), "0");
        }
    }
}
