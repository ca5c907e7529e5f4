//! Hierarchical contexts keyed by timeline coordinates.
//!
//! Segments are globally ordered, sequences are ordered per sequence type,
//! and resources are ordered per (segment, sequence) cell. Registration is
//! idempotent: re-registering a known id neither duplicates nor reorders it.
//! Registering seeds the built-in parameters `num` (zero-based ordinal) and
//! `uuid` (`type` as well for sequences).

use crate::context::ContextInfo;
use imfconv_common::{Error, ResourceId, Result, SegmentId, SequenceId, SequenceType};
use indexmap::IndexMap;

type Params = IndexMap<String, String>;

fn get_param<'a>(params: &'a Params, scope: &'static str, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::unknown_name(scope, name))
}

/// Per-segment parameters in first-seen segment order.
#[derive(Debug, Clone, Default)]
pub struct SegmentContext {
    segments: IndexMap<SegmentId, Params>,
}

impl SegmentContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn params_mut(&mut self, id: SegmentId) -> &mut Params {
        let next = self.segments.len();
        self.segments.entry(id).or_insert_with(|| {
            let mut params = Params::new();
            params.insert("num".to_string(), next.to_string());
            params.insert("uuid".to_string(), id.to_string());
            params
        })
    }

    /// Register a segment, assigning the next ordinal if unseen.
    pub fn init(&mut self, id: SegmentId) {
        let _ = self.params_mut(id);
    }

    /// Set a per-segment parameter, registering the segment if needed.
    pub fn add_parameter(&mut self, id: SegmentId, name: impl Into<String>, value: impl Into<String>) {
        self.params_mut(id).insert(name.into(), value.into());
    }

    /// All segment ids in first-seen order.
    pub fn uuids(&self) -> Vec<SegmentId> {
        self.segments.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Look up a parameter at the coordinate's segment.
    pub fn parameter(&self, name: &str, info: &ContextInfo) -> Result<&str> {
        let id = info
            .segment
            .ok_or_else(|| Error::not_found("segment", name, "no segment in scope"))?;
        let params = self
            .segments
            .get(&id)
            .ok_or_else(|| Error::not_found("segment", name, format!("unknown segment {id}")))?;
        get_param(params, "segment", name)
    }
}

/// Per-sequence parameters, grouped and ordered by sequence type.
#[derive(Debug, Clone, Default)]
pub struct SequenceContext {
    by_type: IndexMap<SequenceType, IndexMap<SequenceId, Params>>,
}

impl SequenceContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn params_mut(&mut self, ty: SequenceType, id: SequenceId) -> &mut Params {
        let of_type = self.by_type.entry(ty).or_default();
        let next = of_type.len();
        of_type.entry(id).or_insert_with(|| {
            let mut params = Params::new();
            params.insert("num".to_string(), next.to_string());
            params.insert("uuid".to_string(), id.to_string());
            params.insert("type".to_string(), ty.as_str().to_string());
            params
        })
    }

    /// Register a sequence of the given type, assigning the next per-type
    /// ordinal if unseen.
    pub fn init(&mut self, ty: SequenceType, id: SequenceId) {
        let _ = self.params_mut(ty, id);
    }

    /// Set a per-sequence parameter, registering the sequence if needed.
    pub fn add_parameter(
        &mut self,
        ty: SequenceType,
        id: SequenceId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.params_mut(ty, id).insert(name.into(), value.into());
    }

    /// All sequence ids of one type in first-seen order.
    pub fn uuids(&self, ty: SequenceType) -> Vec<SequenceId> {
        self.by_type
            .get(&ty)
            .map(|of_type| of_type.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of sequences across all types.
    pub fn len(&self) -> usize {
        self.by_type.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a parameter at the coordinate's sequence.
    pub fn parameter(&self, name: &str, info: &ContextInfo) -> Result<&str> {
        let ty = info
            .sequence_type
            .ok_or_else(|| Error::not_found("seq", name, "no sequence type in scope"))?;
        let id = info
            .sequence
            .ok_or_else(|| Error::not_found("seq", name, "no sequence in scope"))?;
        let params = self
            .by_type
            .get(&ty)
            .and_then(|of_type| of_type.get(&id))
            .ok_or_else(|| Error::not_found("seq", name, format!("unknown {ty} sequence {id}")))?;
        get_param(params, "seq", name)
    }
}

/// Per-resource parameters, grouped and ordered per (segment, sequence) cell.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext {
    by_cell: IndexMap<(SegmentId, SequenceId), IndexMap<ResourceId, Params>>,
}

impl ResourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn params_mut(&mut self, segment: SegmentId, sequence: SequenceId, id: ResourceId) -> &mut Params {
        let cell = self.by_cell.entry((segment, sequence)).or_default();
        let next = cell.len();
        cell.entry(id).or_insert_with(|| {
            let mut params = Params::new();
            params.insert("num".to_string(), next.to_string());
            params.insert("uuid".to_string(), id.to_string());
            params
        })
    }

    /// Register a resource in its cell, assigning the next per-cell ordinal
    /// if unseen.
    pub fn init(&mut self, segment: SegmentId, sequence: SequenceId, id: ResourceId) {
        let _ = self.params_mut(segment, sequence, id);
    }

    /// Set a per-resource parameter, registering the resource if needed.
    pub fn add_parameter(
        &mut self,
        segment: SegmentId,
        sequence: SequenceId,
        id: ResourceId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.params_mut(segment, sequence, id)
            .insert(name.into(), value.into());
    }

    /// All resource ids of one (segment, sequence) cell in first-seen order.
    pub fn uuids(&self, segment: SegmentId, sequence: SequenceId) -> Vec<ResourceId> {
        self.by_cell
            .get(&(segment, sequence))
            .map(|cell| cell.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Look up a parameter at the coordinate's resource.
    pub fn parameter(&self, name: &str, info: &ContextInfo) -> Result<&str> {
        let segment = info
            .segment
            .ok_or_else(|| Error::not_found("resource", name, "no segment in scope"))?;
        let sequence = info
            .sequence
            .ok_or_else(|| Error::not_found("resource", name, "no sequence in scope"))?;
        let id = info
            .resource
            .ok_or_else(|| Error::not_found("resource", name, "no resource in scope"))?;
        let params = self
            .by_cell
            .get(&(segment, sequence))
            .and_then(|cell| cell.get(&id))
            .ok_or_else(|| Error::not_found("resource", name, format!("unknown resource {id}")))?;
        get_param(params, "resource", name)
    }
}
