//! Scoped parameter contexts.
//!
//! Six stores back template resolution:
//!
//! - `tool` and `tmp` are static maps loaded from configuration
//! - `dynamic` is a flat map written by executed nodes as the run progresses
//! - `segment`, `seq`, and `resource` are hierarchical maps keyed by timeline
//!   coordinates, populated during timeline ingestion
//!
//! [`ContextStore`] aggregates all six and routes scoped lookups; the
//! resolver in [`crate::template`] consults it for every `%{scope.name}`
//! token.

mod dynamic;
mod hierarchy;
mod info;
mod simple;

pub use dynamic::{DynamicContext, DynamicValue};
pub use hierarchy::{ResourceContext, SegmentContext, SequenceContext};
pub use info::ContextInfo;
pub use simple::StaticContext;

use crate::template::{resolve, Iterators, Scope};
use imfconv_common::Result;

/// All six scoped contexts for one run.
#[derive(Debug, Clone)]
pub struct ContextStore {
    tool: StaticContext,
    tmp: StaticContext,
    dynamic: DynamicContext,
    segments: SegmentContext,
    sequences: SequenceContext,
    resources: ResourceContext,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            tool: StaticContext::new("tool"),
            tmp: StaticContext::new("tmp"),
            dynamic: DynamicContext::new(),
            segments: SegmentContext::new(),
            sequences: SequenceContext::new(),
            resources: ResourceContext::new(),
        }
    }

    pub fn tool(&self) -> &StaticContext {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut StaticContext {
        &mut self.tool
    }

    pub fn tmp(&self) -> &StaticContext {
        &self.tmp
    }

    pub fn tmp_mut(&mut self) -> &mut StaticContext {
        &mut self.tmp
    }

    pub fn dynamic(&self) -> &DynamicContext {
        &self.dynamic
    }

    pub fn dynamic_mut(&mut self) -> &mut DynamicContext {
        &mut self.dynamic
    }

    pub fn segments(&self) -> &SegmentContext {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut SegmentContext {
        &mut self.segments
    }

    pub fn sequences(&self) -> &SequenceContext {
        &self.sequences
    }

    pub fn sequences_mut(&mut self) -> &mut SequenceContext {
        &mut self.sequences
    }

    pub fn resources(&self) -> &ResourceContext {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceContext {
        &mut self.resources
    }

    /// Route a scoped lookup to the owning store.
    pub fn lookup(&self, scope: Scope, name: &str, info: &ContextInfo) -> Result<&str> {
        match scope {
            Scope::Tool => self.tool.get(name),
            Scope::Tmp => self.tmp.get(name),
            Scope::Dynamic => self.dynamic.get(name),
            Scope::Segment => self.segments.parameter(name, info),
            Scope::Sequence => self.sequences.parameter(name, info),
            Scope::Resource => self.resources.parameter(name, info),
        }
    }

    /// Resolve `name` and `value`, then set the dynamic parameter.
    ///
    /// Resolution happens at write time against the current coordinate, so
    /// the stored value never contains residual placeholders.
    pub fn add_dynamic_parameter(
        &mut self,
        name: &str,
        value: &str,
        delete_on_exit: bool,
        info: &ContextInfo,
        iterators: &Iterators,
    ) -> Result<()> {
        let name = resolve(name, info, self, iterators)?;
        let value = resolve(value, info, self, iterators)?;
        self.dynamic.add(name, value, delete_on_exit);
        Ok(())
    }

    /// Resolve `name` and `value`, then concatenate onto the dynamic
    /// parameter, creating it on first use.
    pub fn append_dynamic_parameter(
        &mut self,
        name: &str,
        value: &str,
        delete_on_exit: bool,
        info: &ContextInfo,
        iterators: &Iterators,
    ) -> Result<()> {
        let name = resolve(name, info, self, iterators)?;
        let value = resolve(value, info, self, iterators)?;
        self.dynamic.append(name, &value, delete_on_exit);
        Ok(())
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imfconv_common::{Error, SegmentId};

    #[test]
    fn test_lookup_routing() {
        let mut store = ContextStore::new();
        store.tool_mut().add("ffmpeg", "/usr/bin/ffmpeg");
        store.tmp_mut().add("scratch", "/tmp/conv");
        store.dynamic_mut().add("out", "/work/out.mxf", false);
        let info = ContextInfo::empty();
        assert_eq!(
            store.lookup(Scope::Tool, "ffmpeg", &info).unwrap(),
            "/usr/bin/ffmpeg"
        );
        assert_eq!(
            store.lookup(Scope::Tmp, "scratch", &info).unwrap(),
            "/tmp/conv"
        );
        assert_eq!(
            store.lookup(Scope::Dynamic, "out", &info).unwrap(),
            "/work/out.mxf"
        );
    }

    #[test]
    fn test_add_dynamic_parameter_resolves_at_write_time() {
        let mut store = ContextStore::new();
        store.tmp_mut().add("x", "K");
        store
            .add_dynamic_parameter(
                "name-%{tmp.x}",
                "value-%{tmp.x}",
                false,
                &ContextInfo::empty(),
                &Iterators::new(),
            )
            .unwrap();
        assert_eq!(store.dynamic().get("name-K").unwrap(), "value-K");
    }

    #[test]
    fn test_append_dynamic_parameter() {
        let mut store = ContextStore::new();
        let info = ContextInfo::empty();
        let iters = Iterators::new();
        store
            .append_dynamic_parameter("p", "a", false, &info, &iters)
            .unwrap();
        store
            .append_dynamic_parameter("p", "b", false, &info, &iters)
            .unwrap();
        assert_eq!(store.dynamic().get("p").unwrap(), "ab");
    }

    #[test]
    fn test_segment_lookup_through_store() {
        let mut store = ContextStore::new();
        let seg = SegmentId::new();
        store.segments_mut().add_parameter(seg, "essence", "/seg0.mxf");
        let info = ContextInfo {
            segment: Some(seg),
            ..ContextInfo::empty()
        };
        assert_eq!(
            store.lookup(Scope::Segment, "essence", &info).unwrap(),
            "/seg0.mxf"
        );
        assert!(matches!(
            store.lookup(Scope::Segment, "essence", &ContextInfo::empty()),
            Err(Error::TemplateParameterNotFound { .. })
        ));
    }
}
