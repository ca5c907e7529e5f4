//! Iteration coordinate for scoped parameter lookups.

use imfconv_common::{ResourceId, SegmentId, SequenceId, SequenceType};

/// An iteration coordinate.
///
/// Identifies which row of the hierarchical contexts a parameter lookup
/// resolves against. The executor builds narrowed copies as it descends into
/// segment, sequence, and resource iterations; nodes outside any iteration see
/// the empty coordinate.
///
/// This is a plain value: two coordinates are equal when all four fields
/// match. Build variants with struct-update syntax:
///
/// ```
/// use imfconv::context::ContextInfo;
/// use imfconv_common::SegmentId;
///
/// let root = ContextInfo::default();
/// let seg = SegmentId::new();
/// let scoped = ContextInfo { segment: Some(seg), ..root };
/// assert_eq!(scoped.segment, Some(seg));
/// assert_eq!(scoped.sequence, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextInfo {
    /// Segment the lookup applies to, if iterating segments.
    pub segment: Option<SegmentId>,
    /// Sequence the lookup applies to, if iterating sequences.
    pub sequence: Option<SequenceId>,
    /// Type of the bound sequence. Always present when `sequence` is.
    pub sequence_type: Option<SequenceType>,
    /// Resource the lookup applies to, if iterating resources.
    pub resource: Option<ResourceId>,
}

impl ContextInfo {
    /// The empty coordinate, used outside any iteration.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for ContextInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut wrote = false;
        if let Some(seg) = self.segment {
            write!(f, "segment={seg}")?;
            wrote = true;
        }
        if let Some(seq) = self.sequence {
            if wrote {
                f.write_str(" ")?;
            }
            write!(f, "seq={seq}")?;
            if let Some(ty) = self.sequence_type {
                write!(f, " type={ty}")?;
            }
            wrote = true;
        }
        if let Some(res) = self.resource {
            if wrote {
                f.write_str(" ")?;
            }
            write!(f, "resource={res}")?;
            wrote = true;
        }
        if !wrote {
            f.write_str("(root)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_coordinates() {
        let seg = SegmentId::new();
        let a = ContextInfo {
            segment: Some(seg),
            ..ContextInfo::empty()
        };
        let b = ContextInfo {
            segment: Some(seg),
            ..ContextInfo::empty()
        };
        assert_eq!(a, b);
        assert_ne!(a, ContextInfo::empty());
    }

    #[test]
    fn test_display_root() {
        assert_eq!(ContextInfo::empty().to_string(), "(root)");
    }

    #[test]
    fn test_display_with_coordinates() {
        let seg = SegmentId::new();
        let info = ContextInfo {
            segment: Some(seg),
            ..ContextInfo::empty()
        };
        assert_eq!(info.to_string(), format!("segment={seg}"));
    }
}
