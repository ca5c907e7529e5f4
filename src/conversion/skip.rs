//! Skip decision for one concrete invocation.

use crate::context::{ContextInfo, ContextStore};
use crate::template::{resolve_bool, Iterators};
use imfconv_common::Result;

/// Decide whether an operation should be skipped at this coordinate.
///
/// True when any enclosing node's skip expression resolves true, or the
/// operation's own does. Enclosing expressions are checked outermost first
/// and are never overridden further down.
///
/// This must be called fresh for every concrete invocation. Expressions read
/// the dynamic context, and an earlier sibling may have just written the
/// value an expression depends on.
pub fn should_skip(
    own: Option<&str>,
    ancestors: &[&str],
    info: &ContextInfo,
    store: &ContextStore,
    iterators: &Iterators,
) -> Result<bool> {
    for expr in ancestors {
        if resolve_bool(expr, info, store, iterators)? {
            return Ok(true);
        }
    }
    match own {
        Some(expr) => resolve_bool(expr, info, store, iterators),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_expressions_means_run() {
        let store = ContextStore::new();
        let skip = should_skip(None, &[], &ContextInfo::empty(), &store, &Iterators::new()).unwrap();
        assert!(!skip);
    }

    #[test]
    fn test_own_expression() {
        let mut store = ContextStore::new();
        store.dynamic_mut().add("off", "true", false);
        let info = ContextInfo::empty();
        let iters = Iterators::new();
        assert!(should_skip(Some("%{dynamic.off}"), &[], &info, &store, &iters).unwrap());
        assert!(!should_skip(Some("false"), &[], &info, &store, &iters).unwrap());
    }

    #[test]
    fn test_ancestor_wins_over_own() {
        let store = ContextStore::new();
        let info = ContextInfo::empty();
        let iters = Iterators::new();
        assert!(should_skip(Some("false"), &["true"], &info, &store, &iters).unwrap());
    }

    #[test]
    fn test_recomputed_against_current_dynamic_state() {
        let mut store = ContextStore::new();
        store.dynamic_mut().add("done", "false", false);
        let info = ContextInfo::empty();
        let iters = Iterators::new();
        assert!(!should_skip(Some("%{dynamic.done}"), &[], &info, &store, &iters).unwrap());
        store.dynamic_mut().add("done", "true", false);
        assert!(should_skip(Some("%{dynamic.done}"), &[], &info, &store, &iters).unwrap());
    }

    #[test]
    fn test_resolution_error_propagates() {
        let store = ContextStore::new();
        let result = should_skip(
            Some("%{dynamic.neverSet}"),
            &[],
            &ContextInfo::empty(),
            &store,
            &Iterators::new(),
        );
        assert!(result.is_err());
    }
}
