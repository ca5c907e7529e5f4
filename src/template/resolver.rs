//! Multi-scope template parameter resolution.
//!
//! [`resolve`] scans a string for `%{scope.name}` tokens and substitutes each
//! against the scoped contexts at the given coordinate. The name part may
//! contain nested tokens; those resolve first, so
//! `%{dynamic.name-%{tmp.x}}` looks up the dynamic parameter whose name
//! depends on `tmp.x`. A body without a `.` reads the named iterator of an
//! enclosing `for` loop.
//!
//! Looked-up values are trimmed and then resolved again in case they contain
//! tokens themselves, bounded by [`MAX_RESOLUTION_DEPTH`].

use crate::context::{ContextInfo, ContextStore};
use crate::template::parameter::{self, MAX_RESOLUTION_DEPTH};
use imfconv_common::{Error, Result};
use std::collections::HashMap;

/// Call-local loop-iterator bindings.
///
/// `for` nodes bind their iterator here, not in the dynamic context, so the
/// binding is visible only to nested resolution within the loop body and each
/// iteration sees exactly one value.
#[derive(Debug, Clone, Default)]
pub struct Iterators {
    bindings: HashMap<String, i64>,
}

impl Iterators {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of these bindings with `name` bound to `value`.
    ///
    /// Rebinding an existing name shadows the outer binding for the copy's
    /// lifetime only.
    #[must_use]
    pub fn bind(&self, name: &str, value: i64) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.to_string(), value);
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.bindings.get(name).copied()
    }
}

/// Resolve every `%{...}` token in `raw` against the scoped contexts.
///
/// Text outside tokens passes through unchanged; a string without tokens
/// comes back as-is.
pub fn resolve(
    raw: &str,
    info: &ContextInfo,
    store: &ContextStore,
    iterators: &Iterators,
) -> Result<String> {
    resolve_depth(raw, info, store, iterators, 0)
}

/// Resolve a boolean expression.
///
/// The resolved text is trimmed and compared case-insensitively against
/// `"true"`; anything else is false.
pub fn resolve_bool(
    raw: &str,
    info: &ContextInfo,
    store: &ContextStore,
    iterators: &Iterators,
) -> Result<bool> {
    let value = resolve(raw, info, store, iterators)?;
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

fn resolve_depth(
    raw: &str,
    info: &ContextInfo,
    store: &ContextStore,
    iterators: &Iterators,
    depth: u32,
) -> Result<String> {
    if depth >= MAX_RESOLUTION_DEPTH {
        return Err(Error::TemplateDepthExceeded {
            parameter: raw.to_string(),
            limit: MAX_RESOLUTION_DEPTH,
        });
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(span) = parameter::next_token(rest)? {
        out.push_str(&rest[..span.start]);
        let token = &rest[span.start..span.end];
        let body = &token[2..token.len() - 1];
        let effective = resolve_depth(body, info, store, iterators, depth + 1)?;
        let value = lookup_token(token, effective.trim(), info, store, iterators)?;
        let value = resolve_depth(&value, info, store, iterators, depth + 1)?;
        out.push_str(&value);
        rest = &rest[span.end..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Look up one token whose body has already had nested tokens resolved.
fn lookup_token(
    token: &str,
    body: &str,
    info: &ContextInfo,
    store: &ContextStore,
    iterators: &Iterators,
) -> Result<String> {
    if body.is_empty() {
        return Err(Error::invalid_parameter(token, "empty parameter body"));
    }
    if !body.contains('.') {
        return iterators
            .get(body)
            .map(|v| v.to_string())
            .ok_or_else(|| Error::unknown_context(token, body));
    }
    let (scope, name) = parameter::split_scoped(token, body)?;
    let value = store.lookup(scope, &name, info)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::not_found(
            scope.as_str(),
            name,
            "parameter value is empty",
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn store_with_basics() -> ContextStore {
        let mut store = ContextStore::new();
        store.tool_mut().add("ffmpeg", "/usr/bin/ffmpeg");
        store.tmp_mut().add("x", "K");
        store.dynamic_mut().add("name-K", "V", false);
        store
    }

    #[test]
    fn test_passthrough_without_tokens() {
        let store = ContextStore::new();
        let out = resolve("-y -i input.mxf", &ContextInfo::empty(), &store, &Iterators::new())
            .unwrap();
        assert_eq!(out, "-y -i input.mxf");
    }

    #[test]
    fn test_simple_substitution() {
        let store = store_with_basics();
        let out = resolve(
            "%{tool.ffmpeg} -i in.mxf",
            &ContextInfo::empty(),
            &store,
            &Iterators::new(),
        )
        .unwrap();
        assert_eq!(out, "/usr/bin/ffmpeg -i in.mxf");
    }

    #[test]
    fn test_nested_placeholder() {
        let store = store_with_basics();
        let out = resolve(
            "%{dynamic.name-%{tmp.x}}",
            &ContextInfo::empty(),
            &store,
            &Iterators::new(),
        )
        .unwrap();
        assert_eq!(out, "V");
    }

    #[test]
    fn test_multiple_tokens_in_one_string() {
        let store = store_with_basics();
        let out = resolve(
            "%{tool.ffmpeg} -map %{tmp.x}:0",
            &ContextInfo::empty(),
            &store,
            &Iterators::new(),
        )
        .unwrap();
        assert_eq!(out, "/usr/bin/ffmpeg -map K:0");
    }

    #[test]
    fn test_value_containing_token_is_chased() {
        let mut store = ContextStore::new();
        store.tmp_mut().add("root", "/work");
        store.tool_mut().add("conv", "%{tmp.root}/bin/conv");
        let out = resolve(
            "%{tool.conv}",
            &ContextInfo::empty(),
            &store,
            &Iterators::new(),
        )
        .unwrap();
        assert_eq!(out, "/work/bin/conv");
    }

    #[test]
    fn test_looked_up_value_is_trimmed() {
        let mut store = ContextStore::new();
        store.tmp_mut().add("padded", "  spaced  ");
        let out = resolve(
            "[%{tmp.padded}]",
            &ContextInfo::empty(),
            &store,
            &Iterators::new(),
        )
        .unwrap();
        assert_eq!(out, "[spaced]");
    }

    #[test]
    fn test_empty_value_is_not_found() {
        let mut store = ContextStore::new();
        store.tmp_mut().add("blank", "   ");
        assert_matches!(
            resolve("%{tmp.blank}", &ContextInfo::empty(), &store, &Iterators::new()),
            Err(Error::TemplateParameterNotFound { .. })
        );
    }

    #[test]
    fn test_unknown_scope() {
        let store = store_with_basics();
        assert_matches!(
            resolve("%{bogus.x}", &ContextInfo::empty(), &store, &Iterators::new()),
            Err(Error::UnknownTemplateParameterContext { ref context, .. }) if context == "bogus"
        );
    }

    #[test]
    fn test_unknown_tool_name() {
        let store = store_with_basics();
        assert_matches!(
            resolve(
                "%{tool.doesNotExist}",
                &ContextInfo::empty(),
                &store,
                &Iterators::new()
            ),
            Err(Error::TemplateParameterNotFound { ref context, ref name, .. })
                if context == "tool" && name == "doesNotExist"
        );
    }

    #[test]
    fn test_iterator_reference() {
        let store = ContextStore::new();
        let iters = Iterators::new().bind("i", 3);
        let out = resolve("part-%{i}.mxf", &ContextInfo::empty(), &store, &iters).unwrap();
        assert_eq!(out, "part-3.mxf");
    }

    #[test]
    fn test_unbound_iterator() {
        let store = ContextStore::new();
        assert_matches!(
            resolve("%{i}", &ContextInfo::empty(), &store, &Iterators::new()),
            Err(Error::UnknownTemplateParameterContext { ref context, .. }) if context == "i"
        );
    }

    #[test]
    fn test_iterator_shadowing() {
        let outer = Iterators::new().bind("i", 1);
        let inner = outer.bind("i", 2);
        assert_eq!(outer.get("i"), Some(1));
        assert_eq!(inner.get("i"), Some(2));
    }

    #[test]
    fn test_self_referential_value_hits_depth_guard() {
        let mut store = ContextStore::new();
        store.tmp_mut().add("loop", "%{tmp.loop}");
        assert_matches!(
            resolve("%{tmp.loop}", &ContextInfo::empty(), &store, &Iterators::new()),
            Err(Error::TemplateDepthExceeded { limit, .. }) if limit == MAX_RESOLUTION_DEPTH
        );
    }

    #[test]
    fn test_unbalanced_token_is_invalid() {
        let store = ContextStore::new();
        assert_matches!(
            resolve("%{tool.ffmpeg", &ContextInfo::empty(), &store, &Iterators::new()),
            Err(Error::InvalidTemplateParameter { .. })
        );
    }

    #[test]
    fn test_resolve_bool() {
        let mut store = ContextStore::new();
        store.dynamic_mut().add("flag", "True", false);
        store.dynamic_mut().add("off", "no", false);
        let info = ContextInfo::empty();
        let iters = Iterators::new();
        assert!(resolve_bool("%{dynamic.flag}", &info, &store, &iters).unwrap());
        assert!(!resolve_bool("%{dynamic.off}", &info, &store, &iters).unwrap());
        assert!(resolve_bool(" true ", &info, &store, &iters).unwrap());
        assert!(!resolve_bool("", &info, &store, &iters).unwrap());
    }
}
