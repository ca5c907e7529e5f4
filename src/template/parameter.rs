//! Template parameter tokens and the `%{scope.name}` grammar.
//!
//! A template parameter is written `%{scope.name}`. The name part may itself
//! contain nested `%{...}` tokens; those are resolved first to compute the
//! effective lookup key (see [`crate::template::resolver`]). A body without a
//! `.` refers to the named iterator of an enclosing `for` loop.

use imfconv_common::{Error, Result};

/// Maximum recursion depth for nested placeholder resolution.
///
/// A self-referential dynamic parameter would otherwise loop forever.
pub const MAX_RESOLUTION_DEPTH: u32 = 64;

/// The scope selector of a template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Static tool definitions from configuration.
    Tool,
    /// Static scratch values from configuration.
    Tmp,
    /// Run-time parameters written by executed nodes.
    Dynamic,
    /// Per-segment parameters, requires a segment coordinate.
    Segment,
    /// Per-sequence parameters, requires sequence coordinates.
    Sequence,
    /// Per-resource parameters, requires all three coordinates.
    Resource,
}

impl Scope {
    /// Parse a scope token as it appears before the `.` in a placeholder.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "tool" => Some(Scope::Tool),
            "tmp" => Some(Scope::Tmp),
            "dynamic" => Some(Scope::Dynamic),
            "segment" => Some(Scope::Segment),
            "seq" => Some(Scope::Sequence),
            "resource" => Some(Scope::Resource),
            _ => None,
        }
    }

    /// The token used in placeholder syntax and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Tool => "tool",
            Scope::Tmp => "tmp",
            Scope::Dynamic => "dynamic",
            Scope::Segment => "segment",
            Scope::Sequence => "seq",
            Scope::Resource => "resource",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte span of one outermost `%{...}` token inside a larger string.
///
/// `start..end` covers the token including the leading `%{` and the matching
/// closing brace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

/// Find the first outermost `%{...}` token in `s`.
///
/// Nested `%{` openers are matched against closing braces, so the returned
/// span covers the whole token including any nested tokens. Returns `Ok(None)`
/// when `s` contains no opener, and `InvalidTemplateParameter` when an opener
/// is never closed.
pub fn next_token(s: &str) -> Result<Option<TokenSpan>> {
    let Some(start) = s.find("%{") else {
        return Ok(None);
    };
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' && depth > 0 {
            depth -= 1;
            if depth == 0 {
                return Ok(Some(TokenSpan { start, end: i + 1 }));
            }
        }
        i += 1;
    }
    Err(Error::invalid_parameter(s, "unbalanced braces"))
}

/// A validated `%{...}` template parameter reference.
///
/// Construction checks the token syntax only: the braces must balance and the
/// body must be non-empty. The body may still contain nested tokens; splitting
/// into scope and name happens after those are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameter {
    raw: String,
    body: String,
}

impl TemplateParameter {
    /// Parse a string that must consist of exactly one `%{...}` token.
    pub fn parse(raw: &str) -> Result<Self> {
        let span = next_token(raw)?
            .ok_or_else(|| Error::invalid_parameter(raw, "not a template parameter"))?;
        if span.start != 0 || span.end != raw.len() {
            return Err(Error::invalid_parameter(
                raw,
                "expected a single %{...} token",
            ));
        }
        let body = &raw[2..raw.len() - 1];
        if body.trim().is_empty() {
            return Err(Error::invalid_parameter(raw, "empty parameter body"));
        }
        Ok(Self {
            raw: raw.to_string(),
            body: body.to_string(),
        })
    }

    /// The full token text including braces.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The text between the braces, possibly containing nested tokens.
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl std::fmt::Display for TemplateParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a fully resolved token body into its scope and parameter name.
///
/// `raw` is the original token text, used only in error reports. A body
/// without a `.` is not a scoped reference and is handled by the caller.
pub fn split_scoped(raw: &str, body: &str) -> Result<(Scope, String)> {
    let Some((scope_token, name)) = body.split_once('.') else {
        return Err(Error::invalid_parameter(raw, "missing scope separator"));
    };
    if scope_token.is_empty() {
        return Err(Error::invalid_parameter(raw, "empty scope"));
    }
    if name.is_empty() {
        return Err(Error::invalid_parameter(raw, "empty parameter name"));
    }
    let scope = Scope::from_token(scope_token)
        .ok_or_else(|| Error::unknown_context(raw, scope_token))?;
    Ok((scope, name.to_string()))
}
