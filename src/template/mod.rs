//! Template parameter syntax and resolution.
//!
//! Pipeline descriptions reference values as `%{scope.name}`; this module
//! owns the token grammar ([`parameter`]) and the resolution engine
//! ([`resolver`]) that substitutes tokens against the scoped contexts.

pub mod parameter;
pub mod resolver;

pub use parameter::{Scope, TemplateParameter, MAX_RESOLUTION_DEPTH};
pub use resolver::{resolve, resolve_bool, Iterators};
