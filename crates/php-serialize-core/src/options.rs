//! Codec options and the object hook strategy.

use std::any::Any;
use std::fmt;

use crate::error::Result;
use crate::types::{Array, PhpObject, Value};

/// Bidirectional strategy translating custom native types to and from
/// PHP objects.
///
/// Both methods have declining defaults, so a hook only overrides the
/// direction it cares about. Hook errors propagate to the caller of the
/// encode/decode entry point unchanged.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use php_serialize_core::{Array, ObjectHook, PhpObject, Result, Value};
///
/// struct User { username: String }
///
/// struct UserHook;
///
/// impl ObjectHook for UserHook {
///     fn try_encode(&self, value: &dyn Any) -> Result<Option<(String, Array)>> {
///         let Some(user) = value.downcast_ref::<User>() else {
///             return Ok(None);
///         };
///         let mut members = Array::new();
///         members.insert("username", user.username.clone());
///         Ok(Some(("WP_User".to_string(), members)))
///     }
///
///     fn decode(&self, object: PhpObject) -> Result<Value> {
///         let username = object.get("username")?.as_str().unwrap_or_default();
///         Ok(Value::foreign(User { username: username.to_string() }))
///     }
/// }
/// ```
pub trait ObjectHook {
    /// Encode side: map an opaque value to a class name and member
    /// mapping. Return `Ok(None)` to decline the value, in which case
    /// encoding fails with `UnsupportedType`.
    fn try_encode(&self, value: &dyn Any) -> Result<Option<(String, Array)>> {
        let _ = value;
        Ok(None)
    }

    /// Decode side: build a native value from a decoded object. The
    /// default keeps the generic representation.
    fn decode(&self, object: PhpObject) -> Result<Value> {
        Ok(Value::Object(object))
    }
}

/// Post-transform applied to every completed decoded array.
pub type ArrayHook = Box<dyn Fn(Array) -> Value>;

/// Options recognized by the encode and decode entry points.
#[derive(Default)]
pub struct Options {
    /// Decode `s:` payloads to UTF-8 text ([`Value::String`]) instead of
    /// raw bytes ([`Value::Bytes`]). Off by default: arbitrary binary
    /// payloads survive only as bytes.
    pub decode_strings: bool,

    /// Strategy for translating custom native types to and from PHP
    /// objects. Without one, `O:` nodes decode to the generic
    /// [`PhpObject`] representation and [`Value::Foreign`] fails to
    /// encode.
    pub object_hook: Option<Box<dyn ObjectHook>>,

    /// Result-container selector: transform each decoded array, e.g.
    /// to coerce contiguous integer-keyed mappings into sequences.
    pub array_hook: Option<ArrayHook>,
}

impl Options {
    /// Options with everything at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable text decoding of string payloads.
    pub fn decode_strings(mut self, yes: bool) -> Self {
        self.decode_strings = yes;
        self
    }

    /// Install an object hook.
    pub fn object_hook(mut self, hook: impl ObjectHook + 'static) -> Self {
        self.object_hook = Some(Box::new(hook));
        self
    }

    /// Install an array post-transform.
    pub fn array_hook(mut self, hook: impl Fn(Array) -> Value + 'static) -> Self {
        self.array_hook = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("decode_strings", &self.decode_strings)
            .field("object_hook", &self.object_hook.is_some())
            .field("array_hook", &self.array_hook.is_some())
            .finish()
    }
}
