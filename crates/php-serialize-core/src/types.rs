//! Value types for the PHP serialize codec.
//!
//! The wire grammar is rendered into a closed set of native kinds:
//! scalars, byte strings, UTF-8 text, sequences, ordered mappings
//! ([`Array`]), generic decoded objects ([`PhpObject`]) and opaque
//! values ([`Foreign`]) that only an object hook can encode.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use bstr::ByteSlice;

use crate::error::{ErrorKind, PhpSerializeError, Result};

/// A value that can be encoded to or decoded from the PHP serialize format.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// PHP null.
    #[default]
    Null,

    /// PHP boolean.
    Bool(bool),

    /// PHP integer.
    Int(i64),

    /// PHP float/double.
    Float(f64),

    /// Raw byte string. Length prefixes on the wire are byte counts,
    /// so arbitrary binary data round-trips through this variant.
    Bytes(Vec<u8>),

    /// UTF-8 text. Encodes with its UTF-8 byte length; produced by the
    /// decoder when `decode_strings` is enabled.
    String(String),

    /// A sequence. Encodes as a PHP array keyed `0..n-1`; the decoder
    /// never produces this variant (use [`Array::to_list`] to opt in).
    List(Vec<Value>),

    /// A PHP array: an insertion-ordered mapping with unique keys.
    Array(Array),

    /// A decoded PHP object with its class name and members.
    Object(PhpObject),

    /// An opaque native value. Encoding requires an object hook that
    /// recognizes the underlying type; the decoder never produces it.
    Foreign(Foreign),
}

impl Value {
    /// Wrap an arbitrary native value for hook-based encoding.
    pub fn foreign<T: Any>(value: T) -> Self {
        Value::Foreign(Foreign::new(value))
    }

    /// Check if the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if the value is an array (ordered mapping).
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Get the value as a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float. Integers widen.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a byte slice, from either string representation.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b.as_slice()),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Get the value as UTF-8 text, from either string representation.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Get the value as an ordered mapping.
    #[inline]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the value as a sequence.
    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Get the value as a decoded object.
    #[inline]
    pub fn as_object(&self) -> Option<&PhpObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get a type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Foreign(_) => "foreign value",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bytes(b) => write!(f, "\"{}\"", b.as_bstr()),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Array(arr) => write!(f, "{}", arr),
            Value::Object(obj) => write!(f, "{}{{...}}", obj.name()),
            Value::Foreign(_) => write!(f, "<foreign value>"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<PhpObject> for Value {
    fn from(v: PhpObject) -> Self {
        Value::Object(v)
    }
}

/// An insertion-ordered key/value mapping with unique keys.
///
/// This is the native rendering of a PHP array: key order is encounter
/// order, duplicate keys overwrite in place (last write wins, original
/// position kept), and keys are integers or strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    entries: Vec<(Value, Value)>,
}

impl Array {
    /// Create an empty array.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty array with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the array has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a key/value pair.
    ///
    /// An existing key keeps its position and has its value replaced,
    /// matching PHP array assignment.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value by exact key.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a value by string key, matching both text and byte keys.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_bytes() == Some(key.as_bytes()))
            .map(|(_, v)| v)
    }

    /// Look up a value by integer key.
    pub fn get_int(&self, key: i64) -> Option<&Value> {
        self.get(&Value::Int(key))
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    /// View the entries as a slice of pairs.
    pub fn entries(&self) -> &[(Value, Value)] {
        self.entries.as_slice()
    }

    /// Coerce the array into a sequence.
    ///
    /// Succeeds iff the keys are exactly the integers `0..n-1`, each
    /// appearing once; encounter order may differ from numeric order and
    /// the result is ordered by the numeric key. Fails with
    /// [`ErrorKind::KeyRange`] otherwise.
    pub fn to_list(&self) -> Result<Vec<Value>> {
        let n = self.entries.len();
        let mut slots: Vec<Option<Value>> = vec![None; n];
        for (key, value) in &self.entries {
            let index = match key {
                Value::Int(i) if *i >= 0 && (*i as usize) < n => *i as usize,
                _ => return Err(ErrorKind::KeyRange { len: n }.into()),
            };
            // Keys are unique by construction, so the slot is free.
            slots[index] = Some(value.clone());
        }
        Ok(slots.into_iter().map(|v| v.unwrap_or_default()).collect())
    }

    /// Consume the array, yielding its entries in insertion order.
    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} => {}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(Value, Value)> for Array {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut array = Array::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            array.insert(k, v);
        }
        array
    }
}

impl IntoIterator for Array {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Recursively coerce qualifying nested arrays into sequences.
///
/// Every [`Array`] whose keys are exactly `0..n-1` becomes a
/// [`Value::List`]; non-qualifying arrays are kept as arrays with their
/// values coerced in place, so the mapping shape of the rest of the
/// structure is preserved.
pub fn to_list_deep(value: Value) -> Value {
    match value {
        Value::Array(array) => {
            let coerced: Array = array
                .into_entries()
                .into_iter()
                .map(|(k, v)| (k, to_list_deep(v)))
                .collect();
            match coerced.to_list() {
                Ok(items) => Value::List(items),
                Err(_) => Value::Array(coerced),
            }
        }
        Value::List(items) => Value::List(items.into_iter().map(to_list_deep).collect()),
        other => other,
    }
}

/// A decoded PHP object: a class name plus an ordered member mapping.
///
/// This is what the decoder produces for `O:` nodes when no object hook
/// is supplied, so payloads can be inspected without registering one.
#[derive(Debug, Clone, PartialEq)]
pub struct PhpObject {
    name: String,
    members: Array,
}

impl PhpObject {
    /// Create an object from a class name and member mapping.
    pub fn new(name: impl Into<String>, members: Array) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// The PHP class name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered member mapping.
    #[inline]
    pub fn members(&self) -> &Array {
        &self.members
    }

    /// Look up a member by name.
    ///
    /// Fails with [`ErrorKind::MissingMember`] when the member is absent.
    pub fn get(&self, member: &str) -> Result<&Value> {
        self.members.get_str(member).ok_or_else(|| {
            PhpSerializeError::from(ErrorKind::MissingMember {
                class: self.name.clone(),
                member: member.to_string(),
            })
        })
    }

    /// Consume the object, yielding its parts.
    pub fn into_parts(self) -> (String, Array) {
        (self.name, self.members)
    }
}

/// An opaque native value carried through [`Value`] for hook-based encoding.
///
/// Holds any `'static` type behind a shared handle; the encoder passes it
/// to the object hook's `try_encode`, which downcasts to the types it
/// recognizes.
#[derive(Clone)]
pub struct Foreign(Rc<dyn Any>);

impl Foreign {
    /// Wrap a native value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Borrow the wrapped value as `Any` for downcasting.
    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        self.0.as_ref()
    }

    /// Downcast to a concrete type.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for Foreign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Foreign(..)")
    }
}

impl PartialEq for Foreign {
    /// Identity comparison: two handles are equal iff they share the
    /// same allocation.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
