//! Codec for the PHP `serialize()` wire format.
//!
//! This crate encodes native values into PHP's serialize text and
//! decodes conformant byte streams back, covering all seven grammar
//! kinds, nested structures, and the multi-segment session encoding
//! PHP uses for `$_SESSION` payloads.
//!
//! # Features
//!
//! - **Byte-precise framing** - String lengths are byte counts, so
//!   multi-byte UTF-8 and arbitrary binary data round-trip losslessly
//! - **Ordered mappings** - PHP arrays decode to an insertion-ordered
//!   mapping; opt into sequences with the coercion helpers
//! - **Object hooks** - Pluggable strategy for mapping custom native
//!   types to and from PHP objects
//! - **Session fallback** - Input that does not start with a type tag
//!   is decoded as `name|value` session segments
//! - **Streaming** - `dump`/`load` write and read consecutive top-level
//!   nodes through any byte sink or source
//! - **Detailed errors** - Precise byte offsets, offending tags, and
//!   input previews
//!
//! # Quick Start
//!
//! ```rust
//! use php_serialize_core::{dumps, Options, Value};
//!
//! let mut user = php_serialize_core::Array::new();
//! user.insert("name", "Alice");
//! user.insert("age", 30);
//!
//! let encoded = dumps(&Value::Array(user)).unwrap();
//! assert_eq!(encoded, b"a:2:{s:4:\"name\";s:5:\"Alice\";s:3:\"age\";i:30;}".to_vec());
//!
//! let decoded = php_serialize_core::loads_with_options(
//!     &encoded,
//!     &Options::new().decode_strings(true),
//! ).unwrap();
//! let arr = decoded.as_array().unwrap();
//! assert_eq!(arr.get_str("name").and_then(Value::as_str), Some("Alice"));
//! ```
//!
//! # Supported Types
//!
//! | PHP Wire | Native Value |
//! |----------|--------------|
//! | `N;` | `Value::Null` |
//! | `b:` | `Value::Bool(bool)` |
//! | `i:` | `Value::Int(i64)` |
//! | `d:` | `Value::Float(f64)` |
//! | `s:` | `Value::Bytes` / `Value::String` (per `decode_strings`) |
//! | `a:` | `Value::Array` (ordered mapping); `Value::List` encodes with keys `0..n-1` |
//! | `O:` | `Value::Object` or the object hook's result |
//!
//! PHP reference markers (`R:`/`r:`) and property visibility
//! name-mangling are out of scope: object members decode as plain
//! string keys.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)]

pub mod encoder;
pub mod error;
pub mod options;
pub mod parser;
pub mod types;

mod source;

#[cfg(feature = "serde")]
pub mod json;

pub use encoder::{dump, dump_with_options, dumps, dumps_with_options};
pub use error::{ErrorKind, PhpSerializeError, Result};
pub use options::{ArrayHook, ObjectHook, Options};
pub use parser::{load, load_with_options, loads, loads_with_options};
pub use types::{to_list_deep, Array, Foreign, PhpObject, Value};

#[cfg(feature = "serde")]
pub use json::{to_json, to_json_string, to_json_string_pretty};
