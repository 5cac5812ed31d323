//! Recursive-descent decoder for the PHP serialize grammar.
//!
//! One parser implementation handles both in-memory decoding (`loads`)
//! and streaming decoding (`load`) through the byte-source abstraction.
//! The grammar covers the seven node kinds `N b i d s a O`; string
//! payloads are framed by exact byte counts, so binary data and
//! multi-byte UTF-8 pass through untouched.
//!
//! `loads` additionally detects PHP session payloads: input that does
//! not begin with a recognized type tag is re-read as concatenated
//! `name|value` segments. This mirrors the historic behavior of the
//! format's consumers; note it is an implicit mode switch triggered by
//! the very first byte, not an opt-in flag.

use std::io::Read;

use memchr::memchr;

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

use crate::error::{ErrorKind, PhpSerializeError, Result};
use crate::options::Options;
use crate::source::{ReadSource, SliceSource, Source};
use crate::types::{Array, PhpObject, Value};

/// Is `byte` one of the seven top-level type tags?
#[inline]
fn is_type_tag(byte: u8) -> bool {
    matches!(byte, b'N' | b'b' | b'i' | b'd' | b's' | b'a' | b'O')
}

/// The grammar engine, generic over its byte source.
struct Parser<'o, S: Source> {
    src: S,
    opts: &'o Options,
}

impl<'o, S: Source> Parser<'o, S> {
    fn new(src: S, opts: &'o Options) -> Self {
        Self { src, opts }
    }

    /// Byte offset of the next unconsumed byte.
    fn position(&self) -> usize {
        self.src.position()
    }

    /// Parse a single node at the current position.
    fn parse_node(&mut self) -> Result<Value> {
        let type_byte = self.src.peek_byte()?;

        #[cfg(feature = "tracing")]
        trace!(tag = %char::from(type_byte), pos = self.src.position(), "parsing node");

        match type_byte {
            b'N' => self.parse_null(),
            b'b' => self.parse_bool(),
            b'i' => self.parse_int().map(Value::Int),
            b'd' => self.parse_float(),
            b's' => self.parse_string(),
            b'a' => self.parse_array(),
            b'O' => self.parse_object(),
            _ => {
                #[cfg(feature = "tracing")]
                warn!(tag = %char::from(type_byte), pos = self.src.position(), "unknown type tag");
                let pos = self.src.position();
                Err(PhpSerializeError::new(ErrorKind::UnknownTag(type_byte as char), pos)
                    .with_preview(self.src.preview(pos)))
            }
        }
    }

    /// Parse a null node: `N;`
    fn parse_null(&mut self) -> Result<Value> {
        self.expect_byte(b'N')?;
        self.expect_byte(b';')?;
        Ok(Value::Null)
    }

    /// Parse a boolean node: `b:0;` or `b:1;`
    fn parse_bool(&mut self) -> Result<Value> {
        self.expect_byte(b'b')?;
        self.expect_byte(b':')?;
        let value_pos = self.src.position();
        let value_byte = self.src.read_byte()?;
        self.expect_byte(b';')?;

        match value_byte {
            b'0' => Ok(Value::Bool(false)),
            b'1' => Ok(Value::Bool(true)),
            _ => Err(PhpSerializeError::new(
                ErrorKind::InvalidBoolean((value_byte as char).to_string()),
                value_pos,
            )),
        }
    }

    /// Parse an integer node: `i:<value>;`
    fn parse_int(&mut self) -> Result<i64> {
        self.expect_byte(b'i')?;
        self.expect_byte(b':')?;

        let start = self.src.position();
        let digits = self.src.read_until(b';')?;
        let int_str = std::str::from_utf8(&digits).map_err(|_| {
            PhpSerializeError::new(ErrorKind::InvalidInteger("invalid UTF-8".into()), start)
        })?;
        let value: i64 = int_str.parse().map_err(|_| {
            PhpSerializeError::new(ErrorKind::InvalidInteger(int_str.to_string()), start)
        })?;

        self.expect_byte(b';')?;
        Ok(value)
    }

    /// Parse a float node: `d:<value>;`
    fn parse_float(&mut self) -> Result<Value> {
        self.expect_byte(b'd')?;
        self.expect_byte(b':')?;

        let start = self.src.position();
        let digits = self.src.read_until(b';')?;
        let float_str = std::str::from_utf8(&digits).map_err(|_| {
            PhpSerializeError::new(ErrorKind::InvalidFloat("invalid UTF-8".into()), start)
        })?;

        // PHP spells the non-finite values INF/-INF/NAN.
        let value: f64 = match float_str {
            "INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            "NAN" => f64::NAN,
            _ => float_str.parse().map_err(|_| {
                PhpSerializeError::new(ErrorKind::InvalidFloat(float_str.to_string()), start)
            })?,
        };

        self.expect_byte(b';')?;
        Ok(Value::Float(value))
    }

    /// Parse a string node: `s:<len>:"<bytes>";`
    ///
    /// The declared length is an exact byte count; the payload is
    /// consumed blindly, so quotes, semicolons and arbitrary binary
    /// inside the string need no escaping.
    fn parse_string(&mut self) -> Result<Value> {
        self.expect_byte(b's')?;
        self.expect_byte(b':')?;
        let len = self.read_length()?;
        self.expect_byte(b':')?;
        self.expect_byte(b'"')?;

        let payload_pos = self.src.position();
        let bytes = self.src.take(len)?;

        self.expect_byte(b'"')?;
        self.expect_byte(b';')?;

        self.string_value(bytes, payload_pos)
    }

    /// Parse an array node: `a:<count>:{<key><value>...}`
    fn parse_array(&mut self) -> Result<Value> {
        self.expect_byte(b'a')?;
        self.expect_byte(b':')?;
        let count = self.read_length()?;
        self.expect_byte(b':')?;
        self.expect_byte(b'{')?;

        let mut entries = Array::with_capacity(count.min(1024)); // Cap initial allocation

        for index in 0..count {
            let key_pos = self.src.position();
            if self.src.peek_byte()? == b'}' {
                return Err(PhpSerializeError::new(
                    ErrorKind::PairCountMismatch {
                        declared: count,
                        found: index,
                    },
                    key_pos,
                ));
            }

            // Any scalar node is a valid key; only container kinds are
            // refused.
            let key = self.parse_node()?;
            if matches!(
                key,
                Value::Array(_) | Value::Object(_) | Value::List(_) | Value::Foreign(_)
            ) {
                return Err(PhpSerializeError::new(ErrorKind::InvalidArrayKey, key_pos));
            }

            let value = self.parse_node()?;
            // Duplicate keys overwrite in encounter order, like PHP.
            entries.insert(key, value);
        }

        self.expect_byte(b'}')?;

        match &self.opts.array_hook {
            Some(hook) => Ok(hook(entries)),
            None => Ok(Value::Array(entries)),
        }
    }

    /// Parse an object node: `O:<namelen>:"<name>":<count>:{<member>...}`
    ///
    /// Member names are plain string keys; no visibility name-mangling
    /// is interpreted. The decoded object goes through the object hook
    /// when one is installed.
    fn parse_object(&mut self) -> Result<Value> {
        self.expect_byte(b'O')?;
        self.expect_byte(b':')?;
        let name_len = self.read_length()?;
        self.expect_byte(b':')?;
        self.expect_byte(b'"')?;

        let name_pos = self.src.position();
        let name_bytes = self.src.take(name_len)?;
        let class_name = String::from_utf8(name_bytes)
            .map_err(|_| PhpSerializeError::new(ErrorKind::InvalidUtf8, name_pos))?;

        self.expect_byte(b'"')?;
        self.expect_byte(b':')?;
        let count = self.read_length()?;
        self.expect_byte(b':')?;
        self.expect_byte(b'{')?;

        let mut members = Array::with_capacity(count.min(1024));

        for index in 0..count {
            let name_pos = self.src.position();
            if self.src.peek_byte()? == b'}' {
                return Err(PhpSerializeError::new(
                    ErrorKind::PairCountMismatch {
                        declared: count,
                        found: index,
                    },
                    name_pos,
                ));
            }
            let member_name = self.parse_node()?;
            match member_name {
                Value::Bytes(_) | Value::String(_) => {}
                _ => {
                    return Err(PhpSerializeError::new(
                        ErrorKind::InvalidMemberName,
                        name_pos,
                    ));
                }
            }

            let value = self.parse_node()?;
            members.insert(member_name, value);
        }

        self.expect_byte(b'}')?;

        let object = PhpObject::new(class_name, members);
        match &self.opts.object_hook {
            Some(hook) => hook.decode(object),
            None => Ok(Value::Object(object)),
        }
    }

    /// Read a `:`-terminated decimal length or count prefix.
    ///
    /// Negative or non-numeric prefixes are malformed input, never
    /// clamped.
    fn read_length(&mut self) -> Result<usize> {
        let start = self.src.position();
        let digits = self.src.read_until(b':')?;
        let len_str = std::str::from_utf8(&digits).map_err(|_| {
            PhpSerializeError::new(ErrorKind::InvalidInteger("invalid UTF-8".into()), start)
        })?;
        len_str.parse().map_err(|_| {
            PhpSerializeError::new(ErrorKind::InvalidInteger(len_str.to_string()), start)
        })
    }

    /// Expect a specific byte, returning an error if it doesn't match.
    #[inline]
    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let byte = self.src.read_byte()?;
        if byte != expected {
            return Err(self.make_unexpected_char_error(expected, byte));
        }
        Ok(())
    }

    /// Create an unexpected character error with proper context.
    #[cold]
    #[inline(never)]
    fn make_unexpected_char_error(&self, expected: u8, found: u8) -> PhpSerializeError {
        let pos = self.src.position().saturating_sub(1);
        PhpSerializeError::new(
            ErrorKind::UnexpectedChar {
                expected: expected as char,
                found: found as char,
            },
            pos,
        )
        .with_preview(self.src.preview(pos))
    }

    /// Turn a raw string payload into a value per `decode_strings`.
    fn string_value(&self, bytes: Vec<u8>, pos: usize) -> Result<Value> {
        if self.opts.decode_strings {
            let text = String::from_utf8(bytes)
                .map_err(|_| PhpSerializeError::new(ErrorKind::InvalidUtf8, pos))?;
            Ok(Value::String(text))
        } else {
            Ok(Value::Bytes(bytes))
        }
    }
}

/// Decode a session payload: `name|value` segments until exhaustion.
///
/// Names are raw byte runs up to the next `|`; each value is one
/// complete standard-grammar node.
fn parse_session(data: &[u8], opts: &Options) -> Result<Value> {
    #[cfg(feature = "tracing")]
    debug!(data_len = data.len(), "decoding as session payload");

    let mut entries = Array::new();
    let mut pos = 0;

    while pos < data.len() {
        let Some(offset) = memchr(b'|', &data[pos..]) else {
            return Err(PhpSerializeError::new(ErrorKind::UnexpectedEof, data.len())
                .with_context("expected '|' after a session variable name"));
        };
        let name = &data[pos..pos + offset];
        let key = if opts.decode_strings {
            Value::String(
                std::str::from_utf8(name)
                    .map_err(|_| PhpSerializeError::new(ErrorKind::InvalidUtf8, pos))?
                    .to_string(),
            )
        } else {
            Value::Bytes(name.to_vec())
        };

        let mut parser = Parser::new(SliceSource::starting_at(data, pos + offset + 1), opts);
        let value = parser.parse_node()?;
        pos = parser.position();

        entries.insert(key, value);
    }

    Ok(Value::Array(entries))
}

/// Decode a complete byte sequence with default options.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{loads, Value};
///
/// let value = loads(b"i:42;").unwrap();
/// assert_eq!(value.as_int(), Some(42));
/// ```
#[inline]
pub fn loads(data: impl AsRef<[u8]>) -> Result<Value> {
    loads_with_options(data, &Options::default())
}

/// Decode a complete byte sequence.
///
/// Exactly one top-level node must consume the whole input; leftover
/// bytes fail with `TrailingData`. Input that does not begin with a
/// recognized type tag falls back to session decoding and yields an
/// array of `name => value` entries.
pub fn loads_with_options(data: impl AsRef<[u8]>, opts: &Options) -> Result<Value> {
    let data = data.as_ref();

    #[cfg(feature = "tracing")]
    debug!(data_len = data.len(), "decoding");

    match data.first() {
        None => Err(PhpSerializeError::new(ErrorKind::UnexpectedEof, 0)),
        Some(&first) if !is_type_tag(first) => parse_session(data, opts),
        Some(_) => {
            let mut parser = Parser::new(SliceSource::new(data), opts);
            let value = parser.parse_node()?;
            let pos = parser.position();
            if pos < data.len() {
                return Err(PhpSerializeError::new(
                    ErrorKind::TrailingData {
                        remaining: data.len() - pos,
                    },
                    pos,
                ));
            }
            Ok(value)
        }
    }
}

/// Decode the next single top-level node from a reader, with default
/// options.
///
/// The reader is left positioned exactly after the node, so consecutive
/// values written to one stream can be read back in order. Session
/// fallback does not apply to streams.
#[inline]
pub fn load<R: Read>(reader: R) -> Result<Value> {
    load_with_options(reader, &Options::default())
}

/// Decode the next single top-level node from a reader.
pub fn load_with_options<R: Read>(reader: R, opts: &Options) -> Result<Value> {
    let mut parser = Parser::new(ReadSource::new(reader), opts);
    parser.parse_node()
}
