//! Encoder for the PHP serialize grammar.
//!
//! A depth-first walk over [`Value`] emitting the wire text. The walk is
//! cycle-free by construction (values own their children), dispatch is a
//! closed match over the value kinds, and the only extension point is
//! the object hook consulted for [`Value::Foreign`].

use std::io::Write;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::error::{ErrorKind, PhpSerializeError, Result};
use crate::options::Options;
use crate::types::{Array, Value};

/// The grammar emitter, writing to any byte sink.
struct Encoder<'o, W: Write> {
    out: W,
    opts: &'o Options,
}

impl<'o, W: Write> Encoder<'o, W> {
    fn new(out: W, opts: &'o Options) -> Self {
        Self { out, opts }
    }

    /// Encode one value as a complete node.
    fn encode_node(&mut self, value: &Value) -> Result<()> {
        #[cfg(feature = "tracing")]
        trace!(kind = value.type_name(), "encoding node");

        match value {
            Value::Null => self.out.write_all(b"N;")?,
            Value::Bool(false) => self.out.write_all(b"b:0;")?,
            Value::Bool(true) => self.out.write_all(b"b:1;")?,
            Value::Int(i) => write!(self.out, "i:{};", i)?,
            Value::Float(f) => self.encode_float(*f)?,
            Value::Bytes(b) => self.encode_string(b)?,
            Value::String(s) => self.encode_string(s.as_bytes())?,
            Value::List(items) => self.encode_list(items)?,
            Value::Array(entries) => self.encode_array(entries)?,
            Value::Object(obj) => self.encode_object(obj.name(), obj.members())?,
            Value::Foreign(foreign) => {
                let hook = self
                    .opts
                    .object_hook
                    .as_ref()
                    .ok_or(ErrorKind::UnsupportedType("foreign value"))?;
                // Hook errors propagate unchanged; a declining hook is
                // the same failure as having none.
                let (name, members) = hook
                    .try_encode(foreign.as_any())?
                    .ok_or(ErrorKind::UnsupportedType("foreign value"))?;
                self.encode_object(&name, &members)?;
            }
        }
        Ok(())
    }

    /// Encode a float node: `d:<value>;`
    ///
    /// Uses the shortest round-trip decimal rendering with a `.`
    /// separator; integral floats come out as integer text (`d:5;`),
    /// matching PHP. Non-finite values use PHP's INF/-INF/NAN spellings.
    fn encode_float(&mut self, f: f64) -> Result<()> {
        if f.is_nan() {
            self.out.write_all(b"d:NAN;")?;
        } else if f.is_infinite() {
            if f.is_sign_positive() {
                self.out.write_all(b"d:INF;")?;
            } else {
                self.out.write_all(b"d:-INF;")?;
            }
        } else {
            write!(self.out, "d:{};", f)?;
        }
        Ok(())
    }

    /// Encode a string node: `s:<len>:"<bytes>";`
    ///
    /// The length prefix is the exact byte count, so text with
    /// multi-byte characters measures its UTF-8 encoding, not its
    /// character count.
    fn encode_string(&mut self, bytes: &[u8]) -> Result<()> {
        write!(self.out, "s:{}:\"", bytes.len())?;
        self.out.write_all(bytes)?;
        self.out.write_all(b"\";")?;
        Ok(())
    }

    /// Encode a sequence as an array keyed `0..n-1`.
    fn encode_list(&mut self, items: &[Value]) -> Result<()> {
        write!(self.out, "a:{}:{{", items.len())?;
        for (index, item) in items.iter().enumerate() {
            write!(self.out, "i:{};", index)?;
            self.encode_node(item)?;
        }
        self.out.write_all(b"}")?;
        Ok(())
    }

    /// Encode an ordered mapping in iteration order.
    fn encode_array(&mut self, entries: &Array) -> Result<()> {
        write!(self.out, "a:{}:{{", entries.len())?;
        for (key, value) in entries.iter() {
            self.encode_key(key)?;
            self.encode_node(value)?;
        }
        self.out.write_all(b"}")?;
        Ok(())
    }

    /// Encode an array key: integers as `i:`, strings as `s:`.
    fn encode_key(&mut self, key: &Value) -> Result<()> {
        match key {
            Value::Int(i) => write!(self.out, "i:{};", i)?,
            Value::Bytes(b) => self.encode_string(b)?,
            Value::String(s) => self.encode_string(s.as_bytes())?,
            other => {
                return Err(
                    PhpSerializeError::from(ErrorKind::UnsupportedType(other.type_name()))
                        .with_context("array keys must be integers or strings"),
                )
            }
        }
        Ok(())
    }

    /// Encode an object node: `O:<namelen>:"<name>":<count>:{...}`
    fn encode_object(&mut self, name: &str, members: &Array) -> Result<()> {
        write!(
            self.out,
            "O:{}:\"{}\":{}:{{",
            name.len(),
            name,
            members.len()
        )?;
        for (member_name, value) in members.iter() {
            let name_bytes = member_name
                .as_bytes()
                .ok_or(ErrorKind::InvalidMemberName)?;
            self.encode_string(name_bytes)?;
            self.encode_node(value)?;
        }
        self.out.write_all(b"}")?;
        Ok(())
    }
}

/// Encode a value to an in-memory byte sequence with default options.
///
/// # Example
///
/// ```rust
/// use php_serialize_core::{dumps, Value};
///
/// assert_eq!(dumps(&Value::Int(5)).unwrap(), b"i:5;");
/// assert_eq!(dumps(&Value::from("Hello world")).unwrap(), b"s:11:\"Hello world\";");
/// ```
#[inline]
pub fn dumps(value: &Value) -> Result<Vec<u8>> {
    dumps_with_options(value, &Options::default())
}

/// Encode a value to an in-memory byte sequence.
pub fn dumps_with_options(value: &Value, opts: &Options) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    dump_with_options(value, &mut out, opts)?;
    Ok(out)
}

/// Encode a value into a caller-provided byte sink with default options.
///
/// The sink is written in node order with plain synchronous writes; the
/// codec neither opens nor closes it, so consecutive `dump` calls
/// append consecutive top-level nodes.
#[inline]
pub fn dump<W: Write>(value: &Value, sink: W) -> Result<()> {
    dump_with_options(value, sink, &Options::default())
}

/// Encode a value into a caller-provided byte sink.
pub fn dump_with_options<W: Write>(value: &Value, sink: W, opts: &Options) -> Result<()> {
    #[cfg(feature = "tracing")]
    debug!(kind = value.type_name(), "encoding");

    let mut encoder = Encoder::new(sink, opts);
    encoder.encode_node(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhpSerializeError;
    use crate::parser::{load, loads, loads_with_options};
    use crate::types::{to_list_deep, PhpObject};
    use crate::ObjectHook;
    use std::any::Any;

    fn text_options() -> Options {
        Options::new().decode_strings(true)
    }

    #[test]
    fn test_dumps_null() {
        assert_eq!(dumps(&Value::Null).unwrap(), b"N;");
    }

    #[test]
    fn test_dumps_bool() {
        assert_eq!(dumps(&Value::Bool(true)).unwrap(), b"b:1;");
        assert_eq!(dumps(&Value::Bool(false)).unwrap(), b"b:0;");
    }

    #[test]
    fn test_dumps_int() {
        assert_eq!(dumps(&Value::Int(5)).unwrap(), b"i:5;");
        assert_eq!(dumps(&Value::Int(-42)).unwrap(), b"i:-42;");
    }

    #[test]
    fn test_dumps_float() {
        assert_eq!(dumps(&Value::Float(5.6)).unwrap(), b"d:5.6;");
        // Integral floats render as integer text.
        assert_eq!(dumps(&Value::Float(5.0)).unwrap(), b"d:5;");
        assert_eq!(dumps(&Value::Float(-2.5)).unwrap(), b"d:-2.5;");
    }

    #[test]
    fn test_dumps_float_nonfinite() {
        assert_eq!(dumps(&Value::Float(f64::INFINITY)).unwrap(), b"d:INF;");
        assert_eq!(dumps(&Value::Float(f64::NEG_INFINITY)).unwrap(), b"d:-INF;");
        assert_eq!(dumps(&Value::Float(f64::NAN)).unwrap(), b"d:NAN;");
    }

    #[test]
    fn test_dumps_str() {
        assert_eq!(
            dumps(&Value::from("Hello world")).unwrap(),
            b"s:11:\"Hello world\";"
        );
    }

    #[test]
    fn test_dumps_unicode_length_is_byte_count() {
        // 20 characters, 23 bytes of UTF-8.
        assert_eq!(
            dumps(&Value::from("Björk Guðmundsdóttir")).unwrap(),
            b"s:23:\"Bj\xc3\xb6rk Gu\xc3\xb0mundsd\xc3\xb3ttir\";".to_vec()
        );
    }

    #[test]
    fn test_dumps_binary() {
        assert_eq!(
            dumps(&Value::Bytes(vec![1, 2, 3])).unwrap(),
            b"s:3:\"\x01\x02\x03\";".to_vec()
        );
    }

    #[test]
    fn test_dumps_list() {
        let value = Value::List(vec![Value::Int(7), Value::Int(8), Value::Int(9)]);
        assert_eq!(dumps(&value).unwrap(), b"a:3:{i:0;i:7;i:1;i:8;i:2;i:9;}");
    }

    #[test]
    fn test_dumps_map_in_insertion_order() {
        let mut map = Array::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);
        assert_eq!(
            dumps(&Value::Array(map)).unwrap(),
            b"a:3:{s:1:\"a\";i:1;s:1:\"b\";i:2;s:1:\"c\";i:3;}"
        );
    }

    #[test]
    fn test_dumps_map_integer_keys() {
        let mut map = Array::new();
        map.insert(5, "a");
        map.insert("x", "b");
        assert_eq!(
            dumps(&Value::Array(map)).unwrap(),
            b"a:2:{i:5;s:1:\"a\";s:1:\"x\";s:1:\"b\";}"
        );
    }

    #[test]
    fn test_dumps_rejects_bad_key_kind() {
        let mut map = Array::new();
        map.insert(Value::Bool(true), 1);
        let err = dumps(&Value::Array(map)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedType("boolean"));
    }

    #[test]
    fn test_dumps_generic_object() {
        let mut members = Array::new();
        members.insert("username", "admin");
        let value = Value::Object(PhpObject::new("WP_User", members));
        assert_eq!(
            dumps(&value).unwrap(),
            b"O:7:\"WP_User\":1:{s:8:\"username\";s:5:\"admin\";}".to_vec()
        );
    }

    #[test]
    fn test_dumps_foreign_without_hook_fails() {
        struct Custom;
        let err = dumps(&Value::foreign(Custom)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedType("foreign value"));
    }

    #[test]
    fn test_roundtrip_dict() {
        let mut map = Array::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);
        let value = Value::Array(map.clone());
        let decoded = loads_with_options(dumps(&value).unwrap(), &text_options()).unwrap();
        assert_eq!(decoded, Value::Array(map));
    }

    #[test]
    fn test_roundtrip_binary() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let encoded = dumps(&Value::Bytes(bytes.clone())).unwrap();
        assert_eq!(loads(encoded).unwrap(), Value::Bytes(bytes));
    }

    #[test]
    fn test_list_roundtrips_as_ordered_mapping() {
        // Sequences come back as arrays keyed 0..n-1 unless coerced.
        let encoded = dumps(&Value::List(vec![Value::Int(0), Value::Int(1)])).unwrap();
        let decoded = loads(encoded).unwrap();
        let arr = decoded.as_array().unwrap();
        assert_eq!(arr.get_int(0), Some(&Value::Int(0)));
        assert_eq!(arr.get_int(1), Some(&Value::Int(1)));
        assert_eq!(
            arr.to_list().unwrap(),
            vec![Value::Int(0), Value::Int(1)]
        );
    }

    #[test]
    fn test_roundtrip_nested() {
        let mut inner = Array::new();
        inner.insert(0, "1");
        inner.insert(1, "2");
        let mut map = Array::new();
        map.insert("a", "b");
        map.insert("c", Value::Array(inner));
        let value = Value::Array(map);

        let decoded = loads_with_options(dumps(&value).unwrap(), &text_options()).unwrap();
        assert_eq!(decoded, value);

        let coerced = to_list_deep(decoded);
        let list = coerced
            .as_array()
            .unwrap()
            .get_str("c")
            .and_then(Value::as_list)
            .unwrap();
        assert_eq!(list, &[Value::from("1"), Value::from("2")]);
    }

    #[test]
    fn test_stream_sequencing() {
        let mut sink = Vec::new();
        dump(&Value::List(vec![Value::Int(1), Value::Int(2)]), &mut sink).unwrap();
        dump(&Value::Int(42), &mut sink).unwrap();

        let mut cursor = std::io::Cursor::new(sink);
        let first = load(&mut cursor).unwrap();
        let arr = first.as_array().unwrap();
        assert_eq!(arr.get_int(0), Some(&Value::Int(1)));
        assert_eq!(arr.get_int(1), Some(&Value::Int(2)));
        assert_eq!(load(&mut cursor).unwrap(), Value::Int(42));
    }

    struct User {
        username: String,
    }

    struct UserHook;

    impl ObjectHook for UserHook {
        fn try_encode(&self, value: &dyn Any) -> crate::Result<Option<(String, Array)>> {
            let Some(user) = value.downcast_ref::<User>() else {
                return Ok(None);
            };
            let mut members = Array::new();
            members.insert("username", user.username.clone());
            Ok(Some(("WP_User".to_string(), members)))
        }

        fn decode(&self, object: PhpObject) -> crate::Result<Value> {
            let username = object.get("username")?.as_str().unwrap_or_default();
            Ok(Value::foreign(User {
                username: username.to_string(),
            }))
        }
    }

    #[test]
    fn test_object_hook_roundtrip() {
        let user = Value::foreign(User {
            username: "test".to_string(),
        });
        let opts = text_options().object_hook(UserHook);

        let encoded = dumps_with_options(&user, &opts).unwrap();
        assert_eq!(
            encoded,
            b"O:7:\"WP_User\":1:{s:8:\"username\";s:4:\"test\";}".to_vec()
        );

        let decoded = loads_with_options(encoded, &opts).unwrap();
        let Value::Foreign(foreign) = decoded else {
            panic!("expected hook-built value");
        };
        assert_eq!(foreign.downcast_ref::<User>().unwrap().username, "test");
    }

    #[test]
    fn test_declining_hook_is_unsupported() {
        struct Other;
        let opts = Options::new().object_hook(UserHook);
        let err = dumps_with_options(&Value::foreign(Other), &opts).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedType("foreign value"));
    }

    #[test]
    fn test_hook_error_propagates_unchanged() {
        struct FailingHook;
        impl ObjectHook for FailingHook {
            fn decode(&self, object: PhpObject) -> crate::Result<Value> {
                Err(PhpSerializeError::from(ErrorKind::MissingMember {
                    class: object.name().to_string(),
                    member: "id".to_string(),
                }))
            }
        }

        let opts = Options::new().object_hook(FailingHook);
        let err = loads_with_options(b"O:8:\"stdClass\":0:{}", &opts).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MissingMember {
                class: "stdClass".to_string(),
                member: "id".to_string(),
            }
        );
    }
}
