//! JSON rules shared by every operation.
//!
//! # Design
//! Serialization is plain `serde_json`. Deserialization goes through
//! `CaseInsensitive`, a `Deserializer` over `serde_json::Value` that
//! rewrites object keys to the target struct's declared wire key when they
//! differ only by ASCII case. Keys are rewritten only where serde asks for a
//! struct, so opaque `serde_json::Value` fields and enum tokens pass through
//! untouched. The module is stateless and safe to call concurrently.
//!
//! `serde_json` runs with `arbitrary_precision`, so numbers keep their exact
//! text until the target type reads them. Scalars are handed to the `Value`'s
//! typed methods; only `Decimal` and opaque values see the raw number.

use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Serialize};
use serde_json::Value;

/// Serialize a request body.
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Deserialize `text`, returning `Ok(None)` when the document is a bare `null`.
pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<Option<T>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_null() {
        return Ok(None);
    }
    T::deserialize(CaseInsensitive(value)).map(Some)
}

struct CaseInsensitive(Value);

impl<'de> IntoDeserializer<'de, serde_json::Error> for CaseInsensitive {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

/// Map `key` onto the declared field it matches ignoring ASCII case.
fn canonical_key(key: String, fields: &'static [&'static str]) -> String {
    if fields.contains(&key.as_str()) {
        return key;
    }
    fields
        .iter()
        .find(|field| field.eq_ignore_ascii_case(&key))
        .map_or(key, |field| (*field).to_string())
}

fn visit_object<'de, V, I>(entries: I, visitor: V) -> Result<V::Value, serde_json::Error>
where
    V: Visitor<'de>,
    I: Iterator<Item = (String, CaseInsensitive)>,
{
    let mut access = MapDeserializer::<_, serde_json::Error>::new(entries);
    let value = visitor.visit_map(&mut access)?;
    access.end()?;
    Ok(value)
}

/// Delegate scalar requests to the wrapped `Value`, which parses exact
/// number text into the requested primitive.
macro_rules! forward_to_value {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                self.0.$method(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for CaseInsensitive {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => {
                let mut access =
                    SeqDeserializer::<_, serde_json::Error>::new(items.into_iter().map(CaseInsensitive));
                let value = visitor.visit_seq(&mut access)?;
                access.end()?;
                Ok(value)
            }
            Value::Object(map) => visit_object(
                map.into_iter().map(|(key, value)| (key, CaseInsensitive(value))),
                visitor,
            ),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visit_object(
                map.into_iter()
                    .map(|(key, value)| (canonical_key(key, fields), CaseInsensitive(value))),
                visitor,
            ),
            other => CaseInsensitive(other).deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(CaseInsensitive(other)),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_value! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char deserialize_str
        deserialize_string deserialize_bytes deserialize_byte_buf deserialize_unit
    }

    forward_to_deserialize_any! {
        unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}
