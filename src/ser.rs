//! `serde::Serialize` for dynamic values, so decode results can be handed to any serde
//! format (JSON, YAML, ...) for inspection or transport.
//!
//! - Records serialize as maps keyed by declared field name.
//! - Unset maps, unset optionals and nil any-slots serialize as `none`.
//! - Custom scalars serialize as their representation.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::shape::FloatWidth;
use crate::value::{Key, Map, Record, Sequence, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(v, _) => serializer.serialize_i64(*v),
            Value::UInt(v, _) => serializer.serialize_u64(*v),
            Value::Float(v, FloatWidth::F32) => serializer.serialize_f32(*v as f32),
            Value::Float(v, FloatWidth::F64) => serializer.serialize_f64(*v),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Custom(c) => c.repr().serialize(serializer),
            Value::Seq(seq) => seq.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Record(record) => record.serialize(serializer),
            Value::Optional(opt) => match opt.get() {
                Some(inner) => serializer.serialize_some(inner),
                None => serializer.serialize_none(),
            },
            Value::Any(Some(held)) => held.serialize(serializer),
            Value::Any(None) => serializer.serialize_none(),
        }
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.items() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_unset() {
            return serializer.serialize_none();
        }
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let defs = self.record_type().fields();
        let mut map = serializer.serialize_map(Some(defs.len()))?;
        for (def, value) in defs.iter().zip(self.fields()) {
            map.serialize_entry(def.name(), value)?;
        }
        map.end()
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Bool(b) => serializer.serialize_bool(*b),
            Key::Int(v) => serializer.serialize_i64(*v),
            Key::UInt(v) => serializer.serialize_u64(*v),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}
