//! Field correspondence for record ↔ record, record → map and map → record.
//!
//! Fields are matched by identifier: the value of the decode tag when one is given (fields
//! without that annotation take no part), otherwise the declared field name. Destination
//! lookups go through the per-type [`FieldIndex`](crate::shape::FieldIndex) cache.

use tracing::trace;

use crate::decoder::Decoder;
use crate::error::Error;
use crate::path::PathSegment;
use crate::value::{Key, Map, Record, Value};

impl Decoder<'_> {
    pub(crate) fn record_to_record(&mut self, src: &Record, dst: &mut Record) -> Result<(), Error> {
        let index = dst.ty.field_index(self.tag);

        for (def, value) in src.ty.fields().iter().zip(&src.fields) {
            let Some(id) = def.identifier(self.tag) else {
                continue;
            };
            let Some(pos) = self.lookup(index.get(id), id, src.ty.name())? else {
                continue;
            };
            self.write_field(dst, pos, id, value)?;
        }
        Ok(())
    }

    /// Map keys must be strings to name a field.
    pub(crate) fn map_to_record(&mut self, src: &Map, dst: &mut Record) -> Result<(), Error> {
        let index = dst.ty.field_index(self.tag);

        for (key, value) in src.iter() {
            let Key::Str(id) = key else {
                return Err(Error::mismatch("string key", key.to_value().shape(), &self.path));
            };
            let Some(pos) = self.lookup(index.get(id), id, "map")? else {
                continue;
            };
            self.write_field(dst, pos, id, value)?;
        }
        Ok(())
    }

    /// Every identified field becomes an entry; the destination map is created if unset.
    ///
    /// When the map holds `any` values each field is materialized from its runtime shape,
    /// so nested records stay records unless `UNWRAP_STRUCT_TO_MAP` is set.
    pub(crate) fn record_to_map(&mut self, src: &Record, dst: &mut Map) -> Result<(), Error> {
        let key_shape = dst.key.clone();
        let value_shape = dst.value.clone();
        let entries = dst.entries_mut();

        for (def, value) in src.ty.fields().iter().zip(&src.fields) {
            let Some(id) = def.identifier(self.tag) else {
                continue;
            };
            let (k, v) = self.at(PathSegment::field(id), |this| {
                let k = this.convert_key(&Key::Str(id.to_owned()), &key_shape)?;
                let mut slot = value_shape.zero();
                this.decode(value, &mut slot)?;
                Ok((k, slot))
            })?;
            entries.insert(k, v);
        }
        Ok(())
    }

    /// Apply the destination-presence policy to a field lookup.
    ///
    /// Returns:
    /// - `Ok(Some(pos))` when the destination has the field;
    /// - `Ok(None)` when it does not and unmatched fields are skipped;
    /// - `Err(DestinationFieldNotFound)` when unmatched fields are not allowed.
    fn lookup(&self, found: Option<usize>, id: &str, origin: &str) -> Result<Option<usize>, Error> {
        match found {
            Some(pos) => Ok(Some(pos)),
            None if self.options.strong_found_dst() => Err(Error::field_not_found(id, &self.path)),
            None => {
                trace!(field = id, origin, path = %self.path, "no destination field, skipping");
                Ok(None)
            }
        }
    }

    fn write_field(&mut self, dst: &mut Record, pos: usize, id: &str, value: &Value) -> Result<(), Error> {
        let Some(slot) = dst.fields.get_mut(pos) else {
            return Err(Error::field_not_writable(id, &self.path));
        };
        self.at(PathSegment::field(id), |this| this.decode(value, slot))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::ErrorKind;
    use crate::options::{DecodeFlags, Options};
    use crate::shape::{FieldDef, IntWidth, RecordType, Shape};
    use crate::value::{Key, Map, Record, Value};
    use crate::decode_value;

    fn pair_type() -> Arc<RecordType> {
        RecordType::builder("Pair")
            .field(FieldDef::new("left", Shape::Str).tag("kv", "l"))
            .field(FieldDef::new("right", Shape::Int(IntWidth::W64)).tag("kv", "r"))
            .build()
    }

    #[test]
    fn truncated_record_storage_is_not_writable() {
        let ty = pair_type();
        let src = ty.clone();
        let source = Value::Record(Record::from_parts(src, vec![Value::from("a"), Value::from(1i64)]));
        let mut dst = Value::Record(Record::from_parts(ty, vec![Value::from("")]));
        let err = decode_value(&source, &mut dst, "kv", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DestinationFieldNotWritable);
        assert!(matches!(err, crate::Error::DestinationFieldNotWritable { ref field, .. } if field == "r"));
    }

    #[test]
    fn non_string_map_keys_cannot_name_fields() {
        let mut src = Map::new(Shape::Int(IntWidth::W64), Shape::Str);
        src.insert(Key::Int(1), Value::from("x"));
        let mut dst = Shape::Record(pair_type()).zero();
        let err = decode_value(&Value::Map(src), &mut dst, "kv", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn unmatched_map_key_follows_presence_policy() {
        let mut src = Map::new(Shape::Str, Shape::Any);
        src.insert(Key::from("l"), Value::any(Value::from("left")));
        src.insert(Key::from("extra"), Value::any(Value::from(true)));

        let mut lenient = Shape::Record(pair_type()).zero();
        decode_value(&Value::Map(src.clone()), &mut lenient, "kv", &Options::default()).unwrap();
        assert_eq!(lenient.get("left").and_then(Value::as_str), Some("left"));

        let mut strict = Shape::Record(pair_type()).zero();
        let err = decode_value(
            &Value::Map(src),
            &mut strict,
            "kv",
            &DecodeFlags::STRONG_FOUND_DST.into(),
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::DestinationFieldNotFound { ref field, .. } if field == "extra"));
    }

    #[test]
    fn record_into_int_keyed_map_coerces_identifiers() {
        let ty = RecordType::builder("Codes")
            .field(FieldDef::new("ok", Shape::Str).tag("code", "200"))
            .field(FieldDef::new("missing", Shape::Str).tag("code", "404"))
            .build();
        let src = Value::Record(Record::from_parts(ty, vec![Value::from("OK"), Value::from("Not Found")]));
        let mut dst = Value::Map(Map::unset(Shape::UInt(IntWidth::W16), Shape::Str));
        decode_value(&src, &mut dst, "code", &Options::default()).unwrap();
        let map = dst.as_map().unwrap();
        assert_eq!(map.get(&Key::UInt(404)).and_then(Value::as_str), Some("Not Found"));
        assert_eq!(map.len(), 2);
    }
}
