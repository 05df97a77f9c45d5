//! Structural decoder over dynamic values (no intermediate format).
//!
//! Supported pairings (source → destination):
//! - record → record, record → map, map → record (field resolution lives in `resolver`);
//! - map → map, sequence → sequence, scalar → scalar.
//!
//! Wrappers:
//! - Optional and any wrappers on the source are followed; a nil source (an unset wrapper or
//!   an unset map) zeroes the destination.
//! - An unset optional destination is allocated before it is written.
//! - An any destination receives a freshly materialized copy of the source.
//!
//! Policies:
//! - `STRONG_TYPE` turns every scalar kind mismatch into an error instead of a coercion.
//! - `UNWRAP_STRUCT_TO_MAP` makes records land in any-slots as `Map<string, any>`.
//! - Nesting deeper than `Options::max_depth` fails with `CyclicStructure`.

use tracing::debug;

use crate::coerce::coerce;
use crate::error::Error;
use crate::options::{DecodeFlags, Options};
use crate::path::{Path, PathSegment};
use crate::reflect::Reflect;
use crate::shape::Shape;
use crate::value::{Key, Map, Sequence, Value};

/// Decode `source` into `destination`, matching record fields by `tag` (or by declared name
/// when `tag` is empty).
///
/// The destination is replaced only when decoding succeeds.
///
/// ```rust
/// use std::collections::HashMap;
/// use reshape::{decode, DecodeFlags, Value};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct User {
///     name: String,
///     age: i64,
/// }
///
/// reshape::record! {
///     User {
///         name: json = "name",
///         age: json = "age",
///     }
/// }
///
/// let source: HashMap<String, Value> = HashMap::from([
///     ("name".to_owned(), Value::from("Ann")),
///     ("age".to_owned(), Value::from("41")),
/// ]);
/// let mut user = User::default();
/// decode(&source, &mut user, "json", DecodeFlags::empty()).unwrap();
/// assert_eq!(user, User { name: "Ann".into(), age: 41 });
/// ```
pub fn decode<S: Reflect, D: Reflect>(
    source: &S,
    destination: &mut D,
    tag: &str,
    flags: DecodeFlags,
) -> Result<(), Error> {
    decode_with_options(source, destination, tag, &Options::with_flags(flags))
}

/// Like [`decode`], with the full [`Options`].
pub fn decode_with_options<S: Reflect, D: Reflect>(
    source: &S,
    destination: &mut D,
    tag: &str,
    options: &Options,
) -> Result<(), Error> {
    let src = source.to_value();
    let mut dst = destination.to_value();
    Decoder::new(tag, options).decode(&src, &mut dst)?;
    *destination = D::from_value(dst)?;
    Ok(())
}

/// Decode between dynamic values.
///
/// `destination` must name a concrete container: an unset optional (a null reference) or
/// an empty any-slot fails with `InvalidDestination`. On error the destination may be left
/// partially written.
pub fn decode_value(source: &Value, destination: &mut Value, tag: &str, options: &Options) -> Result<(), Error> {
    match destination {
        Value::Optional(o) if o.is_none() => {
            return Err(Error::invalid_destination("destination is a null reference"));
        }
        Value::Any(None) => {
            return Err(Error::invalid_destination("destination has no concrete container"));
        }
        _ => {}
    }
    Decoder::new(tag, options).decode(source, destination)
}

/// State of one decode call.
pub(crate) struct Decoder<'a> {
    pub(crate) tag: &'a str,
    pub(crate) options: &'a Options,
    depth: usize,
    pub(crate) path: Path,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(tag: &'a str, options: &'a Options) -> Self {
        Self {
            tag,
            options,
            depth: 0,
            path: Path::root(),
        }
    }

    /// Recursion hub: every nested field, entry and element passes through here.
    pub(crate) fn decode(&mut self, src: &Value, dst: &mut Value) -> Result<(), Error> {
        self.depth += 1;
        let result = if self.depth > self.options.max_depth {
            debug!(depth = self.depth, path = %self.path, "decode depth ceiling reached");
            Err(Error::cyclic(self.depth, &self.path))
        } else {
            self.dispatch(src, dst)
        };
        self.depth -= 1;
        result
    }

    /// Run `f` with `seg` appended to the current path.
    pub(crate) fn at<T>(
        &mut self,
        seg: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.path.push(seg);
        let result = f(self);
        self.path.pop();
        result
    }

    fn dispatch(&mut self, src: &Value, dst: &mut Value) -> Result<(), Error> {
        let resolved = match src.resolve() {
            None => None,
            Some(Value::Map(m)) if m.is_unset() => None,
            Some(other) => Some(other),
        };
        let Some(resolved) = resolved else {
            *dst = dst.shape().zero();
            return Ok(());
        };

        if let Value::Optional(opt) = dst {
            let slot = opt.value.get_or_insert_with(|| Box::new(opt.inner.zero()));
            return self.decode(resolved, slot);
        }
        if let Value::Any(slot) = dst {
            let materialized = self.materialize(src)?;
            *slot = Some(Box::new(materialized));
            return Ok(());
        }

        match (resolved, dst) {
            (Value::Record(s), Value::Record(d)) => self.record_to_record(s, d),
            (Value::Record(s), Value::Map(d)) => self.record_to_map(s, d),
            (Value::Map(s), Value::Record(d)) => self.map_to_record(s, d),
            (Value::Map(s), Value::Map(d)) => self.map_to_map(s, d),
            (Value::Seq(s), Value::Seq(d)) => self.seq_to_seq(s, d),
            (s, d) if s.kind().is_scalar() && d.kind().is_scalar() => self.scalar_to_scalar(s, d),
            (s, d) => Err(Error::mismatch(d.shape(), s.shape(), &self.path)),
        }
    }

    /// Build a deep copy of `src` suitable for storing in an any-slot.
    ///
    /// The copy's shape follows the source: a record becomes `Map<string, any>` when
    /// `UNWRAP_STRUCT_TO_MAP` is set, a value held in an any-slot is copied with its own
    /// concrete shape, and everything else (optionals included) keeps its declared shape.
    /// No scalar coercion happens on the way in.
    fn materialize(&mut self, src: &Value) -> Result<Value, Error> {
        let shape = match src {
            Value::Record(_) if self.options.unwrap_struct_to_map() => Shape::string_map_of_any(),
            Value::Any(Some(held)) => held_shape(held),
            other => other.shape(),
        };
        let mut temporary = shape.zero();
        self.decode(src, &mut temporary)?;
        Ok(temporary)
    }

    /// Every source entry is processed; the destination map is created if unset.
    fn map_to_map(&mut self, src: &Map, dst: &mut Map) -> Result<(), Error> {
        let key_shape = dst.key.clone();
        let value_shape = dst.value.clone();
        let entries = dst.entries_mut();

        for (key, value) in src.iter() {
            let (k, v) = self.at(PathSegment::key(key.to_string()), |this| {
                let k = this.convert_key(key, &key_shape)?;
                let mut slot = value_shape.zero();
                this.decode(value, &mut slot)?;
                Ok((k, slot))
            })?;
            entries.insert(k, v);
        }
        Ok(())
    }

    /// The destination is rebuilt with exactly the source's length.
    fn seq_to_seq(&mut self, src: &Sequence, dst: &mut Sequence) -> Result<(), Error> {
        let mut items = Vec::with_capacity(src.items.len());
        for (i, item) in src.items.iter().enumerate() {
            let mut slot = dst.elem.zero();
            self.at(PathSegment::from(i), |this| this.decode(item, &mut slot))?;
            items.push(slot);
        }
        dst.items = items;
        Ok(())
    }

    fn scalar_to_scalar(&mut self, src: &Value, dst: &mut Value) -> Result<(), Error> {
        let target = dst.shape();
        if !same_scalar_type(src, &target) {
            if self.options.strong_type() {
                return Err(Error::mismatch(&target, src.shape(), &self.path));
            }
            debug!(from = %src.shape(), to = %target, path = %self.path, "coercing scalar");
        }
        *dst = coerce(src, &target).map_err(|err| Error::from_coercion(err, &self.path))?;
        Ok(())
    }

    /// Convert a map key to the destination key shape, following the scalar rules.
    pub(crate) fn convert_key(&mut self, key: &Key, shape: &Shape) -> Result<Key, Error> {
        match (shape, key) {
            (Shape::Any, _) | (Shape::Str, Key::Str(_)) => return Ok(key.clone()),
            _ => {}
        }
        let src = key.to_value();
        if !shape.kind().is_scalar() {
            return Err(Error::mismatch(shape, src.shape(), &self.path));
        }
        let mut slot = shape.zero();
        self.scalar_to_scalar(&src, &mut slot)?;
        Key::from_scalar(&slot).ok_or_else(|| Error::mismatch(shape, "map key", &self.path))
    }
}

/// Concrete shape of a value held in an any-slot.
fn held_shape(held: &Value) -> Shape {
    match held {
        Value::Any(Some(inner)) => held_shape(inner),
        other => other.shape(),
    }
}

/// Same scalar kind, and for custom scalars the same named type. Width differences are
/// conversions within one kind.
fn same_scalar_type(src: &Value, target: &Shape) -> bool {
    match (src, target) {
        (Value::Custom(c), Shape::Custom(ty)) => c.scalar_type().name() == ty.name(),
        _ => src.kind() == target.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::shape::IntWidth;
    use crate::value::Optional;

    const I64: Shape = Shape::Int(IntWidth::W64);

    fn any_seq(items: Vec<Value>) -> Value {
        Value::Seq(Sequence::new(Shape::Any, items.into_iter().map(Value::any).collect()))
    }

    #[test]
    fn null_destination_is_rejected() {
        let mut dst = Value::Optional(Optional::none(I64));
        let err = decode_value(&Value::from(1i64), &mut dst, "", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDestination);

        let mut empty = Value::NIL;
        let err = decode_value(&Value::from(1i64), &mut empty, "", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDestination);
    }

    #[test]
    fn set_optional_destination_is_written_through() {
        let mut dst = Value::Optional(Optional::some(I64, Value::from(0i64)));
        decode_value(&Value::from("12"), &mut dst, "", &Options::default()).unwrap();
        assert_eq!(dst.as_i64(), Some(12));
    }

    #[test]
    fn nil_source_zeroes_destination() {
        let mut dst = Value::from("keep me");
        decode_value(&Value::Optional(Optional::none(I64)), &mut dst, "", &Options::default()).unwrap();
        assert_eq!(dst, Value::from(""));
    }

    #[test]
    fn scalar_into_sequence_is_a_mismatch() {
        let mut dst = Value::Seq(Sequence::new(I64, vec![]));
        let err = decode_value(&Value::from(1i64), &mut dst, "", &Options::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn unset_map_source_is_nil() {
        let nil_map = Value::Map(Map::unset(Shape::Str, Shape::Any));

        let ty = crate::shape::RecordType::builder("Counter")
            .field(crate::shape::FieldDef::new("a", I64))
            .build();
        let mut record = Shape::Record(ty).zero();
        let mut prefilled = Map::new(Shape::Str, I64);
        prefilled.insert(Key::from("a"), Value::from(7i64));
        decode_value(&Value::Map(prefilled.clone()), &mut record, "", &Options::default()).unwrap();
        assert_eq!(record.get("a").and_then(Value::as_i64), Some(7));
        decode_value(&nil_map, &mut record, "", &Options::default()).unwrap();
        assert_eq!(record.get("a").and_then(Value::as_i64), Some(0));

        let mut filled = Value::Map(prefilled);
        decode_value(&nil_map, &mut filled, "", &Options::default()).unwrap();
        assert!(filled.as_map().is_some_and(Map::is_unset));

        let mut untouched = Value::Map(Map::unset(Shape::Str, Shape::Any));
        decode_value(&nil_map, &mut untouched, "", &Options::default()).unwrap();
        assert!(untouched.as_map().is_some_and(Map::is_unset));

        let mut held = Value::Seq(Sequence::new(Shape::Any, vec![]));
        decode_value(&any_seq(vec![nil_map]), &mut held, "", &Options::default()).unwrap();
        assert_eq!(held.as_seq().map(|s| s.items().to_vec()), Some(vec![Value::NIL]));
    }

    #[test]
    fn depth_ceiling_stops_deep_nesting() {
        let mut nested = any_seq(vec![Value::from(1i64)]);
        for _ in 0..20 {
            nested = any_seq(vec![nested]);
        }
        let mut dst = Value::Seq(Sequence::new(Shape::Any, vec![]));
        let options = crate::options! { max_depth: 16 };
        let err = decode_value(&nested, &mut dst, "", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicStructure);
        assert!(err.path().is_some_and(|p| !p.is_empty()));

        let mut dst = Value::Seq(Sequence::new(Shape::Any, vec![]));
        decode_value(&nested, &mut dst, "", &Options::default()).unwrap();
    }

    #[test]
    fn map_keys_convert_between_scalar_kinds() {
        let mut src = Map::new(Shape::Str, I64);
        src.insert(Key::from("7"), Value::from(70i64));
        let mut dst = Value::Map(Map::unset(I64, Shape::Str));
        decode_value(&Value::Map(src.clone()), &mut dst, "", &Options::default()).unwrap();
        let map = dst.as_map().unwrap();
        assert_eq!(map.get(&Key::Int(7)).and_then(Value::as_str), Some("70"));

        let mut strict = Value::Map(Map::unset(I64, I64));
        let err = decode_value(&Value::Map(src), &mut strict, "", &DecodeFlags::STRONG_TYPE.into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
