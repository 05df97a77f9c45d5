//! Bridge between Rust types and the dynamic [`Value`] model.
//!
//! [`Reflect`] is implemented for the primitive types, `String`, `Vec`, `Option`, `Box`,
//! `HashMap`/`BTreeMap`, `std::time::Duration` and [`Value`] itself (the polymorphic slot).
//! Structs opt in with the [`record!`](crate::record) macro.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::time::Duration;

use num_traits::NumCast;

use crate::custom::{CustomValue, duration_type};
use crate::error::{CoercionError, Error};
use crate::path::{Path, PathSegment};
use crate::shape::{FloatWidth, IntWidth, Shape};
use crate::value::{Key, Map, Optional, Sequence, Value};

/// A Rust type with a [`Shape`] and a lossless mapping to and from [`Value`].
pub trait Reflect: Sized {
    /// Declared shape of values of this type.
    fn shape() -> Shape;

    /// Deep copy of `self` as a dynamic value.
    fn to_value(&self) -> Value;

    /// Rebuild `Self` from a value of [`Reflect::shape`].
    fn from_value(value: Value) -> Result<Self, Error>;
}

/// Types usable as map keys.
pub trait ReflectKey: Sized {
    fn key_shape() -> Shape;
    fn to_key(&self) -> Key;
    fn from_key(key: Key) -> Result<Self, Error>;
}

/// Drop any-slot wrappers around a concrete value.
fn unwrap_any(value: Value) -> Value {
    match value {
        Value::Any(Some(inner)) => unwrap_any(*inner),
        other => other,
    }
}

fn unexpected(expected: Shape, found: &Value) -> Error {
    Error::mismatch(expected, found.shape(), &Path::root())
}

fn out_of_range(expected: Shape, found: impl std::fmt::Display) -> Error {
    let reason = format!("{found} is out of range");
    Error::from_coercion(CoercionError::new(&found, &expected, reason), &Path::root())
}

impl Reflect for bool {
    fn shape() -> Shape {
        Shape::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match unwrap_any(value) {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

macro_rules! reflect_signed {
    ($($ty:ty => $width:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::Int(IntWidth::$width)
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64, IntWidth::$width)
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                match unwrap_any(value) {
                    Value::Int(v, _) => <$ty as NumCast>::from(v).ok_or_else(|| out_of_range(Self::shape(), v)),
                    other => Err(unexpected(Self::shape(), &other)),
                }
            }
        }

        impl ReflectKey for $ty {
            fn key_shape() -> Shape {
                <$ty as Reflect>::shape()
            }

            fn to_key(&self) -> Key {
                Key::Int(*self as i64)
            }

            fn from_key(key: Key) -> Result<Self, Error> {
                <$ty as Reflect>::from_value(key.to_value())
            }
        }
    )*};
}

macro_rules! reflect_unsigned {
    ($($ty:ty => $width:ident),* $(,)?) => {$(
        impl Reflect for $ty {
            fn shape() -> Shape {
                Shape::UInt(IntWidth::$width)
            }

            fn to_value(&self) -> Value {
                Value::UInt(*self as u64, IntWidth::$width)
            }

            fn from_value(value: Value) -> Result<Self, Error> {
                match unwrap_any(value) {
                    Value::UInt(v, _) => <$ty as NumCast>::from(v).ok_or_else(|| out_of_range(Self::shape(), v)),
                    other => Err(unexpected(Self::shape(), &other)),
                }
            }
        }

        impl ReflectKey for $ty {
            fn key_shape() -> Shape {
                <$ty as Reflect>::shape()
            }

            fn to_key(&self) -> Key {
                Key::UInt(*self as u64)
            }

            fn from_key(key: Key) -> Result<Self, Error> {
                <$ty as Reflect>::from_value(key.to_value())
            }
        }
    )*};
}

reflect_signed!(i8 => W8, i16 => W16, i32 => W32, i64 => W64, isize => W64);
reflect_unsigned!(u8 => W8, u16 => W16, u32 => W32, u64 => W64, usize => W64);

impl Reflect for f32 {
    fn shape() -> Shape {
        Shape::Float(FloatWidth::F32)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64, FloatWidth::F32)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match unwrap_any(value) {
            Value::Float(v, _) => Ok(v as f32),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

impl Reflect for f64 {
    fn shape() -> Shape {
        Shape::Float(FloatWidth::F64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self, FloatWidth::F64)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match unwrap_any(value) {
            Value::Float(v, _) => Ok(v),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

impl Reflect for String {
    fn shape() -> Shape {
        Shape::Str
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match unwrap_any(value) {
            Value::Str(s) => Ok(s),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

impl ReflectKey for String {
    fn key_shape() -> Shape {
        Shape::Str
    }

    fn to_key(&self) -> Key {
        Key::Str(self.clone())
    }

    fn from_key(key: Key) -> Result<Self, Error> {
        match key {
            Key::Str(s) => Ok(s),
            other => Err(unexpected(Shape::Str, &other.to_value())),
        }
    }
}

impl ReflectKey for bool {
    fn key_shape() -> Shape {
        Shape::Bool
    }

    fn to_key(&self) -> Key {
        Key::Bool(*self)
    }

    fn from_key(key: Key) -> Result<Self, Error> {
        bool::from_value(key.to_value())
    }
}

/// Keys of any scalar kind, kept as they are.
impl ReflectKey for Key {
    fn key_shape() -> Shape {
        Shape::Any
    }

    fn to_key(&self) -> Key {
        self.clone()
    }

    fn from_key(key: Key) -> Result<Self, Error> {
        Ok(key)
    }
}

/// Nanosecond count behind the `Duration` custom scalar, so strings like `"90s"` decode.
///
/// Durations past `i64::MAX` nanoseconds saturate.
impl Reflect for Duration {
    fn shape() -> Shape {
        Shape::Custom(duration_type())
    }

    fn to_value(&self) -> Value {
        let nanos = i64::try_from(self.as_nanos()).unwrap_or(i64::MAX);
        Value::Custom(CustomValue::new(duration_type(), Value::Int(nanos, IntWidth::W64)))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        let repr = match unwrap_any(value) {
            Value::Custom(c) if c.scalar_type().name() == duration_type().name() => c.into_repr(),
            other => return Err(unexpected(Self::shape(), &other)),
        };
        match repr {
            Value::Int(ns, _) => u64::try_from(ns)
                .map(Duration::from_nanos)
                .map_err(|_| out_of_range(Self::shape(), format!("{ns}ns"))),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::seq_of(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Seq(Sequence::new(T::shape(), self.iter().map(T::to_value).collect()))
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match unwrap_any(value) {
            Value::Seq(seq) => seq.into_items().into_iter().map(T::from_value).collect(),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::optional_of(T::shape())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => Value::Optional(Optional::some(T::shape(), v.to_value())),
            None => Value::Optional(Optional::none(T::shape())),
        }
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        match unwrap_any(value) {
            Value::Optional(opt) => opt.into_inner().map(T::from_value).transpose(),
            Value::Any(None) => Ok(None),
            other => Err(unexpected(Self::shape(), &other)),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        T::from_value(value).map(Box::new)
    }
}

fn map_to_value<'a, K, V, I>(entries: I) -> Value
where
    K: ReflectKey + 'a,
    V: Reflect + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    let mut map = Map::new(K::key_shape(), V::shape());
    for (k, v) in entries {
        map.insert(k.to_key(), v.to_value());
    }
    Value::Map(map)
}

fn map_from_value<K: ReflectKey, V: Reflect, C: FromIterator<(K, V)>>(value: Value, shape: Shape) -> Result<C, Error> {
    match unwrap_any(value) {
        Value::Map(map) => map
            .into_entries()
            .into_iter()
            .map(|(k, v)| -> Result<(K, V), Error> { Ok((K::from_key(k)?, V::from_value(v)?)) })
            .collect(),
        other => Err(unexpected(shape, &other)),
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: ReflectKey + Eq + Hash,
    V: Reflect,
    S: BuildHasher + Default,
{
    fn shape() -> Shape {
        Shape::map_of(K::key_shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        map_to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        map_from_value(value, Self::shape())
    }
}

impl<K: ReflectKey + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::map_of(K::key_shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        map_to_value(self)
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        map_from_value(value, Self::shape())
    }
}

/// A `Value` field is an any-slot: it accepts whatever the source holds.
impl Reflect for Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn to_value(&self) -> Value {
        Value::any(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Error> {
        Ok(match value {
            Value::Any(Some(held)) => *held,
            Value::Any(None) => Value::NIL,
            other => other,
        })
    }
}

// Support code for `record!`.

#[doc(hidden)]
pub fn field_shape<R, T, F>(_field: F) -> Shape
where
    T: Reflect,
    F: Fn(&R) -> &T,
{
    T::shape()
}

#[doc(hidden)]
pub fn record_fields(value: Value, expected: &str) -> Result<std::vec::IntoIter<Value>, Error> {
    match unwrap_any(value) {
        Value::Record(record) if record.record_type().name() == expected => Ok(record.into_fields().into_iter()),
        other => Err(Error::mismatch(expected, other.shape(), &Path::root())),
    }
}

#[doc(hidden)]
pub fn next_field<T: Reflect>(fields: &mut std::vec::IntoIter<Value>, name: &str) -> Result<T, Error> {
    let mut path = Path::root();
    path.push(PathSegment::field(name));
    let value = fields
        .next()
        .ok_or_else(|| Error::mismatch(T::shape(), "missing field", &path))?;
    T::from_value(value).map_err(|err| match err {
        Error::TypeMismatch { expected, found, reason, path: inner } if inner.is_empty() => Error::TypeMismatch {
            expected,
            found,
            reason,
            path,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn primitives_round_trip() {
        assert_eq!(i16::from_value((-7i16).to_value()), Ok(-7));
        assert_eq!(u8::from_value(200u8.to_value()), Ok(200));
        assert_eq!(f32::from_value(1.5f32.to_value()), Ok(1.5));
        assert_eq!(String::from_value("x".to_owned().to_value()), Ok("x".to_owned()));
        assert_eq!(<Vec<Option<bool>>>::from_value(vec![Some(true), None].to_value()), Ok(vec![Some(true), None]));
    }

    #[test]
    fn narrowing_reports_out_of_range() {
        let err = i8::from_value(Value::Int(300, IntWidth::W64)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(u32::from_value(Value::Str("1".into())).is_err());
    }

    #[test]
    fn maps_keep_key_shapes() {
        let map: BTreeMap<u16, String> = BTreeMap::from([(1, "a".to_owned()), (2, "b".to_owned())]);
        let value = map.to_value();
        assert_eq!(value.shape(), <BTreeMap<u16, String>>::shape());
        assert_eq!(value.as_map().and_then(|m| m.get(&Key::UInt(2))).and_then(Value::as_str), Some("b"));
        assert_eq!(BTreeMap::<u16, String>::from_value(value), Ok(map));
    }

    #[test]
    fn durations_travel_as_custom_scalars() {
        let d = Duration::from_millis(1500);
        let value = d.to_value();
        assert_eq!(value.as_custom().map(|c| c.scalar_type().name()), Some("Duration"));
        assert_eq!(value.as_i64(), Some(1_500_000_000));
        assert_eq!(Duration::from_value(value), Ok(d));

        let negative = Value::Custom(CustomValue::new(duration_type(), Value::Int(-1, IntWidth::W64)));
        assert!(Duration::from_value(negative).is_err());
    }

    #[test]
    fn value_is_an_any_slot() {
        assert_eq!(Value::from(3i64).to_value(), Value::any(Value::from(3i64)));
        assert_eq!(Value::from_value(Value::NIL), Ok(Value::NIL));
        assert_eq!(Value::from_value(Value::any(Value::from("s"))), Ok(Value::from("s")));
    }
}
