//! Dynamic values the decoder reads from and writes into.
//!
//! Every [`Value`] carries enough type information to recover its [`Shape`]: scalars carry
//! their width, containers carry their element shapes, records carry their [`RecordType`].
//! Wrappers:
//! - [`Value::Optional`] is pointer-like and may be unset;
//! - [`Value::Any`] is a polymorphic slot, `None` meaning nil.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::custom::CustomValue;
use crate::shape::{FloatWidth, IntWidth, Kind, RecordType, Shape};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64, IntWidth),
    UInt(u64, IntWidth),
    Float(f64, FloatWidth),
    Str(String),
    Custom(CustomValue),
    Seq(Sequence),
    Map(Map),
    Record(Record),
    Optional(Optional),
    Any(Option<Box<Value>>),
}

impl Value {
    /// An empty polymorphic slot.
    pub const NIL: Value = Value::Any(None);

    /// Wrap `value` in a polymorphic slot, unless it already is one.
    pub fn any(value: Value) -> Value {
        match value {
            Value::Any(_) => value,
            other => Value::Any(Some(Box::new(other))),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Bool(_) => Shape::Bool,
            Value::Int(_, w) => Shape::Int(*w),
            Value::UInt(_, w) => Shape::UInt(*w),
            Value::Float(_, w) => Shape::Float(*w),
            Value::Str(_) => Shape::Str,
            Value::Custom(c) => Shape::Custom(c.scalar_type().clone()),
            Value::Seq(s) => Shape::Seq(Box::new(s.elem.clone())),
            Value::Map(m) => Shape::Map(Box::new(m.key.clone()), Box::new(m.value.clone())),
            Value::Record(r) => Shape::Record(r.ty.clone()),
            Value::Optional(o) => Shape::Optional(Box::new(o.inner.clone())),
            Value::Any(_) => Shape::Any,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(..) => Kind::Int,
            Value::UInt(..) => Kind::UInt,
            Value::Float(..) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Custom(_) => Kind::Custom,
            Value::Seq(_) => Kind::Seq,
            Value::Map(_) => Kind::Map,
            Value::Record(_) => Kind::Record,
            Value::Optional(_) => Kind::Optional,
            Value::Any(_) => Kind::Any,
        }
    }

    /// Follow optional and any indirections down to a concrete value.
    ///
    /// Returns `None` when an unset wrapper is reached.
    pub fn resolve(&self) -> Option<&Value> {
        let mut current = self;
        loop {
            match current {
                Value::Optional(o) => current = o.value.as_deref()?,
                Value::Any(slot) => current = slot.as_deref()?,
                other => return Some(other),
            }
        }
    }

    pub fn is_nil(&self) -> bool {
        self.resolve().is_none()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.resolve()? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Signed view of an integer value; unsigned values are accepted when they fit.
    pub fn as_i64(&self) -> Option<i64> {
        match self.resolve()? {
            Value::Int(v, _) => Some(*v),
            Value::UInt(v, _) => i64::try_from(*v).ok(),
            Value::Custom(c) => c.repr().as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.resolve()? {
            Value::UInt(v, _) => Some(*v),
            Value::Int(v, _) => u64::try_from(*v).ok(),
            Value::Custom(c) => c.repr().as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.resolve()? {
            Value::Float(v, _) => Some(*v),
            Value::Custom(c) => c.repr().as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.resolve()? {
            Value::Str(s) => Some(s),
            Value::Custom(c) => c.repr().as_str(),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self.resolve()? {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self.resolve()? {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self.resolve()? {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self.resolve()? {
            Value::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// Look up `key` in a map (string key) or a record (declared field name).
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.resolve()? {
            Value::Map(m) => m.get_str(key),
            Value::Record(r) => r.get(key),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::NIL
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v, IntWidth::W64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64, IntWidth::W32)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v, IntWidth::W64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v, FloatWidth::F64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Scalar map key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
}

impl Key {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The key as a 64-bit scalar value.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(v) => Value::Int(*v, IntWidth::W64),
            Key::UInt(v) => Value::UInt(*v, IntWidth::W64),
            Key::Str(s) => Value::Str(s.clone()),
        }
    }

    /// Build a key from a scalar value. Floats and containers cannot be keys.
    pub fn from_scalar(value: &Value) -> Option<Key> {
        match value.resolve()? {
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Int(v, _) => Some(Key::Int(*v)),
            Value::UInt(v, _) => Some(Key::UInt(*v)),
            Value::Str(s) => Some(Key::Str(s.clone())),
            Value::Custom(c) => Key::from_scalar(c.repr()),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Int(v) => write!(f, "{v}"),
            Key::UInt(v) => write!(f, "{v}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_owned())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

/// Ordered list of values sharing one element shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub(crate) elem: Shape,
    pub(crate) items: Vec<Value>,
}

impl Sequence {
    pub fn new(elem: Shape, items: Vec<Value>) -> Self {
        Self { elem, items }
    }

    pub fn elem_shape(&self) -> &Shape {
        &self.elem
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

/// Key/value container. An unset map (`entries == None`) is the zero value and is created
/// on first insert.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    pub(crate) key: Shape,
    pub(crate) value: Shape,
    pub(crate) entries: Option<BTreeMap<Key, Value>>,
}

impl Map {
    /// An empty, set map.
    pub fn new(key: Shape, value: Shape) -> Self {
        Self {
            key,
            value,
            entries: Some(BTreeMap::new()),
        }
    }

    pub fn unset(key: Shape, value: Shape) -> Self {
        Self {
            key,
            value,
            entries: None,
        }
    }

    pub fn key_shape(&self) -> &Shape {
        &self.key
    }

    pub fn value_shape(&self) -> &Shape {
        &self.value
    }

    pub fn is_unset(&self) -> bool {
        self.entries.is_none()
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.as_ref()?.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.get(&Key::Str(key.to_owned()))
    }

    /// Insert, creating the map if it was unset.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        self.entries_mut().insert(key, value)
    }

    /// Entries for writing, creating the map if it was unset.
    pub fn entries_mut(&mut self) -> &mut BTreeMap<Key, Value> {
        self.entries.get_or_insert_with(BTreeMap::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().flat_map(|e| e.iter())
    }

    pub fn into_entries(self) -> BTreeMap<Key, Value> {
        self.entries.unwrap_or_default()
    }
}

/// Record instance: one value per declared field, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub(crate) ty: Arc<RecordType>,
    pub(crate) fields: Vec<Value>,
}

impl Record {
    /// Assemble a record from values given in declaration order.
    pub fn from_parts(ty: Arc<RecordType>, fields: Vec<Value>) -> Self {
        Self { ty, fields }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let pos = self.ty.position(name)?;
        self.fields.get(pos)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let pos = self.ty.position(name)?;
        self.fields.get_mut(pos)
    }

    /// Replace the field declared as `name`. Returns `false` if there is no such field.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }
}

/// Pointer-like wrapper around a value of `inner` shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Optional {
    pub(crate) inner: Shape,
    pub(crate) value: Option<Box<Value>>,
}

impl Optional {
    pub fn none(inner: Shape) -> Self {
        Self { inner, value: None }
    }

    pub fn some(inner: Shape, value: Value) -> Self {
        Self {
            inner,
            value: Some(Box::new(value)),
        }
    }

    pub fn inner_shape(&self) -> &Shape {
        &self.inner
    }

    pub fn get(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    pub fn into_inner(self) -> Option<Value> {
        self.value.map(|b| *b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_follows_wrappers() {
        let inner = Value::from(7i64);
        let wrapped = Value::any(Value::Optional(Optional::some(Shape::Int(IntWidth::W64), inner.clone())));
        assert_eq!(wrapped.resolve(), Some(&inner));
        assert_eq!(wrapped.as_i64(), Some(7));

        let nil = Value::Optional(Optional::none(Shape::Str));
        assert!(nil.is_nil());
        assert!(Value::NIL.is_nil());
    }

    #[test]
    fn unset_map_is_created_on_insert() {
        let mut map = Map::unset(Shape::Str, Shape::Any);
        assert!(map.is_unset());
        assert_eq!(map.iter().count(), 0);
        map.insert(Key::from("a"), Value::any(Value::from(true)));
        assert!(!map.is_unset());
        assert_eq!(map.get_str("a").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn keys_come_from_scalars_only() {
        assert_eq!(Key::from_scalar(&Value::from("x")), Some(Key::Str("x".into())));
        assert_eq!(Key::from_scalar(&Value::from(3i32)), Some(Key::Int(3)));
        assert_eq!(Key::from_scalar(&Value::from(1.5)), None);
        assert_eq!(Key::from_scalar(&Value::NIL), None);
    }

    #[test]
    fn shape_of_value_round_trips_kind() {
        let seq = Value::Seq(Sequence::new(Shape::Str, vec![Value::from("a")]));
        assert_eq!(seq.shape(), Shape::seq_of(Shape::Str));
        assert_eq!(seq.kind(), Kind::Seq);
        assert_eq!(Value::from(1u64).shape(), Shape::UInt(IntWidth::W64));
    }
}
