//! Type descriptors driving the decoder.
//!
//! A [`Shape`] describes what a value slot may hold. The decoder never looks at Rust types
//! directly: it inspects the [`Kind`] of the source value and of the destination slot and
//! routes on the pair. Record layouts are described by [`RecordType`], built once per
//! concrete type and shared behind an `Arc`.

use std::fmt;
use std::sync::{Arc, RwLock};

use ahash::AHashMap;

use crate::custom::{CustomValue, ScalarTypeRef};
use crate::value::{Map, Optional, Record, Sequence, Value};

/// Structural kind used for dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    UInt,
    Float,
    Str,
    Custom,
    Seq,
    Map,
    Record,
    Optional,
    Any,
}

impl Kind {
    /// True for leaf kinds handled by the scalar coercer.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Kind::Bool | Kind::Int | Kind::UInt | Kind::Float | Kind::Str | Kind::Custom
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::UInt | Kind::Float)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "bool",
            Kind::Int => "integer",
            Kind::UInt => "unsigned integer",
            Kind::Float => "float",
            Kind::Str => "string",
            Kind::Custom => "custom scalar",
            Kind::Seq => "sequence",
            Kind::Map => "map",
            Kind::Record => "record",
            Kind::Optional => "optional",
            Kind::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    /// Wrap a signed value to this width, the way an `as` cast does.
    pub fn truncate_signed(self, v: i64) -> i64 {
        match self {
            IntWidth::W8 => v as i8 as i64,
            IntWidth::W16 => v as i16 as i64,
            IntWidth::W32 => v as i32 as i64,
            IntWidth::W64 => v,
        }
    }

    /// Wrap an unsigned value to this width, the way an `as` cast does.
    pub fn truncate_unsigned(self, v: u64) -> u64 {
        match self {
            IntWidth::W8 => v as u8 as u64,
            IntWidth::W16 => v as u16 as u64,
            IntWidth::W32 => v as u32 as u64,
            IntWidth::W64 => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    pub fn round(self, v: f64) -> f64 {
        match self {
            FloatWidth::F32 => v as f32 as f64,
            FloatWidth::F64 => v,
        }
    }
}

/// Declared type of a value slot.
#[derive(Clone)]
pub enum Shape {
    /// Polymorphic slot that may hold any value at runtime.
    Any,
    Bool,
    Int(IntWidth),
    UInt(IntWidth),
    Float(FloatWidth),
    Str,
    Custom(ScalarTypeRef),
    Seq(Box<Shape>),
    /// Key shape, value shape.
    Map(Box<Shape>, Box<Shape>),
    Record(Arc<RecordType>),
    /// Pointer-like wrapper that may be unset.
    Optional(Box<Shape>),
}

impl Shape {
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Any => Kind::Any,
            Shape::Bool => Kind::Bool,
            Shape::Int(_) => Kind::Int,
            Shape::UInt(_) => Kind::UInt,
            Shape::Float(_) => Kind::Float,
            Shape::Str => Kind::Str,
            Shape::Custom(_) => Kind::Custom,
            Shape::Seq(_) => Kind::Seq,
            Shape::Map(..) => Kind::Map,
            Shape::Record(_) => Kind::Record,
            Shape::Optional(_) => Kind::Optional,
        }
    }

    /// `Map<string, any>`, the temporary used when records are unwrapped into maps.
    pub fn string_map_of_any() -> Shape {
        Shape::Map(Box::new(Shape::Str), Box::new(Shape::Any))
    }

    pub fn seq_of(elem: Shape) -> Shape {
        Shape::Seq(Box::new(elem))
    }

    pub fn map_of(key: Shape, value: Shape) -> Shape {
        Shape::Map(Box::new(key), Box::new(value))
    }

    pub fn optional_of(inner: Shape) -> Shape {
        Shape::Optional(Box::new(inner))
    }

    /// The zero value of this shape: empty scalars, unset maps and optionals, empty
    /// sequences, records with every field zeroed, and a nil any-slot.
    pub fn zero(&self) -> Value {
        match self {
            Shape::Any => Value::Any(None),
            Shape::Bool => Value::Bool(false),
            Shape::Int(w) => Value::Int(0, *w),
            Shape::UInt(w) => Value::UInt(0, *w),
            Shape::Float(w) => Value::Float(0.0, *w),
            Shape::Str => Value::Str(String::new()),
            Shape::Custom(ty) => Value::Custom(CustomValue::new(ty.clone(), ty.base().zero())),
            Shape::Seq(elem) => Value::Seq(Sequence::new((**elem).clone(), Vec::new())),
            Shape::Map(key, value) => Value::Map(Map::unset((**key).clone(), (**value).clone())),
            Shape::Record(ty) => {
                let fields = ty.fields.iter().map(|f| f.shape.zero()).collect();
                Value::Record(Record::from_parts(ty.clone(), fields))
            }
            Shape::Optional(inner) => Value::Optional(Optional::none((**inner).clone())),
        }
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Shape::Any, Shape::Any)
            | (Shape::Bool, Shape::Bool)
            | (Shape::Str, Shape::Str) => true,
            (Shape::Int(a), Shape::Int(b)) | (Shape::UInt(a), Shape::UInt(b)) => a == b,
            (Shape::Float(a), Shape::Float(b)) => a == b,
            (Shape::Custom(a), Shape::Custom(b)) => a.name() == b.name(),
            (Shape::Seq(a), Shape::Seq(b)) | (Shape::Optional(a), Shape::Optional(b)) => a == b,
            (Shape::Map(ak, av), Shape::Map(bk, bv)) => ak == bk && av == bv,
            (Shape::Record(a), Shape::Record(b)) => Arc::ptr_eq(a, b) || **a == **b,
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => f.write_str("any"),
            Shape::Bool => f.write_str("bool"),
            Shape::Int(w) => write!(f, "i{}", w.bits()),
            Shape::UInt(w) => write!(f, "u{}", w.bits()),
            Shape::Float(FloatWidth::F32) => f.write_str("f32"),
            Shape::Float(FloatWidth::F64) => f.write_str("f64"),
            Shape::Str => f.write_str("string"),
            Shape::Custom(ty) => f.write_str(ty.name()),
            Shape::Seq(elem) => write!(f, "Vec<{elem}>"),
            Shape::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Shape::Record(ty) => f.write_str(&ty.name),
            Shape::Optional(inner) => write!(f, "Option<{inner}>"),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({self})")
    }
}

/// One declared field of a record type.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    name: String,
    shape: Shape,
    tags: Vec<(String, String)>,
}

impl FieldDef {
    pub fn new<S: Into<String>>(name: S, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            tags: Vec::new(),
        }
    }

    /// Attach a tag annotation (`key` → `value`).
    pub fn tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Value of the tag annotation under `key`, if present.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Identifier used to match this field against the other side.
    ///
    /// With an empty `tag` the declared name is used. Otherwise the tag value is used, and a
    /// field without that annotation (or with an empty value) yields `None` and takes no part
    /// in matching.
    pub fn identifier(&self, tag: &str) -> Option<&str> {
        if tag.is_empty() {
            return Some(&self.name);
        }
        self.tag_value(tag).filter(|v| !v.is_empty())
    }
}

/// Destination identifier → field position, for one tag key.
#[derive(Debug, Default)]
pub struct FieldIndex {
    slots: AHashMap<String, usize>,
}

impl FieldIndex {
    pub fn get(&self, identifier: &str) -> Option<usize> {
        self.slots.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Layout of a record: ordered named fields with their tag annotations.
pub struct RecordType {
    name: String,
    fields: Vec<FieldDef>,
    /// Tag key → field index. Pure function of the layout, so entries never go stale.
    index_cache: RwLock<AHashMap<String, Arc<FieldIndex>>>,
}

impl RecordType {
    pub fn builder<S: Into<String>>(name: S) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Position of the field declared as `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Identifier → position table for `tag`, built on first use and cached.
    ///
    /// When two fields resolve to the same identifier the later one wins.
    pub fn field_index(&self, tag: &str) -> Arc<FieldIndex> {
        {
            let cache = self.index_cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(index) = cache.get(tag) {
                return index.clone();
            }
        }

        let mut slots = AHashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if let Some(id) = field.identifier(tag) {
                slots.insert(id.to_owned(), i);
            }
        }
        let built = Arc::new(FieldIndex { slots });

        let mut cache = self.index_cache.write().unwrap_or_else(|e| e.into_inner());
        cache.entry(tag.to_owned()).or_insert(built).clone()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

pub struct RecordTypeBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl RecordTypeBuilder {
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Arc<RecordType> {
        Arc::new(RecordType {
            name: self.name,
            fields: self.fields,
            index_cache: RwLock::new(AHashMap::new()),
        })
    }
}
