//! Custom scalars: named types stored as a primitive representation, optionally able to
//! parse themselves from text.
//!
//! A custom scalar behaves like a newtype over one of the primitive shapes (its *base*).
//! When text is coerced into it, its [`ScalarType::parse`] capability is preferred over the
//! base shape's literal parser. [`DurationType`] is the built-in example, used for
//! `std::time::Duration`.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::parse_scalars::parse_duration;
use crate::shape::{IntWidth, Shape};
use crate::value::Value;

/// Descriptor of a custom scalar type.
pub trait ScalarType: fmt::Debug + Send + Sync + 'static {
    /// Type name; two custom scalars are the same type when their names are equal.
    fn name(&self) -> &str;

    /// Primitive shape of the stored representation.
    fn base(&self) -> Shape;

    /// Parse capability. `None` means the type cannot parse text and the base shape's
    /// literal parser is used instead; `Some(Err(reason))` is a failed parse.
    ///
    /// A successful parse returns a value of the base shape.
    fn parse(&self, _text: &str) -> Option<Result<Value, String>> {
        None
    }

    /// Whether integer and float sources convert directly into the base representation.
    fn accepts_numbers(&self) -> bool {
        self.base().kind().is_numeric()
    }
}

pub type ScalarTypeRef = Arc<dyn ScalarType>;

/// Instance of a custom scalar.
#[derive(Clone)]
pub struct CustomValue {
    ty: ScalarTypeRef,
    repr: Box<Value>,
}

impl CustomValue {
    pub fn new(ty: ScalarTypeRef, repr: Value) -> Self {
        Self {
            ty,
            repr: Box::new(repr),
        }
    }

    pub fn scalar_type(&self) -> &ScalarTypeRef {
        &self.ty
    }

    pub fn repr(&self) -> &Value {
        &self.repr
    }

    pub fn into_repr(self) -> Value {
        *self.repr
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name() && self.repr == other.repr
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.ty.name(), self.repr)
    }
}

/// Signed nanosecond count that parses strings like `1h30m` or `250ms`.
#[derive(Debug)]
pub struct DurationType;

impl ScalarType for DurationType {
    fn name(&self) -> &str {
        "Duration"
    }

    fn base(&self) -> Shape {
        Shape::Int(IntWidth::W64)
    }

    fn parse(&self, text: &str) -> Option<Result<Value, String>> {
        Some(parse_duration(text).map(|ns| Value::Int(ns, IntWidth::W64)))
    }
}

/// Shared descriptor of [`DurationType`].
pub fn duration_type() -> ScalarTypeRef {
    static DURATION: OnceLock<ScalarTypeRef> = OnceLock::new();
    DURATION.get_or_init(|| Arc::new(DurationType)).clone()
}
