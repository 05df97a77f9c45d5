//! Scalar coercer: best-effort conversion between primitive kinds.
//!
//! Conversion table (source → target):
//! - → string: integers and floats render in canonical decimal form (shortest round-trip
//!   for floats), booleans as `true` / `false`, strings pass through.
//! - → integer: strings are parsed as integer literals and must fit the target width;
//!   other numbers convert with `as` semantics (truncation toward zero, wrapping to width,
//!   saturation for out-of-range floats); booleans become 0 / 1.
//! - → float: strings are parsed as float literals; numbers widen or narrow; booleans
//!   become 0 / 1.
//! - → bool: strings must be canonical literals (`1 t T TRUE true True` and the false
//!   counterparts); numbers convert only from exactly 0 or 1.
//! - → custom scalar: text goes through the type's own parser when it has one; numbers
//!   are accepted when the type takes numbers; everything else goes through the base shape.
//! - → any: the unwrapped source passes through unchanged.
//!
//! Containers never coerce.

use crate::custom::{CustomValue, ScalarTypeRef};
use crate::error::CoercionError;
use crate::parse_scalars::{parse_bool, parse_float, parse_int_signed, parse_int_unsigned};
use crate::shape::{FloatWidth, Shape};
use crate::value::{Optional, Value};

/// Convert a scalar `source` into a value of `target` shape.
///
/// Arguments:
/// - `source`: a scalar, or an optional / any wrapper around one. A nil source yields the
///   zero value of `target`.
/// - `target`: destination shape.
///
/// Returns:
/// - the converted value, or a [`CoercionError`] describing why the pairing was refused.
pub fn coerce(source: &Value, target: &Shape) -> Result<Value, CoercionError> {
    let Some(src) = source.resolve() else {
        return Ok(target.zero());
    };

    match target {
        Shape::Any => return Ok(src.clone()),
        Shape::Optional(inner) => {
            let value = coerce(src, inner)?;
            return Ok(Value::Optional(Optional::some((**inner).clone(), value)));
        }
        Shape::Custom(ty) => return coerce_custom(src, ty, target),
        _ => {}
    }

    let src = match src {
        Value::Custom(c) => c.repr(),
        other => other,
    };

    match target {
        Shape::Str => to_text(src, target).map(Value::Str),
        Shape::Int(w) => to_signed(src, target).map(|v| Value::Int(w.truncate_signed(v), *w)),
        Shape::UInt(w) => to_unsigned(src, target).map(|v| Value::UInt(w.truncate_unsigned(v), *w)),
        Shape::Float(w) => to_float(src, target).map(|v| Value::Float(w.round(v), *w)),
        Shape::Bool => to_bool(src, target).map(Value::Bool),
        _ => Err(refused(src, target)),
    }
}

fn refused(src: &Value, target: &Shape) -> CoercionError {
    CoercionError::new(src.shape(), target, format!("no conversion from {} to {}", src.kind(), target.kind()))
}

fn to_text(src: &Value, target: &Shape) -> Result<String, CoercionError> {
    match src {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(v, _) => Ok(v.to_string()),
        Value::UInt(v, _) => Ok(v.to_string()),
        Value::Float(v, FloatWidth::F32) => Ok((*v as f32).to_string()),
        Value::Float(v, FloatWidth::F64) => Ok(v.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(refused(other, target)),
    }
}

fn to_signed(src: &Value, target: &Shape) -> Result<i64, CoercionError> {
    match src {
        Value::Str(s) => {
            let ty = target.to_string();
            let v = parse_int_signed(s, &ty).map_err(|reason| CoercionError::new(src.shape(), target, reason))?;
            match target {
                Shape::Int(w) if w.truncate_signed(v) != v => Err(CoercionError::new(
                    src.shape(),
                    target,
                    format!("`{s}` is out of range for {ty}"),
                )),
                _ => Ok(v),
            }
        }
        Value::Int(v, _) => Ok(*v),
        Value::UInt(v, _) => Ok(*v as i64),
        Value::Float(v, _) => Ok(*v as i64),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(refused(other, target)),
    }
}

fn to_unsigned(src: &Value, target: &Shape) -> Result<u64, CoercionError> {
    match src {
        Value::Str(s) => {
            let ty = target.to_string();
            let v = parse_int_unsigned(s, &ty).map_err(|reason| CoercionError::new(src.shape(), target, reason))?;
            match target {
                Shape::UInt(w) if w.truncate_unsigned(v) != v => Err(CoercionError::new(
                    src.shape(),
                    target,
                    format!("`{s}` is out of range for {ty}"),
                )),
                _ => Ok(v),
            }
        }
        Value::Int(v, _) => Ok(*v as u64),
        Value::UInt(v, _) => Ok(*v),
        Value::Float(v, _) => Ok(*v as u64),
        Value::Bool(b) => Ok(*b as u64),
        other => Err(refused(other, target)),
    }
}

fn to_float(src: &Value, target: &Shape) -> Result<f64, CoercionError> {
    match src {
        Value::Str(s) => parse_float(s).map_err(|reason| CoercionError::new(src.shape(), target, reason)),
        Value::Int(v, _) => Ok(*v as f64),
        Value::UInt(v, _) => Ok(*v as f64),
        Value::Float(v, _) => Ok(*v),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(refused(other, target)),
    }
}

fn to_bool(src: &Value, target: &Shape) -> Result<bool, CoercionError> {
    let not_binary = |shown: String| {
        CoercionError::new(src.shape(), target, format!("only 0 and 1 convert to bool, got {shown}"))
    };
    match src {
        Value::Bool(b) => Ok(*b),
        Value::Str(s) => parse_bool(s).map_err(|reason| CoercionError::new(src.shape(), target, reason)),
        Value::Int(0, _) | Value::UInt(0, _) => Ok(false),
        Value::Int(1, _) | Value::UInt(1, _) => Ok(true),
        Value::Int(v, _) => Err(not_binary(v.to_string())),
        Value::UInt(v, _) => Err(not_binary(v.to_string())),
        Value::Float(v, _) if *v == 0.0 => Ok(false),
        Value::Float(v, _) if *v == 1.0 => Ok(true),
        Value::Float(v, _) => Err(not_binary(v.to_string())),
        other => Err(refused(other, target)),
    }
}

fn coerce_custom(src: &Value, ty: &ScalarTypeRef, target: &Shape) -> Result<Value, CoercionError> {
    match src {
        Value::Custom(c) if c.scalar_type().name() == ty.name() => return Ok(src.clone()),
        Value::Str(text) => {
            if let Some(parsed) = ty.parse(text) {
                let repr = parsed.map_err(|reason| CoercionError::new(src.shape(), target, reason))?;
                return Ok(Value::Custom(CustomValue::new(ty.clone(), repr)));
            }
        }
        _ => {}
    }

    let inner = match src {
        Value::Custom(c) => c.repr(),
        other => other,
    };
    if inner.kind().is_numeric() && !ty.accepts_numbers() {
        return Err(CoercionError::new(
            src.shape(),
            target,
            format!("{} does not accept numeric values", ty.name()),
        ));
    }
    let repr = coerce(inner, &ty.base()).map_err(|err| CoercionError::new(src.shape(), target, err.reason))?;
    Ok(Value::Custom(CustomValue::new(ty.clone(), repr)))
}
