#![no_main]

use libfuzzer_sys::fuzz_target;
use reshape::{FloatWidth, IntWidth, Shape, Value, coerce, duration_type};

// Feeds arbitrary text through every scalar conversion. Failures are fine, panics are not.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();
    let source = Value::from(text);

    let targets = [
        Shape::Bool,
        Shape::Int(IntWidth::W8),
        Shape::Int(IntWidth::W64),
        Shape::UInt(IntWidth::W16),
        Shape::UInt(IntWidth::W64),
        Shape::Float(FloatWidth::F32),
        Shape::Float(FloatWidth::F64),
        Shape::Str,
        Shape::Custom(duration_type()),
        Shape::optional_of(Shape::Int(IntWidth::W32)),
    ];

    for target in &targets {
        if let Ok(value) = coerce(&source, target) {
            // Whatever came out must convert back to text.
            let _ = coerce(&value, &Shape::Str);
        }
    }
});
