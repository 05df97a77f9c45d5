use std::collections::{BTreeMap, HashMap};

use reshape::{
    DecodeFlags, ErrorKind, FieldDef, IntWidth, Key, Map, Optional, Record, RecordType, Reflect, Sequence, Shape,
    Value, decode, decode_value, decode_with_options,
};

#[test]
fn sequence_length_follows_source() -> anyhow::Result<()> {
    let input = vec![Value::from(1i64), Value::from("2"), Value::from(3.0)];
    let mut out: Vec<i64> = vec![9, 9, 9, 9, 9];
    decode(&input, &mut out, "", DecodeFlags::empty())?;
    assert_eq!(out, [1, 2, 3]);

    let mut emptied = vec![1i64];
    decode(&Vec::<i64>::new(), &mut emptied, "", DecodeFlags::empty())?;
    assert!(emptied.is_empty());
    Ok(())
}

#[test]
fn nested_sequences_and_maps() -> anyhow::Result<()> {
    let input: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::from([(
        "grid".to_owned(),
        vec![vec!["1".to_owned(), "2".to_owned()], vec!["3".to_owned()]],
    )]);
    let mut out: BTreeMap<String, Vec<Vec<u8>>> = BTreeMap::new();
    decode(&input, &mut out, "", DecodeFlags::empty())?;
    assert_eq!(out["grid"], vec![vec![1, 2], vec![3]]);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Inner {
    field: String,
}

reshape::record! {
    Inner {
        field: json = "field",
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Outer {
    name: String,
    inner: Option<Inner>,
}

reshape::record! {
    Outer {
        name: json = "name",
        inner: json = "inner",
    }
}

#[test]
fn decoded_values_share_no_storage() -> anyhow::Result<()> {
    let mut original = Outer {
        name: "outer".into(),
        inner: Some(Inner { field: "value".into() }),
    };
    let mut out: HashMap<String, Value> = HashMap::new();
    decode(&original, &mut out, "json", DecodeFlags::empty())?;

    if let Some(inner) = original.inner.as_mut() {
        inner.field = "changed".into();
    }
    original.name = "renamed".into();

    assert_eq!(out["name"].as_str(), Some("outer"));
    assert_eq!(out["inner"].get("field").and_then(Value::as_str), Some("value"));
    Ok(())
}

#[test]
fn dynamic_destination_must_be_concrete() {
    let source = Value::from("x");
    let options = reshape::Options::default();

    let mut null_ref = Value::Optional(Optional::none(Shape::Str));
    let err = decode_value(&source, &mut null_ref, "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDestination);
    assert!(err.path().is_none());

    let mut nothing = Value::NIL;
    let err = decode_value(&source, &mut nothing, "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDestination);
}

#[test]
fn dynamic_records_decode_without_rust_types() -> anyhow::Result<()> {
    let ty = RecordType::builder("Endpoint")
        .field(FieldDef::new("host", Shape::Str).tag("url", "host"))
        .field(FieldDef::new("port", Shape::UInt(IntWidth::W16)).tag("url", "port"))
        .build();

    let mut source = Map::new(Shape::Str, Shape::Str);
    source.insert(Key::from("host"), Value::from("example.org"));
    source.insert(Key::from("port"), Value::from("8443"));

    let mut endpoint = Shape::Record(ty.clone()).zero();
    decode_value(&Value::Map(source), &mut endpoint, "url", &Default::default())?;

    let record: &Record = endpoint.as_record().expect("record destination");
    assert_eq!(record.get("host").and_then(Value::as_str), Some("example.org"));
    assert_eq!(record.get("port"), Some(&Value::UInt(8443, IntWidth::W16)));
    assert!(std::sync::Arc::ptr_eq(&ty.field_index("url"), &ty.field_index("url")));
    Ok(())
}

#[test]
fn depth_ceiling_reports_runaway_nesting() {
    let mut nested = Value::from(0i64);
    for _ in 0..100 {
        nested = Value::Seq(Sequence::new(Shape::Any, vec![Value::any(nested)]));
    }

    let mut dst = Value::Seq(Sequence::new(Shape::Any, Vec::new()));
    let options = reshape::options! { max_depth: 64 };
    let err = decode_value(&nested, &mut dst, "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicStructure);
    assert!(err.to_string().contains("cyclic"));

    let mut copy: Vec<Value> = Vec::new();
    let err = decode_with_options(&nested.as_seq().map(|s| s.items().to_vec()).unwrap_or_default(), &mut copy, "", &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicStructure);
}

/// `levels` sequences wrapped around one integer, with the matching shape.
fn nested_sequences(levels: usize) -> (Value, Shape) {
    let mut value = Value::from(1i64);
    let mut shape = Shape::Int(IntWidth::W64);
    for _ in 0..levels {
        value = Value::Seq(Sequence::new(shape.clone(), vec![value]));
        shape = Shape::seq_of(shape);
    }
    (value, shape)
}

#[test]
fn default_depth_ceiling_is_exact() -> anyhow::Result<()> {
    let options = reshape::Options::default();

    // One level per sequence plus one for the innermost integer.
    let (fits, shape) = nested_sequences(options.max_depth - 1);
    let mut dst = shape.zero();
    decode_value(&fits, &mut dst, "", &options)?;
    assert_eq!(dst, fits);

    let (too_deep, shape) = nested_sequences(options.max_depth);
    let mut dst = shape.zero();
    let err = decode_value(&too_deep, &mut dst, "", &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicStructure);
    Ok(())
}

#[test]
fn default_depth_ceiling_trips_before_the_stack_runs_out() {
    let mut nested = Value::Map(Map::new(Shape::Str, Shape::Any));
    for _ in 0..240 {
        let mut level = Map::new(Shape::Str, Shape::Any);
        level.insert(Key::from("next"), Value::any(nested));
        nested = Value::Map(level);
    }

    let mut dst = Value::Map(Map::unset(Shape::Str, Shape::Any));
    let err = decode_value(&nested, &mut dst, "", &Default::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CyclicStructure);
    assert!(err.path().is_some_and(|p| p.to_string().starts_with("next.next")));
}

#[test]
fn unset_source_map_clears_the_destination() -> anyhow::Result<()> {
    let nil_map = Value::Map(Map::unset(Shape::Str, Shape::Any));

    let mut filled = Map::new(Shape::Str, Shape::Any);
    filled.insert(Key::from("a"), Value::any(Value::from(7i64)));
    let mut dst = Value::Map(filled);
    decode_value(&nil_map, &mut dst, "", &Default::default())?;
    assert!(dst.as_map().is_some_and(Map::is_unset));

    let mut outer = Map::new(Shape::Str, Shape::Any);
    outer.insert(Key::from("name"), Value::from("x"));
    outer.insert(Key::from("inner"), nil_map);
    let mut typed = Outer {
        name: String::new(),
        inner: Some(Inner { field: "stale".into() }),
    };
    decode(&Value::Map(outer), &mut typed, "json", DecodeFlags::empty())?;
    assert_eq!(typed, Outer { name: "x".into(), inner: None });
    Ok(())
}

#[test]
fn any_slot_receives_concrete_copy() -> anyhow::Result<()> {
    let mut slot = Value::NIL;
    decode(&vec![Some(1u8), None], &mut slot, "", DecodeFlags::empty())?;
    assert_eq!(slot.shape(), <Vec<Option<u8>>>::shape());
    assert_eq!(Vec::<Option<u8>>::from_value(slot)?, vec![Some(1), None]);
    Ok(())
}

#[cfg(feature = "serialize")]
#[test]
fn decoded_maps_serialize_to_json() -> anyhow::Result<()> {
    #[derive(Debug, Default)]
    struct Build {
        target: String,
        jobs: u32,
        features: Vec<String>,
    }

    reshape::record! {
        Build {
            target: json = "target",
            jobs: json = "jobs",
            features: json = "features",
        }
    }

    let build = Build {
        target: "wasm32".into(),
        jobs: 4,
        features: vec!["simd".into()],
    };
    let mut out: BTreeMap<String, Value> = BTreeMap::new();
    decode(&build, &mut out, "json", DecodeFlags::empty())?;

    let json = serde_json::to_value(out.to_value())?;
    assert_eq!(json, serde_json::json!({"target": "wasm32", "jobs": 4, "features": ["simd"]}));
    Ok(())
}
