//! Tag-driven structural decoding between in-memory values.
//!
//! `reshape` copies data from one structured value into another of a possibly different
//! shape without going through a text format: records into maps, maps into records,
//! records into records with differently named fields, and scalars of one kind into
//! another (`"30"` into an integer field, `1` into a bool, `"1h30m"` into a `Duration`).
//!
//! Record fields are matched by the value of a tag annotation chosen per call, or by
//! declared field name when the tag is empty. Behavior is tuned with [`DecodeFlags`]:
//! - `STRONG_FOUND_DST`: a source field without a destination counterpart is an error.
//! - `STRONG_TYPE`: scalars are never coerced across kinds.
//! - `UNWRAP_STRUCT_TO_MAP`: records stored into `any` slots become `Map<string, any>`.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use reshape::{decode, DecodeFlags, Value};
//!
//! #[derive(Debug, Default)]
//! struct Account {
//!     id: u32,
//!     owner: String,
//! }
//!
//! reshape::record! {
//!     Account {
//!         id: db = "account_id",
//!         owner: db = "owner_name",
//!     }
//! }
//!
//! let account = Account { id: 9, owner: "kim".into() };
//! let mut row: BTreeMap<String, Value> = BTreeMap::new();
//! decode(&account, &mut row, "db", DecodeFlags::empty()).unwrap();
//! assert_eq!(row["account_id"].as_u64(), Some(9));
//! assert_eq!(row["owner_name"].as_str(), Some("kim"));
//! ```

mod coerce;
mod custom;
mod decoder;
mod error;
mod macros;
mod options;
mod parse_scalars;
mod path;
pub mod reflect;
mod resolver;
#[cfg(feature = "serialize")]
mod ser;
mod shape;
mod value;

pub use coerce::coerce;
pub use custom::{CustomValue, DurationType, ScalarType, ScalarTypeRef, duration_type};
pub use decoder::{decode, decode_value, decode_with_options};
pub use error::{CoercionError, Error, ErrorKind};
pub use options::{DecodeFlags, Options};
pub use path::{Path, PathKind, PathSegment};
pub use reflect::{Reflect, ReflectKey};
pub use shape::{FieldDef, FieldIndex, FloatWidth, IntWidth, Kind, RecordType, RecordTypeBuilder, Shape};
pub use value::{Key, Map, Optional, Record, Sequence, Value};
