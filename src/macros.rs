//! Public macros: option construction and record descriptions.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// use reshape::DecodeFlags;
///
/// let options = reshape::options! {
///     flags: DecodeFlags::STRONG_TYPE,
///     max_depth: 64,
/// };
/// assert_eq!(options.max_depth, 64);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            #[allow(deprecated)]
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}

/// Describe a struct as a record so it can take part in decoding.
///
/// Every field of the struct is listed, in declaration order, optionally followed by its tag
/// annotations written as `key = "value"` pairs. A field without an annotation for the tag
/// in use is ignored by tag-driven decoding, but still matched by name when the tag is empty.
/// Field types must implement [`Reflect`](crate::Reflect).
///
/// ```rust
/// use std::time::Duration;
///
/// #[derive(Debug, Default)]
/// struct Job {
///     name: String,
///     timeout: Duration,
///     retries: Option<u8>,
///     scratch: Vec<String>,
/// }
///
/// reshape::record! {
///     Job {
///         name: json = "name" db = "job_name",
///         timeout: json = "timeout",
///         retries: json = "retries",
///         scratch,
///     }
/// }
///
/// let ty = Job::__reshape_record_type();
/// assert_eq!(ty.fields().len(), 4);
/// assert_eq!(ty.fields()[0].tag_value("db"), Some("job_name"));
/// ```
///
/// Record types are built once and shared. A record cannot contain itself, even through
/// `Option<Box<_>>`.
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            $( $field:ident $( : $( $tag:ident = $value:literal )+ )? ),* $(,)?
        }
    ) => {
        impl $ty {
            #[doc(hidden)]
            pub fn __reshape_record_type() -> ::std::sync::Arc<$crate::RecordType> {
                static TYPE: ::std::sync::OnceLock<::std::sync::Arc<$crate::RecordType>> =
                    ::std::sync::OnceLock::new();
                TYPE.get_or_init(|| {
                    $crate::RecordType::builder(stringify!($ty))
                        $(
                            .field(
                                $crate::FieldDef::new(
                                    stringify!($field),
                                    $crate::reflect::field_shape::<$ty, _, _>(|r| &r.$field),
                                )
                                $( $( .tag(stringify!($tag), $value) )+ )?
                            )
                        )*
                        .build()
                })
                .clone()
            }
        }

        impl $crate::Reflect for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::Record(Self::__reshape_record_type())
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Record($crate::Record::from_parts(
                    Self::__reshape_record_type(),
                    ::std::vec![ $( $crate::Reflect::to_value(&self.$field) ),* ],
                ))
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::Error> {
                #[allow(unused_mut, unused_variables)]
                let mut fields = $crate::reflect::record_fields(value, stringify!($ty))?;
                ::std::result::Result::Ok(Self {
                    $( $field: $crate::reflect::next_field(&mut fields, stringify!($field))?, )*
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{DecodeFlags, Options, Reflect, Shape, Value};

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    crate::record! {
        Point {
            x: json = "x",
            y: json = "y" csv = "col_y",
            label,
        }
    }

    #[test]
    fn options_macro_overrides_defaults() {
        let opts = crate::options! { flags: DecodeFlags::STRONG_FOUND_DST };
        assert_eq!(opts.flags, DecodeFlags::STRONG_FOUND_DST);
        assert_eq!(opts.max_depth, Options::default().max_depth);
    }

    #[test]
    fn record_describes_fields_in_order() {
        let ty = Point::__reshape_record_type();
        assert_eq!(ty.name(), "Point");
        let names: Vec<&str> = ty.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["x", "y", "label"]);
        assert_eq!(ty.fields()[1].tag_value("csv"), Some("col_y"));
        assert_eq!(ty.fields()[2].identifier("json"), None);
        assert!(std::sync::Arc::ptr_eq(&ty, &Point::__reshape_record_type()));
    }

    #[test]
    fn record_round_trips_through_values() {
        let p = Point {
            x: 1,
            y: -2,
            label: "p".into(),
        };
        let value = p.to_value();
        assert_eq!(value.shape(), Point::shape());
        assert_eq!(value.get("y"), Some(&Value::from(-2i32)));
        assert_eq!(Point::from_value(value), Ok(p));
    }

    #[test]
    fn foreign_record_is_rejected() {
        let err = Point::from_value(Value::from("not a record")).unwrap_err();
        assert!(err.to_string().contains("Point"));
        assert_eq!(Point::shape(), Shape::Record(Point::__reshape_record_type()));
    }
}
