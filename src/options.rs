use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Independent decode switches, combined with `|`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodeFlags(u8);

impl DecodeFlags {
    /// A source field or key with no destination counterpart is an error instead of being skipped.
    pub const STRONG_FOUND_DST: Self = Self(0x1);
    /// Disables scalar coercion: any kind mismatch is a hard error.
    pub const STRONG_TYPE: Self = Self(0x1 << 1);
    /// Records decoded into an any-slot become string-keyed maps instead of record copies.
    pub const UNWRAP_STRUCT_TO_MAP: Self = Self(0x1 << 2);

    const ALL: u8 = 0x7;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build flags from raw bits, dropping unknown ones.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DecodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DecodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for DecodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::STRONG_FOUND_DST, "STRONG_FOUND_DST"),
            (Self::STRONG_TYPE, "STRONG_TYPE"),
            (Self::UNWRAP_STRUCT_TO_MAP, "UNWRAP_STRUCT_TO_MAP"),
        ];
        let mut first = true;
        f.write_str("DecodeFlags(")?;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("empty")?;
        }
        f.write_str(")")
    }
}

/// Decoder configuration options.
///
/// Use this to set the decode flags together with the nesting ceiling.
///
/// Example: decode with a tighter depth limit.
///
/// ```rust
/// use std::collections::HashMap;
/// use reshape::{decode_with_options, DecodeFlags, Value};
///
/// let options = reshape::options! {
///     flags: DecodeFlags::STRONG_TYPE,
///     max_depth: 32,
/// };
///
/// let source: HashMap<String, i64> = HashMap::from([("a".to_owned(), 1)]);
/// let mut target: HashMap<String, Value> = HashMap::new();
/// decode_with_options(&source, &mut target, "", &options).unwrap();
/// assert_eq!(target["a"].as_i64(), Some(1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Strictness and unwrap switches.
    pub flags: DecodeFlags,
    /// Maximum recursion depth of one call. Every nested field, entry, element and
    /// optional counts one level; a value stored into an any-slot counts one more.
    /// Exceeding it fails with `CyclicStructure`. The default stays well inside a 2 MiB
    /// thread stack in unoptimized builds.
    ///
    /// Default: 128
    pub max_depth: usize,
}

impl Options {
    pub fn with_flags(flags: DecodeFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    pub(crate) fn strong_found_dst(&self) -> bool {
        self.flags.contains(DecodeFlags::STRONG_FOUND_DST)
    }

    pub(crate) fn strong_type(&self) -> bool {
        self.flags.contains(DecodeFlags::STRONG_TYPE)
    }

    pub(crate) fn unwrap_struct_to_map(&self) -> bool {
        self.flags.contains(DecodeFlags::UNWRAP_STRUCT_TO_MAP)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            flags: DecodeFlags::empty(),
            max_depth: 128,
        }
    }
}

impl From<DecodeFlags> for Options {
    fn from(flags: DecodeFlags) -> Self {
        Self::with_flags(flags)
    }
}
