//! Textual literal parsers used by the scalar coercer.

/// Parse a canonical boolean literal.
///
/// Accepted TRUE literals: "1", "t", "T", "TRUE", "true", "True"
/// Accepted FALSE literals: "0", "f", "F", "FALSE", "false", "False"
///
/// Mixed spellings such as "tRuE" and YAML 1.1 words such as "yes" are rejected.
pub(crate) fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid bool: `{s}`")),
    }
}

fn parse_digits_u128(digits: &str, radix: u32) -> Option<u128> {
    let mut val: u128 = 0;
    let mut saw = false;
    for b in digits.as_bytes() {
        let d = match *b {
            b'_' => continue,
            b'0'..=b'9' => (b - b'0') as u32,
            b'a'..=b'f' => 10 + (b - b'a') as u32,
            b'A'..=b'F' => 10 + (b - b'A') as u32,
            _ => return None,
        };
        if d >= radix {
            return None;
        }
        val = val.checked_mul(radix as u128)?;
        val = val.checked_add(d as u128)?;
        saw = true;
    }
    if saw { Some(val) } else { None }
}

/// Split an optional sign and a radix prefix (`0x`, `0o`, `0b`) off an integer literal.
fn split_radix(t: &str) -> (bool, u32, &str) {
    let (neg, rest) = match t.strip_prefix('+') {
        Some(r) => (false, r),
        None => match t.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, t),
        },
    };

    let (radix, digits) = if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16u32, r)
    } else if let Some(r) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8u32, r)
    } else if let Some(r) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2u32, r)
    } else {
        (10u32, rest)
    };
    (neg, radix, digits)
}

/// Parse a signed integer literal: optional sign, optional radix prefix, `_` separators.
///
/// Arguments:
/// - `s`: the literal text.
/// - `ty`: target type name, used in the error message.
pub(crate) fn parse_int_signed(s: &str, ty: &str) -> Result<i64, String> {
    let invalid = || format!("invalid {ty}: `{s}`");
    let (neg, radix, digits) = split_radix(s.trim());

    let mag = parse_digits_u128(digits, radix).ok_or_else(invalid)?;
    let mag_i128: i128 = mag.try_into().map_err(|_| invalid())?;
    let val = if neg { mag_i128.checked_neg().ok_or_else(invalid)? } else { mag_i128 };
    i64::try_from(val).map_err(|_| invalid())
}

/// Parse an unsigned integer literal. A leading `-` is always rejected.
pub(crate) fn parse_int_unsigned(s: &str, ty: &str) -> Result<u64, String> {
    let invalid = || format!("invalid {ty}: `{s}`");
    let (neg, radix, digits) = split_radix(s.trim());
    if neg {
        return Err(invalid());
    }
    let mag = parse_digits_u128(digits, radix).ok_or_else(invalid)?;
    u64::try_from(mag).map_err(|_| invalid())
}

/// Parse a floating point literal, also accepting `.nan` / `.inf` spellings.
pub(crate) fn parse_float(s: &str) -> Result<f64, String> {
    let t = s.trim();
    let lower = t.to_ascii_lowercase();
    match lower.as_str() {
        ".nan" | "+.nan" | "-.nan" => Ok(f64::NAN),
        ".inf" | "+.inf" => Ok(f64::INFINITY),
        "-.inf" => Ok(f64::NEG_INFINITY),
        _ => t
            .parse::<f64>()
            .map_err(|_| format!("invalid floating point value: `{s}`")),
    }
}

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("\u{00b5}s", 1_000),
    ("\u{03bc}s", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// Parse a duration such as `300ms`, `-1.5h` or `2h45m` into signed nanoseconds.
///
/// Every number needs a unit (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`), except the bare literal `0`.
/// Fractions past nanosecond precision are truncated.
pub(crate) fn parse_duration(s: &str) -> Result<i64, String> {
    let invalid = |why: &str| format!("invalid duration `{s}`: {why}");
    let t = s.trim();
    let (neg, mut rest) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if rest == "0" {
        return Ok(0);
    }
    if rest.is_empty() {
        return Err(invalid("empty"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, after_int) = rest.split_at(int_end);

        let (frac_digits, after_num) = match after_int.strip_prefix('.') {
            Some(r) => {
                let end = r.find(|c: char| !c.is_ascii_digit()).unwrap_or(r.len());
                r.split_at(end)
            }
            None => ("", after_int),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_end = after_num
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_num.len());
        let (unit, remaining) = after_num.split_at(unit_end);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, ns)| *ns)
            .ok_or_else(|| invalid("unknown unit"))?;

        let whole = if int_digits.is_empty() {
            0
        } else {
            parse_digits_u128(int_digits, 10).ok_or_else(|| invalid("overflow"))?
        };
        let mut part = whole.checked_mul(scale).ok_or_else(|| invalid("overflow"))?;

        // Only the first 18 fractional digits can contribute to a nanosecond count.
        let frac = &frac_digits[..frac_digits.len().min(18)];
        if !frac.is_empty() {
            let numerator = parse_digits_u128(frac, 10).ok_or_else(|| invalid("overflow"))?;
            let denominator = 10u128.pow(frac.len() as u32);
            part = part
                .checked_add(numerator * scale / denominator)
                .ok_or_else(|| invalid("overflow"))?;
        }

        total = total.checked_add(part).ok_or_else(|| invalid("overflow"))?;
        rest = remaining;
    }

    let limit = if neg { i64::MAX as u128 + 1 } else { i64::MAX as u128 };
    if total > limit {
        return Err(invalid("overflow"));
    }
    if neg {
        Ok((total as i128).wrapping_neg() as i64)
    } else {
        Ok(total as i64)
    }
}
