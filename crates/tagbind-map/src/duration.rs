//! Duration literals such as `300ms`, `-1.5h` or `2h45m`.
//!
//! Format: `[-+]?(<decimal><unit>)+` or the bare literal `0`, where unit is
//! one of `ns`, `us` (`µs`, `μs`), `ms`, `s`, `m`, `h`.

use chrono::TimeDelta;
use thiserror::Error;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Largest magnitude representable as negative `i64` nanoseconds.
const MAX_MAGNITUDE: u64 = 1 << 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Splits the leading run of ASCII digits off `s` and returns its value.
/// `None` signals overflow.
fn leading_int(s: &str) -> Option<(u64, &str)> {
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    let mut value: u64 = 0;
    for digit in s[..end].bytes() {
        if value > (MAX_MAGNITUDE - 1) / 10 {
            return None;
        }
        value = value * 10 + u64::from(digit - b'0');
        if value > MAX_MAGNITUDE {
            return None;
        }
    }
    Some((value, &s[end..]))
}

/// Splits a fractional digit run off `s`, returning the digits as an integer
/// and the power of ten they are scaled by. Digits that no longer fit are
/// dropped.
fn leading_fraction(s: &str) -> (u64, f64, &str) {
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    let mut value: u64 = 0;
    let mut scale = 1.0;
    let mut overflow = false;
    for digit in s[..end].bytes() {
        if overflow {
            continue;
        }
        if value > (MAX_MAGNITUDE - 1) / 10 {
            overflow = true;
            continue;
        }
        let next = value * 10 + u64::from(digit - b'0');
        if next > MAX_MAGNITUDE {
            overflow = true;
            continue;
        }
        value = next;
        scale *= 10.0;
    }
    (value, scale, &s[end..])
}

/// Parses a duration literal.
pub fn parse_duration(input: &str) -> Result<TimeDelta, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let mut s = input;
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    if s == "0" {
        return Ok(TimeDelta::zero());
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !s.is_empty() {
        if !s.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let before = s.len();
        let (whole, rest) = leading_int(s).ok_or_else(invalid)?;
        s = rest;
        let had_whole = s.len() != before;

        let mut fraction = 0;
        let mut scale = 1.0;
        let mut had_fraction = false;
        if let Some(rest) = s.strip_prefix('.') {
            let before = rest.len();
            let (f, sc, rest) = leading_fraction(rest);
            fraction = f;
            scale = sc;
            had_fraction = rest.len() != before;
            s = rest;
        }
        if !had_whole && !had_fraction {
            return Err(invalid());
        }

        let unit_len = s
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map_or(s.len(), |(idx, _)| idx);
        if unit_len == 0 {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let (unit, rest) = s.split_at(unit_len);
        s = rest;
        let unit = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        if whole > MAX_MAGNITUDE / unit {
            return Err(invalid());
        }
        let mut component = whole * unit;
        if fraction > 0 {
            // Float precision is enough here; the fraction only adds sub-unit nanoseconds.
            component += (fraction as f64 * (unit as f64 / scale)) as u64;
            if component > MAX_MAGNITUDE {
                return Err(invalid());
            }
        }
        total = total.checked_add(component).ok_or_else(invalid)?;
        if total > MAX_MAGNITUDE {
            return Err(invalid());
        }
    }

    let nanos = if negative {
        if total == MAX_MAGNITUDE {
            i64::MIN
        } else {
            -(total as i64)
        }
    } else {
        i64::try_from(total).map_err(|_| invalid())?
    };
    Ok(TimeDelta::nanoseconds(nanos))
}
