//! Binding of instant fields.
//!
//! Field tags steer the parse:
//!
//! - `time_format`: a reference-time layout, or `unix` / `unixnano` for
//!   integer epochs (default [`RFC3339`]).
//! - `time_location`: an IANA zone name used for layouts without an offset.
//! - `time_utc`: when true and no location is named, wall-clock times are UTC.
//!
//! Without either modifier wall-clock times resolve in the process-local zone.

use chrono::format::{Parsed, parse};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tagbind_model::{Field, Value, zero_instant};

use crate::coerce::parse_bool;
use crate::error::{MapError, Result};
use crate::layout::{Components, Layout, RFC3339};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// The zone wall-clock times are resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Utc,
    Local,
    Named(Tz),
}

impl Location {
    /// Looks up a zone by name. `UTC` and `Local` are always available.
    pub fn load(name: &str) -> Result<Self> {
        match name {
            "" | "UTC" => Ok(Self::Utc),
            "Local" => Ok(Self::Local),
            other => other
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| MapError::UnknownTimeZone(other.to_string())),
        }
    }

    /// Picks the location from a field's `time_location` and `time_utc` tags.
    pub fn for_field(field: &Field) -> Result<Self> {
        let name = field.tag.get("time_location");
        if !name.is_empty() {
            return Self::load(name);
        }
        if parse_bool(field.tag.get("time_utc")).unwrap_or(false) {
            return Ok(Self::Utc);
        }
        Ok(Self::Local)
    }

    fn resolve(self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Utc => Some(Utc.from_utc_datetime(naive).fixed_offset()),
            Self::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Self::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }
}

/// Coerces `value` into an instant according to the field's time tags.
pub(crate) fn set_time_field(value: &str, field: &Field) -> Result<Value> {
    let format = match field.tag.get("time_format") {
        "" => RFC3339,
        other => other,
    };

    match format.to_ascii_lowercase().as_str() {
        "unix" => return from_unix(value, false),
        "unixnano" => return from_unix(value, true),
        _ => {}
    }

    if value.is_empty() {
        return Ok(Value::Time(zero_instant()));
    }

    let location = Location::for_field(field)?;
    parse_in_location(format, value, location).map(Value::Time)
}

fn from_unix(value: &str, nanos: bool) -> Result<Value> {
    let raw: i64 = value
        .parse()
        .map_err(|source| MapError::parse_int(value, source))?;
    let (secs, subsec) = if nanos {
        (
            raw.div_euclid(NANOS_PER_SECOND),
            raw.rem_euclid(NANOS_PER_SECOND),
        )
    } else {
        (raw, 0)
    };
    let instant = u32::try_from(subsec)
        .ok()
        .and_then(|subsec| DateTime::<Utc>::from_timestamp(secs, subsec))
        .ok_or_else(|| MapError::Time {
            value: value.to_string(),
            layout: if nanos { "unixnano" } else { "unix" }.to_string(),
            reason: "timestamp out of range".to_string(),
        })?;
    Ok(Value::Time(instant.with_timezone(&Local).fixed_offset()))
}

/// Parses `value` with a reference-time layout.
///
/// An offset in the input wins over `location`; otherwise the wall-clock
/// time is resolved in `location`. Missing date parts default to year 0,
/// January, day 1 and missing clock parts to midnight.
pub fn parse_in_location(
    layout: &str,
    value: &str,
    location: Location,
) -> Result<DateTime<FixedOffset>> {
    let time_error = |reason: String| MapError::Time {
        value: value.to_string(),
        layout: layout.to_string(),
        reason,
    };

    let compiled = Layout::parse(layout);
    let mut parsed = Parsed::new();
    parse(&mut parsed, value, compiled.items.iter()).map_err(|e| time_error(e.to_string()))?;
    fill_defaults(&mut parsed, compiled.components).map_err(|e| time_error(e.to_string()))?;

    let date = parsed
        .to_naive_date()
        .map_err(|e| time_error(e.to_string()))?;
    let time = parsed
        .to_naive_time()
        .map_err(|e| time_error(e.to_string()))?;
    let naive = date.and_time(time);

    if compiled.components.offset {
        let offset = parsed
            .to_fixed_offset()
            .map_err(|e| time_error(e.to_string()))?;
        return offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| time_error("offset out of range".to_string()));
    }

    location
        .resolve(&naive)
        .ok_or_else(|| time_error("time does not exist in location".to_string()))
}

fn fill_defaults(parsed: &mut Parsed, components: Components) -> chrono::format::ParseResult<()> {
    if !components.year {
        parsed.set_year(0)?;
    }
    if !components.year_day {
        if !components.month {
            parsed.set_month(1)?;
        }
        if !components.day {
            parsed.set_day(1)?;
        }
    }
    if components.hour12 {
        if !components.am_pm {
            // No meridiem: 12 is noon, 1 to 11 are taken as written.
            parsed.set_ampm(parsed.hour_mod_12() == Some(0))?;
        }
    } else if !components.hour {
        parsed.set_hour(0)?;
    }
    if !components.minute {
        parsed.set_minute(0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn rfc3339_keeps_offset() {
        let parsed = parse_in_location(RFC3339, "2024-01-02T15:04:05+02:00", Location::Utc)
            .expect("parse rfc3339");
        assert_eq!(parsed.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(parsed.hour(), 15);
    }

    #[test]
    fn rfc3339_accepts_fraction_and_zulu() {
        let parsed = parse_in_location(RFC3339, "2024-01-02T15:04:05.250Z", Location::Local)
            .expect("parse fractional");
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn date_only_layout_resolves_in_named_zone() {
        let location = Location::load("Asia/Tokyo").expect("known zone");
        let parsed = parse_in_location("2006-01-02", "2024-03-10", location).expect("parse date");
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2024, 3, 10));
        assert_eq!(parsed.hour(), 0);
        assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn clock_only_layout_defaults_date() {
        let parsed = parse_in_location("3:04PM", "9:30PM", Location::Utc).expect("parse clock");
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (0, 1, 1));
        assert_eq!((parsed.hour(), parsed.minute()), (21, 30));
    }

    #[test]
    fn twelve_hour_clock_without_meridiem_keeps_noon() {
        let noon = parse_in_location("03:04", "12:30", Location::Utc).expect("parse noon");
        assert_eq!((noon.hour(), noon.minute()), (12, 30));
        let morning = parse_in_location("03:04", "11:05", Location::Utc).expect("parse morning");
        assert_eq!(morning.hour(), 11);
        let midnight = parse_in_location("03:04PM", "12:00AM", Location::Utc).expect("parse am");
        assert_eq!(midnight.hour(), 0);
    }

    #[test]
    fn unknown_zone_is_an_error() {
        assert!(matches!(
            Location::load("Mars/Olympus"),
            Err(MapError::UnknownTimeZone(name)) if name == "Mars/Olympus"
        ));
    }

    #[test]
    fn unix_nano_carries_seconds() {
        let Value::Time(instant) = from_unix("1700000000123456789", true).expect("unixnano") else {
            panic!("expected time");
        };
        assert_eq!(instant.timestamp(), 1_700_000_000);
        assert_eq!(instant.timestamp_subsec_nanos(), 123_456_789);

        let Value::Time(instant) = from_unix("-1", true).expect("negative unixnano") else {
            panic!("expected time");
        };
        assert_eq!(instant.timestamp(), -1);
        assert_eq!(instant.timestamp_subsec_nanos(), 999_999_999);
    }
}
