//! Reference-time layouts (`2006-01-02T15:04:05Z07:00`) translated into
//! chrono parser items.
//!
//! A layout spells the reference instant `Mon Jan 2 15:04:05 MST 2006` in
//! the desired format. Each recognised chunk becomes a parser item; every
//! other character is matched literally.

use chrono::format::{Fixed, Item, Numeric, Pad};

/// The default layout (RFC 3339).
pub const RFC3339: &str = "2006-01-02T15:04:05Z07:00";

/// A recognised layout chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    LongMonth,
    Month,
    NumMonth,
    ZeroMonth,
    LongWeekDay,
    WeekDay,
    Day,
    UnderDay,
    ZeroDay,
    UnderYearDay,
    ZeroYearDay,
    Hour,
    Hour12,
    ZeroHour12,
    Minute,
    ZeroMinute,
    Second,
    ZeroSecond,
    LongYear,
    Year,
    UpperPm,
    LowerPm,
    TzName,
    IsoTzColon,
    IsoTz,
    NumTzColon,
    NumTz,
    Fraction,
}

/// Finds the first chunk in `layout`, returning the literal prefix, the chunk
/// and the remaining suffix.
fn next_chunk(layout: &str) -> (&str, Option<Chunk>, &str) {
    let bytes = layout.as_bytes();
    for i in 0..bytes.len() {
        if !layout.is_char_boundary(i) {
            continue;
        }
        let tail = &layout[i..];
        let found = match bytes[i] {
            b'J' if tail.starts_with("January") => Some((Chunk::LongMonth, 7)),
            b'J' if tail.starts_with("Jan") => Some((Chunk::Month, 3)),
            b'M' if tail.starts_with("Monday") => Some((Chunk::LongWeekDay, 6)),
            b'M' if tail.starts_with("Mon") => Some((Chunk::WeekDay, 3)),
            b'M' if tail.starts_with("MST") => Some((Chunk::TzName, 3)),
            b'0' if tail.starts_with("002") => Some((Chunk::ZeroYearDay, 3)),
            b'0' if tail.len() >= 2 && (b'1'..=b'6').contains(&bytes[i + 1]) => {
                let chunk = match bytes[i + 1] {
                    b'1' => Chunk::ZeroMonth,
                    b'2' => Chunk::ZeroDay,
                    b'3' => Chunk::ZeroHour12,
                    b'4' => Chunk::ZeroMinute,
                    b'5' => Chunk::ZeroSecond,
                    _ => Chunk::Year,
                };
                Some((chunk, 2))
            }
            b'1' if tail.starts_with("15") => Some((Chunk::Hour, 2)),
            b'1' => Some((Chunk::NumMonth, 1)),
            b'2' if tail.starts_with("2006") => Some((Chunk::LongYear, 4)),
            b'2' => Some((Chunk::Day, 1)),
            b'_' if tail.starts_with("_2006") => {
                // "_" followed by a long year; the underscore stays literal.
                return (&layout[..=i], Some(Chunk::LongYear), &layout[i + 5..]);
            }
            b'_' if tail.starts_with("__2") => Some((Chunk::UnderYearDay, 3)),
            b'_' if tail.starts_with("_2") => Some((Chunk::UnderDay, 2)),
            b'3' => Some((Chunk::Hour12, 1)),
            b'4' => Some((Chunk::Minute, 1)),
            b'5' => Some((Chunk::Second, 1)),
            b'P' if tail.starts_with("PM") => Some((Chunk::UpperPm, 2)),
            b'p' if tail.starts_with("pm") => Some((Chunk::LowerPm, 2)),
            b'-' => offset_chunk(&tail[1..], false).map(|(chunk, len)| (chunk, len + 1)),
            b'Z' => offset_chunk(&tail[1..], true).map(|(chunk, len)| (chunk, len + 1)),
            b'.' | b',' => fraction_len(tail).map(|len| (Chunk::Fraction, len)),
            _ => None,
        };
        if let Some((chunk, len)) = found {
            return (&layout[..i], Some(chunk), &layout[i + len..]);
        }
    }
    (layout, None, "")
}

/// Recognises the offset spellings that follow a leading `-` or `Z`.
fn offset_chunk(tail: &str, iso: bool) -> Option<(Chunk, usize)> {
    let (colon, plain) = if iso {
        (Chunk::IsoTzColon, Chunk::IsoTz)
    } else {
        (Chunk::NumTzColon, Chunk::NumTz)
    };
    [
        ("07:00:00", colon),
        ("070000", plain),
        ("07:00", colon),
        ("0700", plain),
        ("07", plain),
    ]
    .into_iter()
    .find(|(spelling, _)| tail.starts_with(spelling))
    .map(|(spelling, chunk)| (chunk, spelling.len()))
}

/// Length of a `.000`/`.999` fractional-second chunk, which must not be
/// followed by another digit.
fn fraction_len(tail: &str) -> Option<usize> {
    let bytes = tail.as_bytes();
    let digit = *bytes.get(1)?;
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let run = bytes[1..].iter().take_while(|&&b| b == digit).count();
    let end = 1 + run;
    if bytes.get(end).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    Some(end)
}

/// Which components a layout supplies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Components {
    pub year: bool,
    pub month: bool,
    pub day: bool,
    pub year_day: bool,
    pub hour: bool,
    pub hour12: bool,
    pub am_pm: bool,
    pub minute: bool,
    pub offset: bool,
}

/// A layout translated into parser items.
#[derive(Debug, Clone)]
pub struct Layout<'a> {
    pub items: Vec<Item<'a>>,
    pub components: Components,
}

impl<'a> Layout<'a> {
    pub fn parse(layout: &'a str) -> Self {
        let mut items = Vec::new();
        let mut components = Components::default();
        let mut rest = layout;
        loop {
            let (prefix, chunk, suffix) = next_chunk(rest);
            if !prefix.is_empty() {
                items.push(Item::Literal(prefix));
            }
            let Some(chunk) = chunk else {
                break;
            };
            push_chunk(&mut items, &mut components, chunk, suffix);
            rest = suffix;
        }
        Self { items, components }
    }
}

fn push_chunk(items: &mut Vec<Item<'_>>, components: &mut Components, chunk: Chunk, suffix: &str) {
    let item = match chunk {
        Chunk::LongMonth => {
            components.month = true;
            Item::Fixed(Fixed::LongMonthName)
        }
        Chunk::Month => {
            components.month = true;
            Item::Fixed(Fixed::ShortMonthName)
        }
        Chunk::NumMonth | Chunk::ZeroMonth => {
            components.month = true;
            Item::Numeric(Numeric::Month, Pad::Zero)
        }
        Chunk::LongWeekDay => Item::Fixed(Fixed::LongWeekdayName),
        Chunk::WeekDay => Item::Fixed(Fixed::ShortWeekdayName),
        Chunk::Day | Chunk::ZeroDay => {
            components.day = true;
            Item::Numeric(Numeric::Day, Pad::Zero)
        }
        Chunk::UnderDay => {
            components.day = true;
            Item::Numeric(Numeric::Day, Pad::Space)
        }
        Chunk::ZeroYearDay => {
            components.year_day = true;
            Item::Numeric(Numeric::Ordinal, Pad::Zero)
        }
        Chunk::UnderYearDay => {
            components.year_day = true;
            Item::Numeric(Numeric::Ordinal, Pad::Space)
        }
        Chunk::Hour => {
            components.hour = true;
            Item::Numeric(Numeric::Hour, Pad::Zero)
        }
        Chunk::Hour12 | Chunk::ZeroHour12 => {
            components.hour12 = true;
            Item::Numeric(Numeric::Hour12, Pad::Zero)
        }
        Chunk::Minute | Chunk::ZeroMinute => {
            components.minute = true;
            Item::Numeric(Numeric::Minute, Pad::Zero)
        }
        Chunk::Second | Chunk::ZeroSecond => {
            items.push(Item::Numeric(Numeric::Second, Pad::Zero));
            // Fractional seconds are accepted after seconds even when the
            // layout does not spell them out.
            if !suffix.starts_with('.') && !suffix.starts_with(',') {
                items.push(Item::Fixed(Fixed::Nanosecond));
            }
            return;
        }
        Chunk::LongYear => {
            components.year = true;
            Item::Numeric(Numeric::Year, Pad::Zero)
        }
        Chunk::Year => {
            components.year = true;
            Item::Numeric(Numeric::YearMod100, Pad::Zero)
        }
        Chunk::UpperPm => {
            components.am_pm = true;
            Item::Fixed(Fixed::UpperAmPm)
        }
        Chunk::LowerPm => {
            components.am_pm = true;
            Item::Fixed(Fixed::LowerAmPm)
        }
        Chunk::TzName => Item::Fixed(Fixed::TimezoneName),
        Chunk::IsoTzColon => {
            components.offset = true;
            Item::Fixed(Fixed::TimezoneOffsetColonZ)
        }
        Chunk::IsoTz => {
            components.offset = true;
            Item::Fixed(Fixed::TimezoneOffsetZ)
        }
        Chunk::NumTzColon => {
            components.offset = true;
            Item::Fixed(Fixed::TimezoneOffsetColon)
        }
        Chunk::NumTz => {
            components.offset = true;
            Item::Fixed(Fixed::TimezoneOffset)
        }
        Chunk::Fraction => Item::Fixed(Fixed::Nanosecond),
    };
    items.push(item);
}
