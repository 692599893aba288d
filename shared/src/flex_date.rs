//! Multi-format date value
//!
//! Warehouse spreadsheets mix month-first, day-first and ISO exports.
//! [`FlexDate`] accepts all of them and normalizes to one of two canonical
//! text forms:
//!
//! | Value | Canonical text |
//! |-------|----------------|
//! | absent | `""` |
//! | midnight | `YYYY-MM-DD` |
//! | any other time | `YYYY-MM-DD HH:MM:SS` |
//!
//! Parsing never fails loudly: input that matches no accepted layout becomes
//! an absent value and the caller decides whether that is acceptable.
//!
//! ```
//! use shared::flex_date::FlexDate;
//!
//! let d = FlexDate::parse("3/4/2024 7:05");
//! assert_eq!(d.to_string(), "2024-03-04 07:05:00");
//!
//! assert!(!FlexDate::parse("not-a-date").is_present());
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted layouts in priority order. First full match wins.
///
/// `YYYY` four digits, `MM`/`DD` two digits, `M`/`D`/`H` one or two digits,
/// `mm`/`ss` two digits. Every other character must match literally.
/// Month-first layouts precede day-first ones, so `03/04/2024` is March 4.
const LAYOUTS: [&str; 14] = [
    "M/D/YYYY H:mm:ss",
    "M/D/YYYY H:mm",
    "MM/DD/YYYY H:mm:ss",
    "MM/DD/YYYY H:mm",
    "YYYY-MM-DD H:mm:ss",
    "YYYY-MM-DDTH:mm:ssZ",
    "YYYY-MM-DDTH:mm:ss",
    "D/M/YYYY H:mm:ss",
    "DD/MM/YYYY H:mm:ss",
    "M/D/YYYY",
    "MM/DD/YYYY",
    "YYYY-MM-DD",
    "D/M/YYYY",
    "DD/MM/YYYY",
];

/// A date or date-time that may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlexDate(Option<NaiveDateTime>);

impl FlexDate {
    /// The absent value
    pub const fn absent() -> Self {
        Self(None)
    }

    /// Wrap a timestamp, dropping sub-second precision
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self(Some(value.with_nanosecond(0).unwrap_or(value)))
    }

    /// Parse free-form text against [`LAYOUTS`]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self::absent();
        }
        LAYOUTS
            .iter()
            .find_map(|layout| match_layout(layout, input))
            .map_or(Self::absent(), Self::from_datetime)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.0
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.0.map(|dt| dt.date())
    }

    /// True when the stored text is already in canonical form
    pub fn is_canonical(text: &str) -> bool {
        Self::parse(text).to_string() == text
    }
}

impl fmt::Display for FlexDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => Ok(()),
            Some(dt) if dt.time() == NaiveTime::MIN => write!(f, "{}", dt.format(DATE_FORMAT)),
            Some(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl FromStr for FlexDate {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<NaiveDate> for FlexDate {
    fn from(date: NaiveDate) -> Self {
        Self(Some(date.and_time(NaiveTime::MIN)))
    }
}

impl From<NaiveDateTime> for FlexDate {
    fn from(value: NaiveDateTime) -> Self {
        Self::from_datetime(value)
    }
}

// ========== Layout matching ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year,
    Month { fixed: bool },
    Day { fixed: bool },
    Hour,
    Minute,
    Second,
    Literal(u8),
}

fn next_token(layout: &[u8]) -> Option<(Token, &[u8])> {
    let (token, width) = match layout {
        [] => return None,
        [b'Y', b'Y', b'Y', b'Y', ..] => (Token::Year, 4),
        [b'M', b'M', ..] => (Token::Month { fixed: true }, 2),
        [b'M', ..] => (Token::Month { fixed: false }, 1),
        [b'D', b'D', ..] => (Token::Day { fixed: true }, 2),
        [b'D', ..] => (Token::Day { fixed: false }, 1),
        [b'H', ..] => (Token::Hour, 1),
        [b'm', b'm', ..] => (Token::Minute, 2),
        [b's', b's', ..] => (Token::Second, 2),
        [c, ..] => (Token::Literal(*c), 1),
    };
    Some((token, &layout[width..]))
}

/// Read between `min` and `max` ASCII digits, greedily
fn take_digits(input: &[u8], pos: &mut usize, min: usize, max: usize) -> Option<u32> {
    let start = *pos;
    let mut end = start;
    while end < input.len() && end - start < max && input[end].is_ascii_digit() {
        end += 1;
    }
    if end - start < min {
        return None;
    }
    *pos = end;
    Some(
        input[start..end]
            .iter()
            .fold(0, |acc, b| acc * 10 + u32::from(b - b'0')),
    )
}

/// A fractional second (`.123` or `,123`) is accepted and discarded
fn skip_fraction(input: &[u8], pos: &mut usize) {
    if let [b'.' | b',', next, ..] = &input[*pos..]
        && next.is_ascii_digit()
    {
        *pos += 1;
        while *pos < input.len() && input[*pos].is_ascii_digit() {
            *pos += 1;
        }
    }
}

fn match_layout(layout: &str, input: &str) -> Option<NaiveDateTime> {
    let input = input.as_bytes();
    let mut layout = layout.as_bytes();
    let mut pos = 0;
    let (mut year, mut month, mut day) = (0i32, 1u32, 1u32);
    let (mut hour, mut minute, mut second) = (0u32, 0u32, 0u32);

    while let Some((token, rest)) = next_token(layout) {
        layout = rest;
        match token {
            Token::Year => year = take_digits(input, &mut pos, 4, 4)? as i32,
            Token::Month { fixed } => {
                month = take_digits(input, &mut pos, if fixed { 2 } else { 1 }, 2)?
            }
            Token::Day { fixed } => day = take_digits(input, &mut pos, if fixed { 2 } else { 1 }, 2)?,
            Token::Hour => hour = take_digits(input, &mut pos, 1, 2)?,
            Token::Minute => minute = take_digits(input, &mut pos, 2, 2)?,
            Token::Second => {
                second = take_digits(input, &mut pos, 2, 2)?;
                skip_fraction(input, &mut pos);
            }
            Token::Literal(c) => {
                if input.get(pos) != Some(&c) {
                    return None;
                }
                pos += 1;
            }
        }
    }

    if pos != input.len() {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(date.and_time(time))
}

// ========== Transport ==========

impl Serialize for FlexDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct FlexDateVisitor;

impl<'de> Visitor<'de> for FlexDateVisitor {
    type Value = FlexDate;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a date string, null, or an empty string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FlexDate, E> {
        Ok(FlexDate::parse(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<FlexDate, E> {
        Ok(FlexDate::absent())
    }

    fn visit_none<E: de::Error>(self) -> Result<FlexDate, E> {
        Ok(FlexDate::absent())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<FlexDate, D::Error> {
        deserializer.deserialize_any(self)
    }

    // Spreadsheet exports sometimes send bare numbers; they go through the
    // same layouts as text and usually end up absent.
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FlexDate, E> {
        Ok(FlexDate::parse(&v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FlexDate, E> {
        Ok(FlexDate::parse(&v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FlexDate, E> {
        Ok(FlexDate::parse(&v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<FlexDate, E> {
        Ok(FlexDate::absent())
    }

    // Objects and arrays are drained and dropped
    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<FlexDate, A::Error> {
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(FlexDate::absent())
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<FlexDate, A::Error> {
        while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
        Ok(FlexDate::absent())
    }
}

impl<'de> Deserialize<'de> for FlexDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FlexDateVisitor)
    }
}

// ========== Store ==========

#[cfg(feature = "db")]
mod store {
    use super::FlexDate;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::sqlite::{Sqlite, SqliteTypeInfo, SqliteValueRef};
    use sqlx::{Database, Decode, Encode, Type, ValueRef};

    /// Persisted as plain TEXT so legacy values stay readable
    impl Type<Sqlite> for FlexDate {
        fn type_info() -> SqliteTypeInfo {
            <str as Type<Sqlite>>::type_info()
        }

        fn compatible(ty: &SqliteTypeInfo) -> bool {
            <str as Type<Sqlite>>::compatible(ty)
        }
    }

    impl<'q> Encode<'q, Sqlite> for FlexDate {
        fn encode_by_ref(
            &self,
            buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
        ) -> Result<IsNull, BoxDynError> {
            <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
        }
    }

    impl<'r> Decode<'r, Sqlite> for FlexDate {
        fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
            if value.is_null() {
                return Ok(FlexDate::absent());
            }
            let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
            Ok(FlexDate::parse(text))
        }
    }
}
