//! Byte-level coercion of column values into struct fields.
//!
//! Drivers hand columns over as raw text bytes; [`DecodeRaw`] turns them into the
//! field's type. Decoding never fails: unparsable input leaves the type's zero value.

use crate::value::Value;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_LEN: usize = 19;
const DATE_LEN: usize = 10;
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A field that can be assigned from a column's raw bytes (`None` is `NULL`).
///
/// Returns whether `raw` was understood. On `false` the field holds its zero value, or
/// is left untouched for date and time types given too few bytes.
///
/// The trait is object safe so derived [`FromRow`](crate::FromRow) types can hand out
/// `&mut dyn DecodeRaw` for any of their fields.
pub trait DecodeRaw {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool;
}

/// Parse a textual boolean the way SQL drivers print them.
pub(crate) fn parse_bool(raw: &[u8]) -> Option<bool> {
    match raw {
        b"1" | b"t" | b"T" | b"true" | b"TRUE" | b"True" => Some(true),
        b"0" | b"f" | b"F" | b"false" | b"FALSE" | b"False" => Some(false),
        _ => None,
    }
}

fn parse_text<T: std::str::FromStr>(raw: Option<&[u8]>) -> Option<T> {
    raw.and_then(|b| std::str::from_utf8(b).ok())
        .and_then(|s| s.parse().ok())
}

fn assign<T: Default>(slot: &mut T, parsed: Option<T>) -> bool {
    let ok = parsed.is_some();
    *slot = parsed.unwrap_or_default();
    ok
}

impl DecodeRaw for bool {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        assign(self, raw.and_then(parse_bool))
    }
}

macro_rules! decode_parsed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DecodeRaw for $ty {
                fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
                    assign(self, parse_text(raw))
                }
            }
        )*
    };
}

decode_parsed!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

#[cfg(feature = "rust_decimal")]
decode_parsed!(rust_decimal::Decimal);

impl DecodeRaw for String {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        *self = String::from_utf8_lossy(raw.unwrap_or_default()).into_owned();
        raw.is_some()
    }
}

impl DecodeRaw for Vec<u8> {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        *self = raw.unwrap_or_default().to_vec();
        raw.is_some()
    }
}

impl DecodeRaw for Bytes {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        *self = raw.map(Bytes::copy_from_slice).unwrap_or_default();
        raw.is_some()
    }
}

impl DecodeRaw for Value {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        *self = Value::from_raw(raw.map(Bytes::copy_from_slice));
        true
    }
}

impl DecodeRaw for NaiveDateTime {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        let raw = raw.unwrap_or_default();
        if raw.len() >= DATETIME_LEN {
            let parsed = std::str::from_utf8(&raw[..DATETIME_LEN])
                .ok()
                .and_then(|s| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok());
            assign(self, parsed)
        } else if raw.len() >= DATE_LEN {
            assign(
                self,
                parse_date(&raw[..DATE_LEN]).and_then(|d| d.and_hms_opt(0, 0, 0)),
            )
        } else {
            false
        }
    }
}

impl DecodeRaw for DateTime<Utc> {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        let mut naive = self.naive_utc();
        let ok = naive.decode_raw(raw);
        *self = naive.and_utc();
        ok
    }
}

impl DecodeRaw for NaiveDate {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        let raw = raw.unwrap_or_default();
        if raw.len() < DATE_LEN {
            return false;
        }
        assign(self, parse_date(&raw[..DATE_LEN]))
    }
}

fn parse_date(raw: &[u8]) -> Option<NaiveDate> {
    let s = std::str::from_utf8(raw).ok()?;
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

impl DecodeRaw for uuid::Uuid {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        assign(self, raw.and_then(|b| uuid::Uuid::try_parse_ascii(b).ok()))
    }
}

impl DecodeRaw for serde_json::Value {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        assign(self, raw.and_then(|b| serde_json::from_slice(b).ok()))
    }
}

// `Some` only when the inner value decoded; NULL and unparsable input give `None`.
impl<T: DecodeRaw + Default> DecodeRaw for Option<T> {
    fn decode_raw(&mut self, raw: Option<&[u8]>) -> bool {
        let mut inner = T::default();
        let ok = raw.is_some() && inner.decode_raw(raw);
        *self = ok.then_some(inner);
        ok
    }
}
