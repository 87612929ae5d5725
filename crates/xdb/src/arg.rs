//! Positional arguments handed to the driver.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A driver-neutral positional argument.
///
/// Drivers translate each variant into their native binding; an unresolved named
/// token is bound as [`Arg::Null`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Arg {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
}

impl Arg {
    pub fn is_null(&self) -> bool {
        matches!(self, Arg::Null)
    }
}

/// Conversion of a Rust value into an [`Arg`].
///
/// Implemented for the common scalar types; derived [`ToArgs`](crate::ToArgs) structs
/// require it of every non-embedded field.
pub trait ToArg {
    fn to_arg(&self) -> Arg;
}

impl ToArg for Arg {
    fn to_arg(&self) -> Arg {
        self.clone()
    }
}

impl ToArg for bool {
    fn to_arg(&self) -> Arg {
        Arg::Bool(*self)
    }
}

macro_rules! signed_arg {
    ($($ty:ty),*) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Arg {
                    Arg::Int(i64::from(*self))
                }
            }
        )*
    };
}

macro_rules! unsigned_arg {
    ($($ty:ty),*) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Arg {
                    Arg::UInt(u64::from(*self))
                }
            }
        )*
    };
}

signed_arg!(i8, i16, i32, i64);
unsigned_arg!(u8, u16, u32, u64);

impl ToArg for isize {
    fn to_arg(&self) -> Arg {
        Arg::Int(*self as i64)
    }
}

impl ToArg for usize {
    fn to_arg(&self) -> Arg {
        Arg::UInt(*self as u64)
    }
}

impl ToArg for f32 {
    fn to_arg(&self) -> Arg {
        Arg::Float(f64::from(*self))
    }
}

impl ToArg for f64 {
    fn to_arg(&self) -> Arg {
        Arg::Float(*self)
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Arg {
        Arg::Text(self.to_owned())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Arg {
        Arg::Text(self.clone())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Arg {
        Arg::Bytes(self.to_vec())
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Arg {
        Arg::Bytes(self.clone())
    }
}

impl ToArg for bytes::Bytes {
    fn to_arg(&self) -> Arg {
        Arg::Bytes(self.to_vec())
    }
}

impl ToArg for NaiveDate {
    fn to_arg(&self) -> Arg {
        Arg::Date(*self)
    }
}

impl ToArg for NaiveDateTime {
    fn to_arg(&self) -> Arg {
        Arg::DateTime(*self)
    }
}

impl ToArg for DateTime<Utc> {
    fn to_arg(&self) -> Arg {
        Arg::Timestamp(*self)
    }
}

impl ToArg for uuid::Uuid {
    fn to_arg(&self) -> Arg {
        Arg::Uuid(*self)
    }
}

impl ToArg for serde_json::Value {
    fn to_arg(&self) -> Arg {
        Arg::Json(self.clone())
    }
}

#[cfg(feature = "rust_decimal")]
impl ToArg for rust_decimal::Decimal {
    fn to_arg(&self) -> Arg {
        Arg::Text(self.to_string())
    }
}

impl<T: ToArg> ToArg for Option<T> {
    fn to_arg(&self) -> Arg {
        self.as_ref().map(ToArg::to_arg).unwrap_or(Arg::Null)
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Arg {
        (**self).to_arg()
    }
}

impl<T: ToArg + ?Sized> ToArg for Box<T> {
    fn to_arg(&self) -> Arg {
        (**self).to_arg()
    }
}

/// Build a `Vec<Arg>` from heterogeneous values.
///
/// ```ignore
/// stmt.args(xdb::args!["mingo", 42_i64, None::<String>]);
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Arg>::new() };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::ToArg::to_arg(&$value)),+]
    };
}
