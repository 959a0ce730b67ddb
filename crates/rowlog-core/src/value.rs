//! Snapshot encoding.
//!
//! Entities hand their column values to the engine as `FieldValue`s. Each value
//! encodes to a JSON-safe form that is stored in the log row's `data` object:
//! fixed-point numbers and temporal values become strings so nothing is lost
//! to float rounding, and enums are recorded by their symbolic name.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{CoreError, EncodeError};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_MICROS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ---------------------------------------------------------------------------
// Decimal
// ---------------------------------------------------------------------------

/// Fixed-point decimal: `mantissa * 10^-scale`.
///
/// The scale is part of the value, so `12.50` keeps its trailing zero when
/// rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    /// Largest supported scale, the number of decimal digits an `i128` holds.
    pub const MAX_SCALE: u32 = 38;

    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `scale` exceeds [`Self::MAX_SCALE`].
    pub fn new(mantissa: i128, scale: u32) -> Result<Self, CoreError> {
        if scale > Self::MAX_SCALE {
            return Err(CoreError::Validation(format!(
                "decimal scale {scale} exceeds {}",
                Self::MAX_SCALE
            )));
        }
        Ok(Self { mantissa, scale })
    }

    #[must_use]
    pub const fn mantissa(self) -> i128 {
        self.mantissa
    }

    #[must_use]
    pub const fn scale(self) -> u32 {
        self.scale
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl FromStr for Decimal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("invalid decimal literal '{s}'"));

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if unsigned.ends_with('.') {
            return Err(invalid());
        }

        let mut mantissa: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit)))
                .ok_or_else(invalid)?;
        }
        if negative {
            mantissa = -mantissa;
        }

        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Self::new(mantissa, scale)
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A persisted column value as seen by the audit engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    /// Symbolic name of an enum variant, e.g. `"RED"`.
    Enum(String),
    Json(Value),
}

impl FieldValue {
    /// Enum value recorded by its symbolic name.
    pub fn variant(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Encode into a JSON-representable value.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::NonFinite` for NaN or infinite reals.
    pub fn encode(&self) -> Result<Value, EncodeError> {
        let encoded = match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Real(r) => serde_json::Number::from_f64(*r)
                .map(Value::Number)
                .ok_or(EncodeError::NonFinite)?,
            Self::Text(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::Decimal(d) => Value::String(d.to_string()),
            Self::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            Self::DateTime(dt) => Value::String(format_naive_datetime(dt)),
            Self::Timestamp(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Uuid(u) => Value::String(u.hyphenated().to_string()),
            Self::Json(v) => v.clone(),
        };
        Ok(encoded)
    }
}

/// Microseconds are only shown when non-zero.
fn format_naive_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format(DATETIME_FORMAT).to_string()
    } else {
        dt.format(DATETIME_MICROS_FORMAT).to_string()
    }
}

macro_rules! field_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

field_value_from! {
    bool => Bool,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    f64 => Real,
    String => Text,
    &str => Text,
    Decimal => Decimal,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
