//! Typed conversions between field values and stored values.
//!
//! Every field carries a [`Codec`]: `encode` runs before a value is written to
//! a store, `decode` runs after a value is read back. The typed codecs here all
//! encode to strings so they can back onto string-only stores such as
//! [`bonfig_store::SectionedStore`] or [`bonfig_store::EnvStore`]; when
//! decoding they accept both that string form and a native JSON scalar of the
//! matching type.
//!
//! # Booleans
//!
//! [`Bool`] writes `"True"` or `"False"`. Reads are case-insensitive and accept
//! exactly `true`, `yes`, `on`, `1` and `false`, `no`, `off`, `0`, plus JSON
//! booleans. Anything else is a [`CodecError::Parse`]; nothing is silently
//! coerced to `true`.

use std::fmt::{self, Display, Write as _};
use std::marker::PhantomData;
use std::str::FromStr;

use chrono::format::{Item, ParseErrorKind, ParseResult, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::{CodecError, CodecResult};

/// Pair of transforms applied around store access.
pub trait Codec: Send + Sync + 'static {
    /// Type exposed to callers.
    type Value: 'static;

    /// Name of the produced type, used in error messages.
    fn type_name(&self) -> &str;

    /// Converts a value into its stored form (pre-write).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the value has no stored representation.
    fn encode(&self, value: &Self::Value) -> CodecResult<Value>;

    /// Converts a stored value back into a typed value (post-read).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the stored value cannot be interpreted.
    fn decode(&self, raw: Value) -> CodecResult<Self::Value>;
}

/// Identity codec; values are stored exactly as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Codec for Raw {
    type Value = Value;

    fn type_name(&self) -> &str {
        "value"
    }

    fn encode(&self, value: &Value) -> CodecResult<Value> {
        Ok(value.clone())
    }

    fn decode(&self, raw: Value) -> CodecResult<Value> {
        Ok(raw)
    }
}

/// Plain string codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Codec for Text {
    type Value = String;

    fn type_name(&self) -> &str {
        "string"
    }

    fn encode(&self, value: &String) -> CodecResult<Value> {
        Ok(Value::String(value.clone()))
    }

    fn decode(&self, raw: Value) -> CodecResult<String> {
        match raw {
            Value::String(text) => Ok(text),
            other => Err(CodecError::unexpected(self.type_name(), &other)),
        }
    }
}

fn parse_scalar<T>(expected: &str, raw: Value) -> CodecResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let text = match raw {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        other => return Err(CodecError::unexpected(expected, &other)),
    };
    text.trim()
        .parse()
        .map_err(|err| CodecError::parse(expected, text.as_str(), err))
}

/// Integer codec, stored as decimal text.
pub struct Int<T = i64>(PhantomData<fn() -> T>);

impl<T> Int<T> {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Int<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Int<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Int<{}>", std::any::type_name::<T>())
    }
}

impl<T> Codec for Int<T>
where
    T: FromStr + Display + 'static,
    T::Err: Display,
{
    type Value = T;

    fn type_name(&self) -> &str {
        "integer"
    }

    fn encode(&self, value: &T) -> CodecResult<Value> {
        Ok(Value::String(value.to_string()))
    }

    fn decode(&self, raw: Value) -> CodecResult<T> {
        parse_scalar(self.type_name(), raw)
    }
}

/// Floating-point codec, stored as the shortest text that round-trips.
pub struct Float<T = f64>(PhantomData<fn() -> T>);

impl<T> Float<T> {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Float<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Float<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Float<{}>", std::any::type_name::<T>())
    }
}

impl<T> Codec for Float<T>
where
    T: FromStr + Display + 'static,
    T::Err: Display,
{
    type Value = T;

    fn type_name(&self) -> &str {
        "float"
    }

    fn encode(&self, value: &T) -> CodecResult<Value> {
        Ok(Value::String(value.to_string()))
    }

    fn decode(&self, raw: Value) -> CodecResult<T> {
        parse_scalar(self.type_name(), raw)
    }
}

/// Boolean codec; see the module docs for the accepted spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl Bool {
    /// Stored form of `true`.
    pub const TRUE: &'static str = "True";
    /// Stored form of `false`.
    pub const FALSE: &'static str = "False";

    /// Parses one of the accepted boolean spellings.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Parse`] for any other text.
    pub fn parse(text: &str) -> CodecResult<bool> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(CodecError::parse(
                "boolean",
                text,
                "expected one of true/yes/on/1 or false/no/off/0",
            )),
        }
    }
}

impl Codec for Bool {
    type Value = bool;

    fn type_name(&self) -> &str {
        "boolean"
    }

    fn encode(&self, value: &bool) -> CodecResult<Value> {
        let text = if *value { Self::TRUE } else { Self::FALSE };
        Ok(Value::String(text.to_owned()))
    }

    fn decode(&self, raw: Value) -> CodecResult<bool> {
        match raw {
            Value::Bool(flag) => Ok(flag),
            Value::String(text) => Self::parse(&text),
            other => Err(CodecError::unexpected(self.type_name(), &other)),
        }
    }
}

/// Date-time codec driven by a `strftime`-style format string.
///
/// Formats may omit one half of the value. A date-only format reads back as
/// midnight on that date; a time-only format reads back on 1900-01-01.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime {
    format: String,
}

impl DateTime {
    /// Format used by the built-in `DatetimeField` kind.
    pub const ISO_FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S%.f";

    /// Creates the codec after checking the format string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidFormat`] if the format contains an unknown
    /// specifier.
    pub fn new(format: impl Into<String>) -> CodecResult<Self> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(CodecError::InvalidFormat { format });
        }
        Ok(Self { format })
    }

    /// Creates the codec for [`DateTime::ISO_FORMAT`].
    #[must_use]
    pub fn iso() -> Self {
        Self {
            format: Self::ISO_FORMAT.to_owned(),
        }
    }

    /// Returns the configured format string.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    fn parse(&self, text: &str) -> ParseResult<NaiveDateTime> {
        let err = match NaiveDateTime::parse_from_str(text, &self.format) {
            Err(err) if err.kind() == ParseErrorKind::NotEnough => err,
            parsed => return parsed,
        };
        if let Ok(date) = NaiveDate::parse_from_str(text, &self.format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
        NaiveTime::parse_from_str(text, &self.format)
            .ok()
            .zip(NaiveDate::from_ymd_opt(1900, 1, 1))
            .map(|(time, date)| date.and_time(time))
            .ok_or(err)
    }
}

impl Codec for DateTime {
    type Value = NaiveDateTime;

    fn type_name(&self) -> &str {
        "date-time"
    }

    fn encode(&self, value: &NaiveDateTime) -> CodecResult<Value> {
        let mut text = String::new();
        write!(text, "{}", value.format(&self.format)).map_err(|_| {
            CodecError::InvalidFormat {
                format: self.format.clone(),
            }
        })?;
        Ok(Value::String(text))
    }

    fn decode(&self, raw: Value) -> CodecResult<NaiveDateTime> {
        match raw {
            Value::String(text) => self
                .parse(&text)
                .map_err(|err| CodecError::parse(self.type_name(), text.as_str(), err)),
            other => Err(CodecError::unexpected(self.type_name(), &other)),
        }
    }
}

/// List of strings joined by a separator, e.g. `"1, 2, 3"`.
///
/// An empty stored string decodes to an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimited {
    separator: String,
}

impl Delimited {
    /// Separator used when none is given.
    pub const DEFAULT_SEPARATOR: &'static str = ", ";

    /// Creates the codec with the given separator.
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Returns the separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl Default for Delimited {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEPARATOR)
    }
}

impl Codec for Delimited {
    type Value = Vec<String>;

    fn type_name(&self) -> &str {
        "list"
    }

    fn encode(&self, value: &Vec<String>) -> CodecResult<Value> {
        Ok(Value::String(value.join(&self.separator)))
    }

    fn decode(&self, raw: Value) -> CodecResult<Vec<String>> {
        match raw {
            Value::String(text) if text.is_empty() => Ok(Vec::new()),
            Value::String(text) => Ok(text
                .split(self.separator.as_str())
                .map(str::to_owned)
                .collect()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(text) => Ok(text),
                    other => Err(CodecError::unexpected("string list item", &other)),
                })
                .collect(),
            other => Err(CodecError::unexpected(self.type_name(), &other)),
        }
    }
}
