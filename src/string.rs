use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{json, GenericError, Generic, Result, ValidFlag, Value};

/// Nullable string.
///
/// Absence is tracked by a [`ValidFlag`], so an explicit empty string is
/// distinct from null: it renders as `""` in JSON, while an invalid
/// `NullString` renders as `null`.
#[derive(Clone, Debug, Default)]
pub struct NullString {
    valid: ValidFlag,
    text: String,
}

impl NullString {
    /// Creates a valid string.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            valid: ValidFlag::new(true),
            text: text.into(),
        }
    }

    /// Creates an invalid (null) string.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.valid.is_valid()
    }

    /// Invalidates the value. The payload is kept but no longer observable.
    pub fn reset(&mut self) {
        self.valid.reset();
    }

    /// Coerces `input` and stores it.
    ///
    /// Accepts null, text, integers, floats, booleans and UTF-8 bytes.
    /// Anything else fails with [`GenericError::InvalidValue`] and leaves
    /// `self` untouched.
    pub fn set(&mut self, input: impl Into<Value>) -> Result<()> {
        match coerce_text(input.into())? {
            Some(text) => {
                self.text = text;
                self.valid.set_valid();
            }
            None => {
                self.text.clear();
                self.valid.reset();
            }
        }
        Ok(())
    }

    /// Store-side hook; same coercion as [`NullString::set`].
    pub fn scan(&mut self, input: impl Into<Value>) -> Result<()> {
        self.set(input)
    }

    /// Returns the text, or `""` when invalid.
    pub fn as_str(&self) -> &str {
        if self.valid() {
            &self.text
        } else {
            ""
        }
    }

    pub fn as_option(&self) -> Option<&str> {
        self.valid().then_some(self.text.as_str())
    }

    pub fn into_option(self) -> Option<String> {
        self.valid.is_valid().then_some(self.text)
    }

    /// Returns the text as a [`Value`], or [`Value::Null`] when invalid.
    pub fn weak(&self) -> Value {
        match self.as_option() {
            Some(text) => Value::text(text),
            None => Value::Null,
        }
    }

    /// Storable value: text, or null when invalid.
    pub fn value(&self) -> Value {
        self.weak()
    }

    pub fn marshal_json(&self) -> Result<Vec<u8>> {
        json::to_json(self)
    }

    /// Decodes `data` into `self`.
    ///
    /// Empty input and `null` reset the value without error.
    pub fn unmarshal_json(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::trace!("empty json input, resetting string");
            *self = Self::default();
            return Ok(());
        }
        *self = serde_json::from_slice(data)?;
        Ok(())
    }
}

fn coerce_text(input: Value) -> Result<Option<String>> {
    match input {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        Value::Bool(value) => Ok(Some(value.to_string())),
        Value::Integer(value) => Ok(Some(value.to_string())),
        Value::Unsigned(value) => Ok(Some(value.to_string())),
        Value::Float(value) => Ok(Some(value.to_string())),
        Value::Bytes(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|err| GenericError::invalid(Value::Bytes(err.into_bytes()))),
        other @ (Value::Timestamp(_) | Value::Array(_) | Value::Object(_)) => {
            Err(GenericError::invalid(other))
        }
    }
}

/// Builds a [`NullString`] from `input` using the [`NullString::set`] rules.
pub fn marshal_string(input: impl Into<Value>) -> Result<NullString> {
    let mut out = NullString::default();
    out.set(input)?;
    Ok(out)
}

/// Like [`marshal_string`], but panics on rejected input.
///
/// # Panics
///
/// Panics when `input` cannot be coerced into a string.
pub fn must_string(input: impl Into<Value>) -> NullString {
    marshal_string(input).unwrap_or_else(|err| panic!("must_string: {err}"))
}

impl PartialEq for NullString {
    fn eq(&self, other: &Self) -> bool {
        self.as_option() == other.as_option()
    }
}

impl Eq for NullString {}

impl fmt::Display for NullString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for NullString {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for NullString {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Option<String>> for NullString {
    fn from(text: Option<String>) -> Self {
        text.map_or_else(Self::null, Self::new)
    }
}

impl Generic for NullString {
    fn valid(&self) -> bool {
        NullString::valid(self)
    }

    fn reset(&mut self) {
        NullString::reset(self);
    }

    fn set(&mut self, input: Value) -> Result<()> {
        NullString::set(self, input)
    }

    fn weak(&self) -> Value {
        NullString::weak(self)
    }

    fn value(&self) -> Value {
        NullString::value(self)
    }
}

impl Serialize for NullString {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_option() {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for NullString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(NullStringVisitor)
    }
}

/// Accepts strings plus JSON numbers and booleans, which decode to their
/// textual form.
struct NullStringVisitor;

impl<'de> Visitor<'de> for NullStringVisitor {
    type Value = NullString;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean or null")
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<NullString, E> {
        Ok(NullString::null())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<NullString, E> {
        Ok(NullString::null())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<NullString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<NullString, E> {
        Ok(NullString::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<NullString, E> {
        Ok(NullString::new(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<NullString, E> {
        Ok(NullString::new(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<NullString, E> {
        Ok(NullString::new(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<NullString, E> {
        Ok(NullString::new(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<NullString, E> {
        Ok(NullString::new(v.to_string()))
    }
}
