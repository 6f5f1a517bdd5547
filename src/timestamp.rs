use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{json, GenericError, Generic, Result, ValidFlag, Value};

/// Nullable timestamp with millisecond resolution.
///
/// Unlike [`NullString`](crate::NullString), `set` never accepts text, even
/// numeric text. Only timestamps and integer milliseconds since the Unix
/// epoch are coerced.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampMs {
    valid: ValidFlag,
    time: DateTime<Utc>,
}

impl TimestampMs {
    /// Creates a valid timestamp.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            valid: ValidFlag::new(true),
            time,
        }
    }

    /// Creates an invalid (null) timestamp.
    pub fn null() -> Self {
        Self::default()
    }

    /// Creates a valid timestamp from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Result<Self> {
        instant_from_millis(millis).map(Self::new)
    }

    pub fn valid(&self) -> bool {
        self.valid.is_valid()
    }

    /// Invalidates the value. The stored instant is kept but no longer
    /// observable.
    pub fn reset(&mut self) {
        self.valid.reset();
    }

    /// Coerces `input` and stores it.
    ///
    /// Accepts null, timestamps, and integers as milliseconds since the Unix
    /// epoch. Text is rejected even when numeric. A rejected input leaves
    /// `self` untouched.
    pub fn set(&mut self, input: impl Into<Value>) -> Result<()> {
        match input.into() {
            Value::Null => {
                self.time = DateTime::UNIX_EPOCH;
                self.valid.reset();
            }
            Value::Timestamp(time) => {
                self.time = time;
                self.valid.set_valid();
            }
            Value::Integer(millis) => {
                self.time = instant_from_millis(millis)?;
                self.valid.set_valid();
            }
            Value::Unsigned(millis) => {
                let signed = i64::try_from(millis)
                    .map_err(|_| GenericError::invalid(Value::Unsigned(millis)))?;
                self.time = instant_from_millis(signed)?;
                self.valid.set_valid();
            }
            other => return Err(GenericError::invalid(other)),
        }
        Ok(())
    }

    /// Store-side hook; same coercion as [`TimestampMs::set`].
    pub fn scan(&mut self, input: impl Into<Value>) -> Result<()> {
        self.set(input)
    }

    /// Returns the stored instant, or the Unix epoch when invalid.
    pub fn time(&self) -> DateTime<Utc> {
        if self.valid() {
            self.time
        } else {
            DateTime::UNIX_EPOCH
        }
    }

    pub fn as_option(&self) -> Option<DateTime<Utc>> {
        self.valid().then_some(self.time)
    }

    /// Milliseconds since the Unix epoch, or `0` when invalid.
    pub fn int64(&self) -> i64 {
        self.as_option().map_or(0, |time| time.timestamp_millis())
    }

    /// Native-width variant of [`TimestampMs::int64`].
    pub fn int(&self) -> isize {
        self.int64() as isize
    }

    /// Returns the milliseconds as a [`Value`], or [`Value::Null`] when
    /// invalid. Use this rather than [`TimestampMs::int64`] to observe
    /// absence.
    pub fn weak(&self) -> Value {
        match self.as_option() {
            Some(time) => Value::Integer(time.timestamp_millis()),
            None => Value::Null,
        }
    }

    /// Storable value: integer milliseconds, or null when invalid.
    pub fn value(&self) -> Value {
        self.weak()
    }

    pub fn marshal_json(&self) -> Result<Vec<u8>> {
        json::to_json(self)
    }

    /// Decodes `data` into `self`.
    ///
    /// Accepts an RFC 3339 string or integer milliseconds; the instant is
    /// truncated to milliseconds. Empty input and `null` reset the value
    /// without error.
    pub fn unmarshal_json(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::trace!("empty json input, resetting timestamp");
            *self = Self::default();
            return Ok(());
        }
        *self = serde_json::from_slice(data)?;
        Ok(())
    }
}

fn instant_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| GenericError::invalid(Value::Integer(millis)))
}

/// Builds a [`TimestampMs`] from `input` using the [`TimestampMs::set`] rules.
pub fn marshal_timestamp_ms(input: impl Into<Value>) -> Result<TimestampMs> {
    let mut out = TimestampMs::default();
    out.set(input)?;
    Ok(out)
}

/// Like [`marshal_timestamp_ms`], but panics on rejected input.
///
/// # Panics
///
/// Panics when `input` cannot be coerced into a timestamp.
pub fn must_timestamp_ms(input: impl Into<Value>) -> TimestampMs {
    marshal_timestamp_ms(input).unwrap_or_else(|err| panic!("must_timestamp_ms: {err}"))
}

impl PartialEq for TimestampMs {
    fn eq(&self, other: &Self) -> bool {
        self.as_option() == other.as_option()
    }
}

impl Eq for TimestampMs {}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_option() {
            Some(time) => write!(f, "{}", time.timestamp_millis()),
            None => Ok(()),
        }
    }
}

impl From<DateTime<Utc>> for TimestampMs {
    fn from(time: DateTime<Utc>) -> Self {
        Self::new(time)
    }
}

impl From<Option<DateTime<Utc>>> for TimestampMs {
    fn from(time: Option<DateTime<Utc>>) -> Self {
        time.map_or_else(Self::null, Self::new)
    }
}

impl Generic for TimestampMs {
    fn valid(&self) -> bool {
        TimestampMs::valid(self)
    }

    fn reset(&mut self) {
        TimestampMs::reset(self);
    }

    fn set(&mut self, input: Value) -> Result<()> {
        TimestampMs::set(self, input)
    }

    fn weak(&self) -> Value {
        TimestampMs::weak(self)
    }

    fn value(&self) -> Value {
        TimestampMs::value(self)
    }
}

impl Serialize for TimestampMs {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_option() {
            Some(time) => serializer.serialize_i64(time.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TimestampMs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(TimestampMsVisitor)
    }
}

struct TimestampMsVisitor;

impl<'de> Visitor<'de> for TimestampMsVisitor {
    type Value = TimestampMs;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp, integer milliseconds or null")
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<TimestampMs, E> {
        Ok(TimestampMs::null())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<TimestampMs, E> {
        Ok(TimestampMs::null())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<TimestampMs, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<TimestampMs, E> {
        let parsed = DateTime::parse_from_rfc3339(v)
            .map_err(|err| E::custom(format!("invalid timestamp '{v}': {err}")))?;
        Ok(TimestampMs::new(parsed.with_timezone(&Utc).trunc_subsecs(3)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<TimestampMs, E> {
        DateTime::from_timestamp_millis(v)
            .map(TimestampMs::new)
            .ok_or_else(|| E::custom(format!("timestamp millis out of range: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<TimestampMs, E> {
        let signed = i64::try_from(v)
            .map_err(|_| E::custom(format!("timestamp millis out of range: {v}")))?;
        self.visit_i64(signed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, SubsecRound, Utc};

    use crate::{
        marshal_timestamp_ms, must_timestamp_ms, GenericError, TimestampMs, ValidFlag, Value,
    };

    fn now_millis() -> (DateTime<Utc>, i64) {
        let now = Utc::now();
        (now, now.timestamp_millis())
    }

    #[test]
    fn marshal_from_time() {
        let (now, expected) = now_millis();
        let ts = marshal_timestamp_ms(now).expect("must coerce");
        assert_eq!(ts.weak(), Value::Integer(expected));
    }

    #[test]
    fn must_from_time() {
        let (now, expected) = now_millis();
        let ts = must_timestamp_ms(now);
        assert_eq!(ts.weak(), Value::Integer(expected));
        assert_eq!(ts, TimestampMs::new(now));
    }

    #[test]
    #[should_panic(expected = "invalid value: (string)")]
    fn must_panics_on_text() {
        must_timestamp_ms("valid paramenter");
    }

    #[test]
    fn marshal_json_is_integer() {
        let (now, expected) = now_millis();
        let ts = TimestampMs::new(now);
        let out = ts.marshal_json().expect("must encode");
        assert_eq!(out, expected.to_string().into_bytes());
    }

    #[test]
    fn marshal_json_invalid_is_null() {
        let ts = TimestampMs {
            valid: ValidFlag::new(false),
            time: Utc::now(),
        };
        assert_eq!(ts.marshal_json().expect("must encode"), b"null");
    }

    #[test]
    fn unmarshal_rfc3339() {
        let (now, expected) = now_millis();
        let input = serde_json::to_vec(&now).expect("must encode chrono time");
        let mut ts = TimestampMs::default();
        ts.unmarshal_json(&input).expect("must decode");
        assert!(ts.valid());
        assert_eq!(ts.int64(), expected);
        assert_eq!(ts.time(), now.trunc_subsecs(3));
    }

    #[test]
    fn unmarshal_with_offset() {
        let mut ts = TimestampMs::default();
        ts.unmarshal_json(br#""1970-01-01T09:00:01.5+09:00""#)
            .expect("must decode");
        assert_eq!(ts.int64(), 1_500);
    }

    #[test]
    fn unmarshal_empty_input() {
        let mut ts = TimestampMs::new(Utc::now());
        ts.unmarshal_json(&[]).expect("empty input is accepted");
        assert!(!ts.valid());
        assert_eq!(ts.int64(), 0);
    }

    #[test]
    fn unmarshal_null() {
        let mut ts = TimestampMs::new(Utc::now());
        ts.unmarshal_json(b"null").expect("null is accepted");
        assert!(!ts.valid());
        assert_eq!(ts.weak(), Value::Null);
    }

    #[test]
    fn unmarshal_malformed() {
        let mut ts = TimestampMs::default();
        let err = ts.unmarshal_json(br#""a"#).expect_err("must fail");
        assert!(matches!(err, GenericError::Json(_)));

        let err = ts.unmarshal_json(br#""not a time""#).expect_err("must fail");
        assert!(matches!(err, GenericError::Json(_)));

        ts.unmarshal_json(b"true").expect_err("booleans are not times");
        assert!(!ts.valid());
    }

    #[test]
    fn set_null() {
        let mut ts = TimestampMs::new(Utc::now());
        ts.set(Value::Null).expect("null is accepted");
        assert_eq!(ts.value(), Value::Null);
        assert_eq!(ts.time, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn set_time() {
        let (now, expected) = now_millis();
        let mut ts = TimestampMs::default();
        ts.set(now).expect("must coerce");
        assert_eq!(ts.weak(), Value::Integer(expected));
    }

    #[test]
    fn set_integer_millis() {
        let mut ts = TimestampMs::default();
        ts.set(1_367_059_792_i64).expect("must coerce");
        assert_eq!(ts.weak(), Value::Integer(1_367_059_792));
        assert_eq!(ts.time().timestamp(), 1_367_059);
    }

    #[test]
    fn set_rejects_numeric_text() {
        let mut ts = TimestampMs::default();
        let err = ts.set("1467059792").expect_err("must reject");
        assert!(matches!(err, GenericError::InvalidValue(Value::Text(_))));
        assert_eq!(ts.weak(), Value::Null);
    }

    #[test]
    fn set_rejects_non_numeric_text() {
        let mut ts = TimestampMs::default();
        ts.set("a").expect_err("must reject");
        assert_eq!(ts.weak(), Value::Null);
    }

    #[test]
    fn set_rejects_bool() {
        let mut ts = TimestampMs::default();
        ts.set(true).expect_err("must reject");
        assert_eq!(ts.weak(), Value::Null);
    }

    #[test]
    fn set_rejects_out_of_range_millis() {
        let mut ts = TimestampMs::from_millis(42).expect("in range");
        let err = ts.set(i64::MAX).expect_err("must reject");
        assert!(matches!(err, GenericError::InvalidValue(Value::Integer(i64::MAX))));
        assert_eq!(ts.int64(), 42);

        ts.set(u64::MAX).expect_err("must reject");
        assert_eq!(ts.int64(), 42);
    }

    #[test]
    fn int64_and_int() {
        let (now, expected) = now_millis();
        let ts = TimestampMs::new(now);
        assert_eq!(ts.int64(), expected);
        assert_eq!(ts.int(), expected as isize);
    }

    #[test]
    fn int64_at_epoch_is_zero() {
        let ts = TimestampMs::new(DateTime::UNIX_EPOCH);
        assert!(ts.valid());
        assert_eq!(ts.int64(), 0);
        assert_eq!(ts.weak(), Value::Integer(0));
    }

    #[test]
    fn display() {
        let (now, expected) = now_millis();
        assert_eq!(TimestampMs::new(now).to_string(), expected.to_string());
        assert_eq!(TimestampMs::null().to_string(), "");
    }

    #[test]
    fn time_accessor() {
        let now = Utc::now();
        let cases = [
            ("now", ValidFlag::new(true), now, now),
            ("invalid", ValidFlag::new(false), now, DateTime::UNIX_EPOCH),
        ];
        for (name, valid, time, want) in cases {
            let ts = TimestampMs { valid, time };
            assert_eq!(ts.time(), want, "case {name}");
        }
    }

    #[test]
    fn invalid_int_accessors_fall_back_to_zero() {
        let mut ts = TimestampMs::new(Utc::now());
        ts.reset();
        assert_eq!(ts.int64(), 0);
        assert_eq!(ts.int(), 0);
        assert_eq!(ts.weak(), Value::Null);
    }
}
