//! Field encodings shared by requests and events.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Calendar day format on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-of-day format on the wire (24-hour).
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Accepted on input only; some servers omit seconds.
const SHORT_TIME_FORMAT: &str = "%H:%M";

pub(crate) mod date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(crate) fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(super::DATE_FORMAT))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(raw.trim(), super::DATE_FORMAT).map_err(D::Error::custom)
    }
}

pub(crate) mod opt_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[allow(clippy::ref_option)]
    pub(crate) fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => s.collect_str(&date.format(super::DATE_FORMAT)),
            None => s.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => {
                NaiveDate::parse_from_str(raw.trim(), super::DATE_FORMAT)
                    .map(Some)
                    .map_err(D::Error::custom)
            },
            _ => Ok(None),
        }
    }
}

pub(crate) mod time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(crate) fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format(super::TIME_FORMAT))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, super::TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, super::SHORT_TIME_FORMAT))
            .map_err(D::Error::custom)
    }
}

/// Accept any JSON value as display text.
///
/// Strings pass through, `null` becomes empty, anything else is rendered as
/// compact JSON.
pub(crate) fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Human-readable name of a JSON value's type.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Stamp {
        #[serde(with = "date")]
        date: NaiveDate,
        #[serde(with = "time")]
        time: NaiveTime,
    }

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "lenient_text")]
        message: String,
    }

    #[test]
    fn parses_full_and_short_times() {
        let full: Stamp =
            serde_json::from_str(r#"{"date":"2024-01-02","time":"13:04:05"}"#).unwrap();
        assert_eq!(full.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(full.time, NaiveTime::from_hms_opt(13, 4, 5).unwrap());

        let short: Stamp = serde_json::from_str(r#"{"date":"2024-01-02","time":"07:30"}"#).unwrap();
        assert_eq!(short.time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_date() {
        let result = serde_json::from_str::<Stamp>(r#"{"date":"02/01/2024","time":"10:00:00"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn lenient_text_renders_non_strings() {
        let body: Body = serde_json::from_str(r#"{"message":{"a":1}}"#).unwrap();
        assert_eq!(body.message, r#"{"a":1}"#);

        let body: Body = serde_json::from_str(r#"{"message":null}"#).unwrap();
        assert_eq!(body.message, "");

        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message, "");
    }
}
