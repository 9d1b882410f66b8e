//! Fields shared by every message.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Common envelope fields.
///
/// `date` and `time` are local wall-clock values stamped by whoever produced
/// the message. Time has one-second resolution on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Calendar day, `YYYY-MM-DD`.
    #[serde(with = "crate::wire::date")]
    pub date: NaiveDate,
    /// Time of day, `HH:MM:SS`.
    #[serde(with = "crate::wire::time")]
    pub time: NaiveTime,
    /// Display identity of the producer.
    #[serde(default)]
    pub sender: String,
}

impl Header {
    /// Stamp a header at `at`, truncated to whole seconds.
    pub fn new(sender: impl Into<String>, at: NaiveDateTime) -> Self {
        let time = at.time();
        Self {
            date: at.date(),
            time: time.with_nanosecond(0).unwrap_or(time),
            sender: sender.into(),
        }
    }

    /// Date and time combined.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}
