use crate::keys::{
    Level, KEY_FACILITY, KEY_GID, KEY_HOST, KEY_LEVEL, KEY_MSG, KEY_MSG_ID, KEY_PID, KEY_READ_GID,
    KEY_READ_UID, KEY_REF_PID, KEY_REF_PROC, KEY_SENDER, KEY_SESSION, KEY_TIME, KEY_TIME_NSEC,
    KEY_UID,
};
use chrono::{DateTime, Utc};
use std::str::FromStr;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Parse `s`, falling back to the type's zero value when it does not parse
pub fn parse_or_zero<T: FromStr + Default>(s: &str) -> T {
    s.parse().unwrap_or_default()
}

/// Typed views over the well-known keys of a log message.
///
/// Every accessor is a projection of [`LogFields::field`]. Missing or
/// malformed values degrade to zero (or an empty string) instead of failing.
pub trait LogFields {
    /// Value of `key`, empty when the key is absent or set to ""
    fn field(&self, key: &str) -> String;

    /// Combined `Time` and `TimeNanoSec`.
    ///
    /// A missing or malformed `Time` yields the Unix epoch, deliberately not
    /// the year-1 "zero time" some log readers report for an unparsable
    /// timestamp. A missing or malformed `TimeNanoSec` yields a whole second.
    fn time(&self) -> DateTime<Utc> {
        let Ok(secs) = self.field(KEY_TIME).parse::<i64>() else {
            return DateTime::<Utc>::UNIX_EPOCH;
        };
        let nanos: i64 = parse_or_zero(&self.field(KEY_TIME_NSEC));

        // Carry whole seconds out of the nanosecond field
        let secs = secs.saturating_add(nanos.div_euclid(NANOS_PER_SEC));
        let nanos = nanos.rem_euclid(NANOS_PER_SEC) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn host(&self) -> String {
        self.field(KEY_HOST)
    }

    fn sender(&self) -> String {
        self.field(KEY_SENDER)
    }

    fn facility(&self) -> String {
        self.field(KEY_FACILITY)
    }

    /// Message text
    fn message(&self) -> String {
        self.field(KEY_MSG)
    }

    fn pid(&self) -> i64 {
        parse_or_zero(&self.field(KEY_PID))
    }

    fn uid(&self) -> i64 {
        parse_or_zero(&self.field(KEY_UID))
    }

    fn gid(&self) -> i64 {
        parse_or_zero(&self.field(KEY_GID))
    }

    /// Server-assigned message ID
    fn id(&self) -> i64 {
        parse_or_zero(&self.field(KEY_MSG_ID))
    }

    /// Raw level number
    fn level(&self) -> i64 {
        parse_or_zero(&self.field(KEY_LEVEL))
    }

    /// Level as a severity, `None` when the level is outside 0..=7
    fn severity(&self) -> Option<Level> {
        Level::from_raw(self.level())
    }

    fn read_uid(&self) -> i64 {
        parse_or_zero(&self.field(KEY_READ_UID))
    }

    fn read_gid(&self) -> i64 {
        parse_or_zero(&self.field(KEY_READ_GID))
    }

    fn ref_pid(&self) -> i64 {
        parse_or_zero(&self.field(KEY_REF_PID))
    }

    fn ref_proc(&self) -> String {
        self.field(KEY_REF_PROC)
    }

    fn session(&self) -> String {
        self.field(KEY_SESSION)
    }
}
