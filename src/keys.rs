// Well-known message keys and severity levels

/// Timestamp in seconds since the epoch. Set automatically.
pub const KEY_TIME: &str = "Time";
/// Nanosecond part of the timestamp.
pub const KEY_TIME_NSEC: &str = "TimeNanoSec";
/// Sender's address, set by the server.
pub const KEY_HOST: &str = "Host";
/// Sender's identification string. Defaults to the process name.
pub const KEY_SENDER: &str = "Sender";
/// Sender's facility. Defaults to "user".
pub const KEY_FACILITY: &str = "Facility";
/// Sending process ID encoded as a string. Set automatically.
pub const KEY_PID: &str = "PID";
/// UID that sent the message, set by the server.
pub const KEY_UID: &str = "UID";
/// GID that sent the message, set by the server.
pub const KEY_GID: &str = "GID";
/// Log level number encoded as a string.
pub const KEY_LEVEL: &str = "Level";
/// Message text.
pub const KEY_MSG: &str = "Message";
/// User read access (-1 is any user).
pub const KEY_READ_UID: &str = "ReadUID";
/// Group read access (-1 is any group).
pub const KEY_READ_GID: &str = "ReadGID";
/// Expiration time for messages with a long TTL.
pub const KEY_EXPIRE_TIME: &str = "ASLExpireTime";
/// 64-bit message ID, set by the server.
pub const KEY_MSG_ID: &str = "ASLMessageID";
/// Session, set by launchd.
pub const KEY_SESSION: &str = "Session";
/// Reference PID for messages proxied by launchd.
pub const KEY_REF_PID: &str = "RefPID";
/// Reference process for messages proxied by launchd.
pub const KEY_REF_PROC: &str = "RefProc";
pub const KEY_AUX_TITLE: &str = "ASLAuxTitle";
pub const KEY_AUX_UTI: &str = "ASLAuxUTI";
pub const KEY_AUX_URL: &str = "ASLAuxURL";
pub const KEY_AUX_DATA: &str = "ASLAuxData";
/// Internal
pub const KEY_OPTION: &str = "ASLOption";
/// Internal
pub const KEY_MODULE: &str = "ASLModule";
pub const KEY_SENDER_INSTANCE: &str = "SenderInstance";
pub const KEY_SENDER_MACH_UUID: &str = "SenderMachUUID";
/// syslogd posts the value as a notification once the message is processed.
pub const KEY_FINAL_NOTIFICATION: &str = "ASLFinalNotification";
/// Current OS activity of the logging thread.
pub const KEY_OS_ACTIVITY_ID: &str = "OSActivityID";

/// Syslog severity carried in the `Level` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// Map a raw level number to a severity
    pub fn from_raw(raw: i64) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn as_raw(self) -> i64 {
        self as i64
    }

    /// The name ASL uses for this level
    pub fn name(self) -> &'static str {
        match self {
            Level::Emergency => "Emergency",
            Level::Alert => "Alert",
            Level::Critical => "Critical",
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Notice => "Notice",
            Level::Info => "Info",
            Level::Debug => "Debug",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
