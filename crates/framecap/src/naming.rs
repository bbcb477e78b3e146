//! Output file names for one capture.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

/// Timestamp layout: date, time with dashes, then milliseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S %3f";

/// Common prefix of every file a capture writes.
///
/// The prefix is `<executable><separator><timestamp> `; file names are
/// appended to it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePrefix(OsString);

impl CapturePrefix {
    pub fn new<Tz: TimeZone>(executable: &Path, separator: char, time: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut prefix = executable.as_os_str().to_os_string();
        prefix.push(separator.to_string());
        prefix.push(time.format(TIMESTAMP_FORMAT).to_string());
        prefix.push(" ");
        Self(prefix)
    }

    /// Path of the file called `name` for this capture.
    pub fn file(&self, name: &str) -> PathBuf {
        let mut path = self.0.clone();
        path.push(name);
        PathBuf::from(path)
    }
}
