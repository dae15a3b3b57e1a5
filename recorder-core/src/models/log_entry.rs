use std::ops::Range;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Format of the bracketed timestamp that prefixes every console line.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Delimiter between the headline and the body of a recorder status line.
pub const HEADLINE_DELIMITER: &str = ": ";

/// Console category of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    Recording,
    Recorded,
    Deleting,
    TrackExists,
    Plain,
}

impl LogCategory {
    /// Recorder status lines are split into a bold headline and a body.
    pub fn is_recorder_status(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// Key of a console message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Recording,
    Recorded,
    Deleting,
    TrackExists,
    PreviousLogs,
    SessionStarted,
    SessionStopped,
    StopScheduled,
    WorkerCrashed,
    DirectoryNotFound,
    DeviceUnavailable,
}

impl MessageKey {
    pub const ALL: [MessageKey; 11] = [
        MessageKey::Recording,
        MessageKey::Recorded,
        MessageKey::Deleting,
        MessageKey::TrackExists,
        MessageKey::PreviousLogs,
        MessageKey::SessionStarted,
        MessageKey::SessionStopped,
        MessageKey::StopScheduled,
        MessageKey::WorkerCrashed,
        MessageKey::DirectoryNotFound,
        MessageKey::DeviceUnavailable,
    ];

    pub fn category(&self) -> LogCategory {
        match self {
            Self::Recording => LogCategory::Recording,
            Self::Recorded => LogCategory::Recorded,
            Self::Deleting => LogCategory::Deleting,
            Self::TrackExists => LogCategory::TrackExists,
            _ => LogCategory::Plain,
        }
    }
}

/// How the UI should weigh a segment of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Regular,
    Primary,
    Secondary,
    Alternate,
}

/// Structural rendering hint for one display line.
///
/// Ranges are byte offsets into the display line passed alongside the hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleHint {
    pub category: LogCategory,
    pub timestamp: Range<usize>,
    pub headline: Option<(Range<usize>, Emphasis)>,
    pub body: (Range<usize>, Emphasis),
}

impl StyleHint {
    /// Hint for a line with no structure, such as a replayed one.
    pub fn plain(line: &str) -> Self {
        Self {
            category: LogCategory::Plain,
            timestamp: 0..0,
            headline: None,
            body: (0..line.len(), Emphasis::Regular),
        }
    }
}

/// One immutable console entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: NaiveTime,
    pub category: LogCategory,
    pub headline: Option<String>,
    pub body: String,
}

impl LogEntry {
    /// Builds an entry, splitting recorder status messages at the first
    /// `": "`. The delimiter stays at the front of the body so that
    /// `headline + body` is the message as rendered.
    pub fn new(timestamp: NaiveTime, category: LogCategory, message: &str) -> Self {
        let split = if category.is_recorder_status() {
            message
                .find(HEADLINE_DELIMITER)
                .filter(|&idx| idx > 0)
                .map(|idx| (message[..idx].to_string(), message[idx..].to_string()))
        } else {
            None
        };

        match split {
            Some((headline, body)) => Self {
                timestamp,
                category,
                headline: Some(headline),
                body,
            },
            None => Self {
                timestamp,
                category,
                headline: None,
                body: message.to_string(),
            },
        }
    }

    /// The formatted message, headline and body joined.
    pub fn message(&self) -> String {
        match &self.headline {
            Some(headline) => format!("{}{}", headline, self.body),
            None => self.body.clone(),
        }
    }

    /// `[HH:MM:SS] ` prefix shared by console and persisted lines.
    pub fn timestamp_prefix(&self) -> String {
        timestamp_prefix(self.timestamp)
    }

    /// The line shown in the console.
    pub fn display_line(&self) -> String {
        format!("{}{}", self.timestamp_prefix(), self.message())
    }

    pub fn style_hint(&self) -> StyleHint {
        let ts_len = self.timestamp_prefix().len();
        let headline = self.headline.as_ref().map(|h| {
            let emphasis = if self.category == LogCategory::Recording {
                Emphasis::Primary
            } else {
                Emphasis::Secondary
            };
            (ts_len..ts_len + h.len(), emphasis)
        });
        let body_start = headline.as_ref().map_or(ts_len, |(r, _)| r.end);
        let body_emphasis = match (self.category, &self.headline) {
            (_, None) => Emphasis::Regular,
            (LogCategory::Deleting, _) => Emphasis::Alternate,
            _ => Emphasis::Secondary,
        };
        StyleHint {
            category: self.category,
            timestamp: 0..ts_len,
            headline,
            body: (body_start..body_start + self.body.len(), body_emphasis),
        }
    }
}

pub fn timestamp_prefix(time: NaiveTime) -> String {
    format!("[{}] ", time.format(TIMESTAMP_FORMAT))
}
