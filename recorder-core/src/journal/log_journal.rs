use std::sync::Arc;

use chrono::{Local, NaiveTime};
use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::models::log_entry::{timestamp_prefix, LogEntry, MessageKey, StyleHint};
use crate::traits::message_resolver::MessageResolver;
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::settings_store::SettingsStore;

/// Store key of the persisted console history.
pub const LOGS_KEY: &str = "logs";

/// Separator that starts every persisted entry.
pub const ENTRY_SEPARATOR: char = ';';

/// Replacement for separators that occur inside a message.
const SEPARATOR_ESCAPE: char = ',';

const FALLBACK_PREVIOUS_LOGS: &str = "Previous logs";

/// Append-only console journal with synchronous persistence.
///
/// ## Persisted format
///
/// ```text
/// ;[HH:MM:SS] <message>;[HH:MM:SS] <message>...
/// ```
///
/// The whole history is one string under `LOGS_KEY`. `append` rewrites it
/// before returning, so an entry is never in memory without a write having
/// been attempted. A failed write leaves the entry in memory and the next
/// append retries with the full history.
///
/// The journal is shared between the UI thread and the recording worker.
/// Delegate callbacks fire after the internal lock is released, so a
/// delegate may read the journal back from inside them.
pub struct LogJournal {
    resolver: Arc<dyn MessageResolver>,
    store: Arc<dyn SettingsStore>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    state: Mutex<JournalState>,
}

struct JournalState {
    entries: Vec<LogEntry>,
    console: Vec<String>,
    history: String,
    unsaved: bool,
}

impl LogJournal {
    /// Create a journal, loading the persisted history from `store`.
    ///
    /// Nothing is displayed until `replay_history` is called.
    pub fn new(resolver: Arc<dyn MessageResolver>, store: Arc<dyn SettingsStore>) -> Self {
        let history = match store.load(LOGS_KEY) {
            Ok(blob) => blob.unwrap_or_default(),
            Err(e) => {
                log::warn!("Console history unavailable: {}", e);
                String::new()
            }
        };

        Self {
            resolver,
            store,
            delegate: None,
            state: Mutex::new(JournalState {
                entries: Vec::new(),
                console: Vec::new(),
                history,
                unsaved: false,
            }),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Format, record and persist a message. Returns `None` when the
    /// template resolves to nothing.
    pub fn append(&self, key: MessageKey, args: &[&str]) -> Option<LogEntry> {
        self.append_at(Local::now().time(), key, args)
    }

    pub fn append_at(&self, time: NaiveTime, key: MessageKey, args: &[&str]) -> Option<LogEntry> {
        let message = self.resolver.resolve(key, args).filter(|m| !m.is_empty())?;
        let entry = LogEntry::new(time, key.category(), &message);
        let line = entry.display_line();

        let failure = {
            let mut s = self.state.lock();
            s.history.push_str(&Self::serialize(&entry));
            let failure = self.persist(&mut *s);
            s.console.push(line.clone());
            s.entries.push(entry.clone());
            failure
        };

        if let Some(ref delegate) = self.delegate {
            if let Some(ref error) = failure {
                delegate.on_error(error);
            }
            delegate.on_log_appended(&line, &entry.style_hint());
        }

        Some(entry)
    }

    /// Persisted form of one entry: `;[HH:MM:SS] <message>`.
    pub fn serialize(entry: &LogEntry) -> String {
        let message = entry.message().replace(ENTRY_SEPARATOR, &SEPARATOR_ESCAPE.to_string());
        format!("{}{}{}", ENTRY_SEPARATOR, entry.timestamp_prefix(), message)
    }

    /// Split a persisted history into display lines, followed by one
    /// "previous logs" marker stamped with the current time. An empty
    /// history yields no lines at all.
    pub fn replay(&self, blob: &str) -> Vec<String> {
        self.replay_at(blob, Local::now().time())
    }

    pub fn replay_at(&self, blob: &str, now: NaiveTime) -> Vec<String> {
        let mut lines: Vec<String> = blob
            .split(ENTRY_SEPARATOR)
            .filter(|segment| !segment.trim().is_empty())
            .map(str::to_string)
            .collect();

        if lines.is_empty() {
            return lines;
        }

        let marker = self
            .resolver
            .resolve(MessageKey::PreviousLogs, &[])
            .unwrap_or_else(|| FALLBACK_PREVIOUS_LOGS.to_string());
        lines.push(format!("{}{}", timestamp_prefix(now), marker));
        lines
    }

    /// Show the history loaded at construction. Does not persist anything.
    pub fn replay_history(&self) -> Vec<String> {
        let lines = {
            let mut s = self.state.lock();
            let lines = self.replay(&s.history);
            s.console.extend(lines.iter().cloned());
            lines
        };

        if let Some(ref delegate) = self.delegate {
            for line in &lines {
                delegate.on_log_appended(line, &StyleHint::plain(line));
            }
        }
        lines
    }

    /// Clear the visible console. Persisted history is kept.
    pub fn clear_console(&self) {
        self.state.lock().console.clear();
    }

    /// Entries appended since startup, in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.state.lock().entries.clone()
    }

    /// Lines currently visible in the console, replayed ones included.
    pub fn console_lines(&self) -> Vec<String> {
        self.state.lock().console.clone()
    }

    /// Full persisted history, including entries whose write failed.
    pub fn history(&self) -> String {
        self.state.lock().history.clone()
    }

    pub fn has_unsaved_entries(&self) -> bool {
        self.state.lock().unsaved
    }

    fn persist(&self, s: &mut JournalState) -> Option<RecorderError> {
        match self.store.save(LOGS_KEY, &s.history) {
            Ok(()) => {
                s.unsaved = false;
                None
            }
            Err(e) => {
                log::warn!("Console entry kept in memory only: {}", e);
                s.unsaved = true;
                Some(match e {
                    RecorderError::PersistenceWriteFailed(_) => e,
                    other => RecorderError::PersistenceWriteFailed(other.to_string()),
                })
            }
        }
    }
}
