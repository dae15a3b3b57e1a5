use std::collections::HashMap;

use crate::models::log_entry::MessageKey;
use crate::traits::message_resolver::MessageResolver;

/// Message templates with `{0}`, `{1}`, … positional placeholders.
///
/// `english()` ships the default console wording; hosts swap in their own
/// localized set or drop single keys to silence them.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<MessageKey, String>,
}

impl TemplateCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn english() -> Self {
        let mut catalog = Self::empty();
        for key in MessageKey::ALL {
            let template = match key {
                MessageKey::Recording => "Recording: {0}",
                MessageKey::Recorded => "Recorded: {0}",
                MessageKey::Deleting => "Deleting: {0}",
                MessageKey::TrackExists => "Track exists: {0}",
                MessageKey::PreviousLogs => "Previous logs",
                MessageKey::SessionStarted => "Recording session started",
                MessageKey::SessionStopped => "Recording session ended after {0}",
                MessageKey::StopScheduled => "Recording will stop after the current track",
                MessageKey::WorkerCrashed => "Recorder stopped unexpectedly",
                MessageKey::DirectoryNotFound => "Output folder not found: {0}",
                MessageKey::DeviceUnavailable => "Audio device not available",
            };
            catalog.templates.insert(key, template.to_string());
        }
        catalog
    }

    pub fn with_template(mut self, key: MessageKey, template: impl Into<String>) -> Self {
        self.templates.insert(key, template.into());
        self
    }

    pub fn without(mut self, key: MessageKey) -> Self {
        self.templates.remove(&key);
        self
    }
}

impl MessageResolver for TemplateCatalog {
    fn resolve(&self, key: MessageKey, args: &[&str]) -> Option<String> {
        let template = self.templates.get(&key)?;
        let text = format_template(template, args);
        (!text.is_empty()).then_some(text)
    }
}

/// Substitute `{n}` placeholders in one pass. Placeholders without a
/// matching argument are kept verbatim.
pub fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|idx| (close, idx)));

        match placeholder {
            Some((close, idx)) if idx < args.len() => {
                out.push_str(args[idx]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
