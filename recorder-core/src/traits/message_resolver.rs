use crate::models::log_entry::MessageKey;

/// Resolves a console message template and formats it.
///
/// Returning `None` (or an empty string) suppresses the entry.
pub trait MessageResolver: Send + Sync {
    fn resolve(&self, key: MessageKey, args: &[&str]) -> Option<String>;
}
