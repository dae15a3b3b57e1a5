pub mod log_journal;
pub mod templates;
