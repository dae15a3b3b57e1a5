pub mod audio_models;
pub mod config;
pub mod error;
pub mod log_entry;
pub mod state;
