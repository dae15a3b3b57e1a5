pub mod device_gateway;
pub mod message_resolver;
pub mod recorder_delegate;
pub mod recording_worker;
pub mod settings_store;
