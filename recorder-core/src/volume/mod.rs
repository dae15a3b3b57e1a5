pub mod volume_sync;
