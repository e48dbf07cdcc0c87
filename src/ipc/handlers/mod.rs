pub mod backup_exchange;
pub mod core;
pub mod progress;
pub mod schedule;
pub mod tincan;
