pub mod complete;
pub mod config;
pub mod genie;
pub mod mode;
pub mod reminders;
pub mod status;
pub mod unlock;
