pub mod config;
pub mod daemon;
pub mod delivery;
pub mod email;
pub mod error;
pub mod extractor;
pub mod interfaces;
pub mod logging;
pub mod notify;
pub mod providers;
pub mod reminders;
pub mod sanitize;
pub mod scheduler;
pub mod service;

pub use error::NudgeError;

pub type Result<T> = std::result::Result<T, NudgeError>;
