//! Conversation log implementations for CareGuide.

pub mod file_log;
pub mod in_memory;
pub mod window;

pub use file_log::JsonFileLog;
pub use in_memory::InMemoryLog;
pub use window::{HistoryWindow, NO_HISTORY};
