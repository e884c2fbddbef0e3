//! On-disk state shared with the assistant: settings, the active-account
//! document and tool-server registrations.

pub mod account_store;
pub mod config;
pub mod tool_settings;

pub use account_store::AccountStore;
pub use tool_settings::ToolServerEntry;
