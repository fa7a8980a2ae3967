pub mod cache;
pub mod cli;
pub mod config;
pub mod i18n;
pub mod llm;
pub mod newsroom;
pub mod server;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use newsroom::launch;
