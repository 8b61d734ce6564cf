// Data models for PlanFlow

pub mod chat;
pub mod config;
pub mod plan;
pub mod prompt;

pub use chat::*;
pub use config::*;
pub use plan::*;
pub use prompt::*;
