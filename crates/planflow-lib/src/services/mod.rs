// Services module

pub mod chat;
pub mod context;
pub mod llm;
pub mod mcp_client;
pub mod pne;
