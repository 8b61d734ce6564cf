// Utility functions module

pub mod config;
pub mod prompt_template;
