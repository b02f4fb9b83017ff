//! CLI commands

pub mod backup;
pub mod export;
pub mod serve;
pub mod settings;
pub mod utils;
