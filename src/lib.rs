//! dashboard-api library
//!
//! Backend for the interactive analytics dashboard: sample datasets, the
//! export pipeline (Excel, CSV, JSON, PDF), SQLite-backed settings and backup
//! records, and the HTTP API with its security middleware.

pub mod backup;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod security;
pub mod server;
pub mod settings;
pub mod store;
