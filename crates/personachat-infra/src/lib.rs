//! Infrastructure layer for personachat.
//!
//! Implements the ports defined in `personachat-core`: SQLite repositories,
//! LLM provider clients, and the configuration loader.

pub mod config;
pub mod llm;
pub mod sqlite;
