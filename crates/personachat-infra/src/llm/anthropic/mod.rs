//! Anthropic Claude provider for the Messages API.
//!
//! Only non-streaming completions are used; a persona reply is returned to
//! the caller in one piece.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
