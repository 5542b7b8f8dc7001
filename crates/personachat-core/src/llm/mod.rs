//! LLM provider abstraction and model-based dispatch.

pub mod box_provider;
pub mod dispatcher;
pub mod provider;
