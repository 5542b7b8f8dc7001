//! Observability setup for personachat: tracing subscriber initialisation
//! and GenAI span attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
