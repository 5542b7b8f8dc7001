//! Request extractors shared by the handlers.

pub mod json;
pub mod params;
pub mod query;
