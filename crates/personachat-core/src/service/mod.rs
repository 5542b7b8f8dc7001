//! Application services.

pub mod persona;
