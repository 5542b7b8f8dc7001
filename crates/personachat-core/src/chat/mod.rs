//! Chat domain: repository port, request validation, history assembly and
//! the service that ties a chat turn together.

pub mod history;
pub mod repository;
pub mod service;
pub mod validation;
