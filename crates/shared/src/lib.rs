//! Shared domain model and API types for the tab-group manager.

pub mod domain;
pub mod error;
pub mod protocol;
