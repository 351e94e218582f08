//! Core data model types for messages, content trees, and link sets.

pub mod message;
pub mod url;
