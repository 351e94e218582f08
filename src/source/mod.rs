//! Where messages and attachment bodies come from.

pub mod attachments;
pub mod dump;
