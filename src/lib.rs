//! `linkscan` — find shared file links buried anywhere in a mailbox.
//!
//! This crate walks each message's content tree (including nested parts and
//! text attachments), extracts every hyperlink, keeps the ones that point at
//! hosted files, and reduces them to a set of query-free URLs.

pub mod config;
pub mod error;
pub mod extract;
pub mod links;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod source;
