//! Decoding of mail-service resources: part bodies and message payload trees.

pub mod payload;
pub mod transfer;
