//! Link post-processing: file-link classification, reachability, normalization.

pub mod classify;
pub mod normalize;
pub mod reachability;
