//! Text and link extraction: content-tree walking, link scanning, and batch fan-out.

pub mod batch;
pub mod urls;
pub mod walker;
