//! The scan engine: verdict-combination policy, per-file evaluation, and
//! directory traversal.

pub mod combine;
pub mod policy;
pub mod walker;

pub use combine::evaluate;
pub use policy::{CombineMode, ScanPolicy};
pub use walker::{WalkStats, walk};
