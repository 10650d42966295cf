//! # Sifter - Pluggable File-Filtering Scanner
//!
//! Sifter walks a directory tree and reports the files that match a set of
//! dynamically loaded filter plugins. Each plugin declares its own
//! command-line options; sifter merges them into one flag table, routes
//! parsed values back to the owning plugin, and combines the per-file
//! verdicts under a configurable AND / OR / NOT policy.
//!
//! ## Quick Start
//!
//! ```bash
//! # Report files under docs/ containing 10.0.0.1 in binary form
//! sifter --ipv4-addr-bin 10.0.0.1 docs/
//!
//! # Same search, inverted, with plugins loaded from a custom directory
//! sifter -N -P ~/.sifter/plugins --ipv4-addr-bin 10.0.0.1 docs/
//! ```

pub mod cli;
pub mod filters;
pub mod plugin;
pub mod scan;

pub use plugin::{FilterPlugin, PluginInfo, PluginList, PluginOption, Verdict};
pub use scan::{CombineMode, ScanPolicy};

/// Result type alias for Sifter operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
