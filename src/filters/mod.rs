//! Compiled-in filter plugins.
//!
//! These ship with the scanner itself and are registered ahead of any
//! shared object discovered in the plugin directory. They go through the
//! same [`crate::plugin::FilterPlugin`] contract as native plugins.

mod byterun;
mod ipv4;

pub use byterun::ByteRunFilter;
pub use ipv4::Ipv4Filter;

use crate::plugin::FilterPlugin;

/// Every compiled-in filter, in registration order.
pub fn builtins() -> Vec<Box<dyn FilterPlugin>> {
    vec![Box::new(Ipv4Filter), Box::new(ByteRunFilter)]
}
