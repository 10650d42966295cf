//! Native plugin loading via dynamic libraries.
//!
//! A native filter plugin is a shared object exporting a single
//! constructor symbol, [`ENTRY_SYMBOL`], that hands the host a boxed
//! [`FilterPlugin`] trait object. The object supplies both required entry
//! points (`info` and `process_file`); the host keeps the library handle
//! mapped until the plugin is dropped.

use std::path::Path;

use anyhow::{Context, Result, bail};
use libloading::{Library, Symbol};

use super::types::FilterPlugin;

/// Constructor symbol every native filter plugin must export.
pub const ENTRY_SYMBOL: &[u8] = b"sifter_filter_entry\0";

/// Signature of the exported constructor.
pub type EntryFn = unsafe extern "C" fn() -> *mut dyn FilterPlugin;

/// Load a filter plugin from a shared object.
///
/// Returns the plugin together with the library handle that must outlive
/// it.
///
/// # Safety
///
/// The module must export [`ENTRY_SYMBOL`] with the [`EntryFn`] signature
/// and be built against the same `sifter` plugin contract (same compiler,
/// same crate version). Loading arbitrary libraries runs their
/// initializers.
pub unsafe fn load(path: &Path) -> Result<(Box<dyn FilterPlugin>, Library)> {
    let library = unsafe { Library::new(path) }
        .with_context(|| format!("failed to load {}", path.display()))?;

    let raw = {
        let entry: Symbol<EntryFn> = unsafe { library.get(ENTRY_SYMBOL) }
            .with_context(|| format!("no filter entry point in {}", path.display()))?;
        unsafe { entry() }
    };
    if raw.is_null() {
        bail!("filter entry point returned null in {}", path.display());
    }

    let filter = unsafe { Box::from_raw(raw) };
    Ok((filter, library))
}

/// Shared-library suffix for the current platform.
pub fn library_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// Defines the exported entry point for a native filter plugin crate.
///
/// ```ignore
/// use sifter::export_filter;
///
/// #[derive(Default)]
/// struct MyFilter;
///
/// impl sifter::FilterPlugin for MyFilter {
///     // ...
/// }
///
/// export_filter!(MyFilter);
/// ```
#[macro_export]
macro_rules! export_filter {
    ($filter:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn sifter_filter_entry() -> *mut dyn $crate::plugin::FilterPlugin {
            let filter: Box<dyn $crate::plugin::FilterPlugin> = Box::new(<$filter>::default());
            Box::into_raw(filter)
        }
    };
}
