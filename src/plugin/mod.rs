//! Plugin runtime: discovery and loading of filter plugins, the merged
//! option table, and routing of parsed option values back to the plugin
//! that declared them.

pub mod native;
pub mod options;
pub mod registry;
pub mod types;

pub use options::{MergedOption, OptionTable};
pub use registry::{LoadedPlugin, PluginList, load_plugins};
pub use types::{ArgSpec, BoundOption, FilterPlugin, PluginInfo, PluginOption, Verdict};
