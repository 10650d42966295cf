//! Plugin discovery and the loaded-plugin list.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use libloading::Library;
use tracing::{debug, info, warn};

use super::native;
use super::types::{BoundOption, FilterPlugin, PluginOption, Verdict};

/// Argument bound to a plugin option on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// The option was given without an argument.
    Present,
    /// The option was given with its required argument.
    Arg(String),
}

/// One declared option together with its binding state.
#[derive(Debug, Clone)]
pub struct OptionSlot {
    pub decl: PluginOption,
    pub bound: Option<Bound>,
}

/// One successfully loaded filter plugin.
///
/// Field order matters: `filter` is declared before `library` so the
/// trait object drops before the shared object that provides its code.
pub struct LoadedPlugin {
    filter: Box<dyn FilterPlugin>,
    #[allow(dead_code)]
    library: Option<Library>,
    purpose: String,
    author: String,
    origin: String,
    slots: Vec<OptionSlot>,
    active: bool,
}

impl LoadedPlugin {
    /// Wrap a filter, querying its metadata once. `library` keeps the
    /// backing shared object mapped; compiled-in filters pass `None`.
    pub(crate) fn from_filter(
        filter: Box<dyn FilterPlugin>,
        library: Option<Library>,
        origin: impl Into<String>,
    ) -> Self {
        let info = filter.info();
        let slots = info
            .options
            .into_iter()
            .map(|decl| OptionSlot { decl, bound: None })
            .collect();
        Self {
            filter,
            library,
            purpose: info.purpose,
            author: info.author,
            origin: origin.into(),
            slots,
            active: false,
        }
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Where the plugin came from: a shared-object file name, or
    /// `"builtin"` for compiled-in filters.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// True once the user supplied any of this plugin's options.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn options(&self) -> &[OptionSlot] {
        &self.slots
    }

    /// The options the user actually bound, in declaration order.
    pub fn bound_options(&self) -> Vec<BoundOption> {
        self.slots
            .iter()
            .filter_map(|slot| {
                slot.bound.as_ref().map(|bound| BoundOption {
                    name: slot.decl.name.clone(),
                    value: match bound {
                        Bound::Present => None,
                        Bound::Arg(value) => Some(value.clone()),
                    },
                })
            })
            .collect()
    }

    /// Evaluate one file with this plugin's bound options.
    pub fn process_file(&self, path: &Path) -> Verdict {
        self.filter.process_file(path, &self.bound_options())
    }
}

/// Ordered collection of loaded plugins. Discovery order is significant:
/// it fixes both the merged option table and per-file evaluation order.
///
/// The list owns every plugin handle; dropping it releases them exactly
/// once, at the single teardown point in the driver.
#[derive(Default)]
pub struct PluginList {
    plugins: Vec<LoadedPlugin>,
}

impl std::fmt::Debug for PluginList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginList")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl PluginList {
    pub fn push(&mut self, plugin: LoadedPlugin) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LoadedPlugin> {
        self.plugins.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedPlugin> {
        self.plugins.iter()
    }

    /// Total number of options declared across all plugins; sizes the
    /// merged table.
    pub fn total_options(&self) -> usize {
        self.plugins.iter().map(|p| p.slots.len()).sum()
    }

    /// Bind a parsed argument to the option slot at (`plugin`, `slot`)
    /// and mark the plugin active. Binding the same option twice is a
    /// fatal configuration error.
    pub fn bind(&mut self, plugin: usize, slot: usize, value: Option<String>) -> Result<()> {
        let plugin = self
            .plugins
            .get_mut(plugin)
            .context("option routed to a plugin that is not in the list")?;
        let slot = plugin
            .slots
            .get_mut(slot)
            .context("option routed to a slot the plugin never declared")?;
        if slot.bound.is_some() {
            bail!("option --{} given more than once", slot.decl.name);
        }
        slot.bound = Some(match value {
            Some(value) => Bound::Arg(value),
            None => Bound::Present,
        });
        plugin.active = true;
        Ok(())
    }

    /// Drop plugins the user never activated; active plugins keep only
    /// their bound options. Must run after option routing and before
    /// traversal, since it invalidates merged-table back-references.
    pub fn retain_active(&mut self) {
        self.plugins.retain(|plugin| plugin.active);
        for plugin in &mut self.plugins {
            plugin.slots.retain(|slot| slot.bound.is_some());
        }
    }
}

/// Load every filter plugin visible to the scanner: the compiled-in
/// filters first, then any shared object found in `dir`.
///
/// The directory itself must be readable; individual modules that fail to
/// load are skipped with a warning.
pub fn load_plugins(dir: &Path) -> Result<PluginList> {
    let mut list = PluginList::default();

    for filter in crate::filters::builtins() {
        list.push(LoadedPlugin::from_filter(filter, None, "builtin"));
    }

    let suffix = native::library_extension();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read plugin directory {}", dir.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file || path.extension().and_then(|e| e.to_str()) != Some(suffix) {
            continue;
        }
        let origin = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<non-utf8>")
            .to_string();
        match unsafe { native::load(&path) } {
            Ok((filter, library)) => {
                debug!("loaded plugin {}", path.display());
                list.push(LoadedPlugin::from_filter(filter, Some(library), origin));
            }
            Err(err) => warn!("skipping {}: {err:#}", path.display()),
        }
    }

    info!(
        "{} plugins loaded, {} options declared",
        list.len(),
        list.total_options()
    );
    Ok(list)
}
