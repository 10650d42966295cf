//! The contract between the scanner and its filter plugins.

use std::path::Path;

/// Whether a plugin option consumes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSpec {
    /// Bare flag, no argument.
    None,
    /// The option requires an argument.
    Required,
}

/// A command-line option declared by a plugin.
///
/// Option names must be unique across every loaded plugin; collisions are
/// rejected when the merged option table is built, not at invocation time.
#[derive(Debug, Clone)]
pub struct PluginOption {
    /// Long option name, without the leading `--`.
    pub name: String,
    pub arg: ArgSpec,
    /// Human-readable description shown in `-h` output.
    pub description: String,
}

/// Metadata a plugin reports about itself.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub purpose: String,
    pub author: String,
    pub options: Vec<PluginOption>,
}

/// An option the user supplied on the command line, as handed to the
/// owning plugin during evaluation. `value` is `None` for bare flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundOption {
    pub name: String,
    pub value: Option<String>,
}

/// One file-level outcome from one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The file satisfies the plugin's filter.
    Match,
    /// The file does not satisfy the filter.
    NoMatch,
    /// The plugin judged its own arguments or environment invalid.
    /// This aborts the entire scan.
    Error(String),
}

/// A filter implementation the scanner can drive.
///
/// Implementations are either compiled into the binary or loaded from
/// shared objects found in the plugin directory (see [`crate::plugin::native`]).
pub trait FilterPlugin {
    /// Declared metadata: purpose, author, and supported options.
    fn info(&self) -> PluginInfo;

    /// Evaluate one file against the options the user bound to this
    /// plugin. The plugin is responsible for validating its own argument
    /// strings and returning [`Verdict::Error`] on invalid input.
    fn process_file(&self, path: &Path, options: &[BoundOption]) -> Verdict;
}
