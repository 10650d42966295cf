//! Command-line driver.
//!
//! The host owns a handful of short flags; everything else in the flag
//! namespace belongs to the loaded plugins. Because the plugin directory
//! decides which long options exist, `-P` is pre-scanned from raw argv
//! before the real parser is built, then the merged option table is
//! turned into a [`clap::Command`] and parsed for real.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, info};

use crate::plugin::{self, ArgSpec, OptionTable, PluginList};
use crate::scan::{self, ScanPolicy};

/// Conventional plugin directory, tried before falling back to the
/// current directory.
const DEFAULT_PLUGIN_DIR: &str = "./plugins";

/// Option names the host keeps for itself; plugins may not declare them.
const RESERVED_NAMES: [&str; 7] = [
    "help",
    "version",
    "invert",
    "all",
    "any",
    "plugin-dir",
    "path",
];

/// Initialize diagnostic logging on stderr. `SIFTER_LOG` holds a tracing
/// filter directive; absent or invalid means info level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SIFTER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the whole pipeline: load plugins, parse options, scan.
pub fn run() -> Result<()> {
    run_from(env::args_os().collect())
}

fn run_from(args: Vec<OsString>) -> Result<()> {
    let plugin_dir = plugin_dir_from_args(&args)?;
    debug!("plugin directory: {}", plugin_dir.display());

    let mut plugins = plugin::load_plugins(&plugin_dir)?;
    let table = OptionTable::merge(&plugins)?;
    reject_reserved_names(&table)?;

    // Parse errors, -h, and -v all terminate here with the right status
    let matches = build_command(&plugins, &table).get_matches_from(args);

    let policy = ScanPolicy::from_flags(
        host_flag(&matches, "all", "-A")?,
        host_flag(&matches, "any", "-O")?,
        host_flag(&matches, "invert", "-N")?,
    )?;

    route_plugin_options(&matches, &table, &mut plugins)?;

    let root = match matches.get_one::<String>("path") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from("."),
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("invalid search path '{}'", root.display()))?;
    debug!("search path: {}", root.display());

    // Binding is complete; only active plugins take part in the scan
    plugins.retain_active();
    debug!("{} plugins active", plugins.len());

    let stats = scan::walk(&root, &plugins, &policy, &mut |path: &Path| {
        println!("{}", path.display());
    })?;

    info!(
        "scan complete: {} files checked, {} reported",
        stats.files_checked, stats.hits
    );
    Ok(())
}

/// Resolve the plugin directory from raw argv, before real parsing.
///
/// `-P` must be known before the plugin set, and with it the full option
/// table, can exist. Duplicate `-P` and an unresolvable path are fatal;
/// without `-P` the conventional directory is tried, then the current
/// directory.
fn plugin_dir_from_args(args: &[OsString]) -> Result<PathBuf> {
    let mut dir: Option<PathBuf> = None;
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let Some(arg) = arg.to_str() else { continue };
        let value = if arg == "-P" {
            iter.next().and_then(|v| v.to_str()).map(str::to_owned)
        } else if let Some(rest) = arg.strip_prefix("-P") {
            Some(rest.strip_prefix('=').unwrap_or(rest).to_owned())
        } else {
            continue;
        };

        if dir.is_some() {
            bail!("option -P given more than once");
        }
        let Some(value) = value else {
            bail!("option -P requires a directory argument");
        };
        dir = Some(
            PathBuf::from(&value)
                .canonicalize()
                .with_context(|| format!("invalid plugin directory '{value}'"))?,
        );
    }

    if let Some(dir) = dir {
        return Ok(dir);
    }
    for fallback in [DEFAULT_PLUGIN_DIR, "."] {
        if let Ok(dir) = Path::new(fallback).canonicalize() {
            return Ok(dir);
        }
    }
    bail!("cannot resolve a plugin directory");
}

/// Read a host flag, treating repeated use as a configuration error.
fn host_flag(matches: &ArgMatches, id: &str, display: &str) -> Result<bool> {
    match matches.get_count(id) {
        0 => Ok(false),
        1 => Ok(true),
        _ => bail!("option {display} given more than once"),
    }
}

/// A plugin declaring one of the host's own option names would shadow it
/// in the merged namespace; reject at the same stage as collisions.
fn reject_reserved_names(table: &OptionTable) -> Result<()> {
    for entry in table.entries() {
        if RESERVED_NAMES.contains(&entry.name.as_str()) {
            bail!("plugin option --{} collides with a host option", entry.name);
        }
    }
    Ok(())
}

/// Build the parser: host flags plus every merged plugin option, each
/// grouped in help output under the purpose of its declaring plugin.
fn build_command(plugins: &PluginList, table: &OptionTable) -> Command {
    let mut command = Command::new(crate::PKG_NAME)
        .version(crate::VERSION)
        .about("Walks a directory tree and reports the files matching the active filter plugins")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .action(ArgAction::Version)
                .help("Print version"),
        )
        .arg(
            Arg::new("invert")
                .short('N')
                .action(ArgAction::Count)
                .help("Invert the final verdict"),
        )
        .arg(
            Arg::new("all")
                .short('A')
                .action(ArgAction::Count)
                .conflicts_with("any")
                .help("Report files passing every active filter (default)"),
        )
        .arg(
            Arg::new("any")
                .short('O')
                .action(ArgAction::Count)
                .help("Report files passing at least one active filter"),
        )
        .arg(
            Arg::new("plugin-dir")
                .short('P')
                .value_name("DIR")
                .action(ArgAction::Set)
                .help("Directory to load filter plugins from"),
        )
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .help("Root of the tree to scan (defaults to the current directory)"),
        );

    for entry in table.entries() {
        let heading = plugins
            .get(entry.plugin)
            .map(|plugin| format!("Plugin: {}", plugin.purpose()))
            .unwrap_or_else(|| "Plugin options".to_string());
        let arg = Arg::new(entry.name.clone())
            .long(entry.name.clone())
            .help(entry.description.clone())
            .help_heading(heading);
        // Duplicate occurrences are let through here so the router can
        // report them as duplicate bindings
        let arg = match entry.arg {
            ArgSpec::Required => arg.value_name("ARG").action(ArgAction::Append),
            ArgSpec::None => arg.action(ArgAction::Count),
        };
        command = command.arg(arg);
    }

    command
}

/// Hand every parsed plugin option back to its owner, in table order.
fn route_plugin_options(
    matches: &ArgMatches,
    table: &OptionTable,
    plugins: &mut PluginList,
) -> Result<()> {
    for entry in table.entries() {
        match entry.arg {
            ArgSpec::Required => {
                if let Some(values) = matches.get_many::<String>(&entry.name) {
                    for value in values {
                        table.route(plugins, &entry.name, Some(value.clone()))?;
                    }
                }
            }
            ArgSpec::None => {
                for _ in 0..matches.get_count(&entry.name) {
                    table.route(plugins, &entry.name, None)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(parts: &[&str]) -> Vec<OsString> {
        std::iter::once("sifter")
            .chain(parts.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn plugin_dir_defaults_to_a_resolvable_directory() {
        let dir = plugin_dir_from_args(&args(&[])).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn plugin_dir_accepts_separated_and_attached_forms() {
        let tmp = TempDir::new().unwrap();
        let expected = tmp.path().canonicalize().unwrap();
        let path = tmp.path().to_str().unwrap();

        let separated = plugin_dir_from_args(&args(&["-P", path])).unwrap();
        assert_eq!(separated, expected);

        let attached = format!("-P{path}");
        assert_eq!(plugin_dir_from_args(&args(&[attached.as_str()])).unwrap(), expected);

        let equals = format!("-P={path}");
        assert_eq!(plugin_dir_from_args(&args(&[equals.as_str()])).unwrap(), expected);
    }

    #[test]
    fn duplicate_plugin_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().to_str().unwrap();

        let err = plugin_dir_from_args(&args(&["-P", path, "-P", path])).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn missing_plugin_dir_argument_is_fatal() {
        assert!(plugin_dir_from_args(&args(&["-P"])).is_err());
    }

    #[test]
    fn unresolvable_plugin_dir_is_fatal() {
        assert!(plugin_dir_from_args(&args(&["-P", "/no/such/dir"])).is_err());
    }

    #[test]
    fn reserved_names_are_rejected() {
        use crate::plugin::Verdict;
        use crate::plugin::testing::{StubFilter, list_of};

        let stub =
            StubFilter::returning("shadower", Verdict::Match).with_option("path", ArgSpec::None);
        let list = list_of(vec![stub]);
        let table = OptionTable::merge(&list).unwrap();

        let err = reject_reserved_names(&table).unwrap_err();
        assert!(err.to_string().contains("--path"));
    }
}
