//! Recursive directory traversal.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{error, warn};

use crate::plugin::PluginList;

use super::combine;
use super::policy::ScanPolicy;

/// Counters accumulated over one traversal.
#[derive(Debug, Default)]
pub struct WalkStats {
    pub files_checked: usize,
    pub hits: usize,
    pub dirs_skipped: usize,
}

/// Walk `root` depth-first, synchronously, in native directory order,
/// invoking `on_hit` for every file the active plugins and policy
/// designate as a hit, in traversal order, as each file is decided.
///
/// Entries that are neither regular files nor directories are skipped,
/// as are zero-length files. A subdirectory that cannot be opened is
/// logged and yields nothing; its siblings still run. A plugin error
/// unwinds the whole traversal.
pub fn walk(
    root: &Path,
    plugins: &PluginList,
    policy: &ScanPolicy,
    on_hit: &mut dyn FnMut(&Path),
) -> Result<WalkStats> {
    let mut stats = WalkStats::default();
    walk_dir(root, plugins, policy, on_hit, &mut stats)?;
    Ok(stats)
}

fn walk_dir(
    dir: &Path,
    plugins: &PluginList,
    policy: &ScanPolicy,
    on_hit: &mut dyn FnMut(&Path),
    stats: &mut WalkStats,
) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            error!("cannot open directory {}: {}", dir.display(), err);
            stats.dirs_skipped += 1;
            return Ok(());
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        // lstat semantics: symlinks are reported as symlinks, not followed
        let metadata = match path.symlink_metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("cannot stat {}: {}", path.display(), err);
                continue;
            }
        };

        if metadata.is_dir() {
            walk_dir(&path, plugins, policy, on_hit, stats)?;
        } else if metadata.is_file() {
            if metadata.len() == 0 {
                continue;
            }
            stats.files_checked += 1;
            if combine::evaluate(&path, plugins, policy)? {
                stats.hits += 1;
                on_hit(&path);
            }
        }
    }

    Ok(())
}
