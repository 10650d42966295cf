//! Per-file verdict combination.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::debug;

use crate::plugin::{PluginList, Verdict};

use super::policy::{CombineMode, ScanPolicy};

/// Evaluate one file against every active plugin under `policy` and
/// return whether the file is a hit.
///
/// Plugins run in discovery order. Under require-all the fold stops as
/// soon as one plugin misses; require-any always runs the full list. A
/// [`Verdict::Error`] from any plugin aborts the entire scan.
///
/// With no active plugins every file is a hit (before inversion).
pub fn evaluate(path: &Path, plugins: &PluginList, policy: &ScanPolicy) -> Result<bool> {
    let mut combined = policy.seed();

    if plugins.is_empty() {
        combined = true;
    }

    for plugin in plugins.iter() {
        let matched = match plugin.process_file(path) {
            Verdict::Match => true,
            Verdict::NoMatch => false,
            Verdict::Error(message) => {
                bail!(
                    "plugin \"{}\" failed on {}: {}",
                    plugin.purpose(),
                    path.display(),
                    message
                );
            }
        };
        debug!(
            "{}: \"{}\" -> {}",
            path.display(),
            plugin.purpose(),
            if matched { "match" } else { "no match" }
        );

        combined = match policy.mode {
            CombineMode::All => combined && matched,
            CombineMode::Any => combined || matched,
        };

        if policy.mode == CombineMode::All && !combined {
            break;
        }
    }

    Ok(combined != policy.invert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginList;
    use crate::plugin::testing::{StubFilter, list_of};
    use std::sync::atomic::Ordering;

    fn policy(mode: CombineMode, invert: bool) -> ScanPolicy {
        ScanPolicy { mode, invert }
    }

    #[test]
    fn empty_plugin_set_hits_every_file_under_both_modes() {
        let plugins = PluginList::default();
        let file = Path::new("anything");

        assert!(evaluate(file, &plugins, &policy(CombineMode::All, false)).unwrap());
        assert!(evaluate(file, &plugins, &policy(CombineMode::Any, false)).unwrap());
    }

    #[test]
    fn require_all_needs_every_plugin_to_match() {
        let file = Path::new("f1");

        let all_match = list_of(vec![
            StubFilter::returning("a", Verdict::Match),
            StubFilter::returning("b", Verdict::Match),
        ]);
        assert!(evaluate(file, &all_match, &policy(CombineMode::All, false)).unwrap());

        let one_misses = list_of(vec![
            StubFilter::returning("a", Verdict::Match),
            StubFilter::returning("b", Verdict::NoMatch),
        ]);
        assert!(!evaluate(file, &one_misses, &policy(CombineMode::All, false)).unwrap());
    }

    #[test]
    fn require_any_needs_at_least_one_match() {
        let file = Path::new("f1");

        let one_matches = list_of(vec![
            StubFilter::returning("a", Verdict::NoMatch),
            StubFilter::returning("b", Verdict::Match),
        ]);
        assert!(evaluate(file, &one_matches, &policy(CombineMode::Any, false)).unwrap());

        let none_match = list_of(vec![
            StubFilter::returning("a", Verdict::NoMatch),
            StubFilter::returning("b", Verdict::NoMatch),
        ]);
        assert!(!evaluate(file, &none_match, &policy(CombineMode::Any, false)).unwrap());
    }

    #[test]
    fn invert_complements_every_result() {
        let file = Path::new("f1");
        for mode in [CombineMode::All, CombineMode::Any] {
            for verdict in [Verdict::Match, Verdict::NoMatch] {
                let plain = list_of(vec![StubFilter::returning("a", verdict.clone())]);
                let straight = evaluate(file, &plain, &policy(mode, false)).unwrap();
                let inverted = evaluate(file, &plain, &policy(mode, true)).unwrap();
                assert_eq!(straight, !inverted);
            }
        }
    }

    #[test]
    fn plugin_error_aborts_evaluation() {
        let file = Path::new("f1");
        let erroring = StubFilter::returning("boom", Verdict::Error("bad argument".to_string()));
        let after = StubFilter::returning("after", Verdict::Match);
        let after_calls = after.call_count();
        let plugins = list_of(vec![erroring, after]);

        let err = evaluate(file, &plugins, &policy(CombineMode::All, false)).unwrap_err();
        assert!(err.to_string().contains("bad argument"));
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn require_all_stops_after_first_miss() {
        let file = Path::new("f1");
        let misses = StubFilter::returning("misses", Verdict::NoMatch);
        let unreached = StubFilter::returning("unreached", Verdict::Match);
        let unreached_calls = unreached.call_count();
        let plugins = list_of(vec![misses, unreached]);

        assert!(!evaluate(file, &plugins, &policy(CombineMode::All, false)).unwrap());
        assert_eq!(unreached_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn require_any_runs_the_full_list() {
        let file = Path::new("f1");
        let matches = StubFilter::returning("matches", Verdict::Match);
        let still_runs = StubFilter::returning("still-runs", Verdict::NoMatch);
        let still_runs_calls = still_runs.call_count();
        let plugins = list_of(vec![matches, still_runs]);

        assert!(evaluate(file, &plugins, &policy(CombineMode::Any, false)).unwrap());
        assert_eq!(still_runs_calls.load(Ordering::SeqCst), 1);
    }
}
