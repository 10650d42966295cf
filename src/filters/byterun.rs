//! Filter matching files by their number of repeated-byte runs.

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use memmap2::Mmap;
use tracing::debug;

use crate::plugin::{ArgSpec, BoundOption, FilterPlugin, PluginInfo, PluginOption, Verdict};

const OPT_COUNT: &str = "seq-num";
const OPT_COMP: &str = "seq-num-comp";

/// Comparison operator for the run count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl FromStr for Comparison {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "ge" => Ok(Self::Ge),
            "le" => Ok(Self::Le),
            _ => Err(()),
        }
    }
}

impl Comparison {
    fn holds(self, left: usize, right: usize) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Gt => left > right,
            Self::Lt => left < right,
            Self::Ge => left >= right,
            Self::Le => left <= right,
        }
    }
}

/// Counts maximal runs of two or more identical consecutive bytes and
/// compares the count against a user-supplied threshold.
#[derive(Debug, Default)]
pub struct ByteRunFilter;

impl FilterPlugin for ByteRunFilter {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            purpose: "repeated-byte run counter".to_string(),
            author: "Sifter Maintainers".to_string(),
            options: vec![
                PluginOption {
                    name: OPT_COUNT.to_string(),
                    arg: ArgSpec::Required,
                    description: "Number of repeated-byte runs to compare against".to_string(),
                },
                PluginOption {
                    name: OPT_COMP.to_string(),
                    arg: ArgSpec::Required,
                    description: "Comparison operator: eq, ne, gt, lt, ge, le (default eq)"
                        .to_string(),
                },
            ],
        }
    }

    fn process_file(&self, path: &Path, options: &[BoundOption]) -> Verdict {
        let count_arg = options
            .iter()
            .find(|option| option.name == OPT_COUNT)
            .and_then(|option| option.value.as_deref());
        let comp_arg = options
            .iter()
            .find(|option| option.name == OPT_COMP)
            .and_then(|option| option.value.as_deref());

        let Some(count_arg) = count_arg else {
            return Verdict::Error(format!("option --{OPT_COMP} does not work without --{OPT_COUNT}"));
        };
        let expected: usize = match count_arg.parse() {
            Ok(expected) => expected,
            Err(_) => return Verdict::Error(format!("invalid argument '{count_arg}' for --{OPT_COUNT}")),
        };
        let comparison = match comp_arg {
            Some(comp_arg) => match comp_arg.parse() {
                Ok(comparison) => comparison,
                Err(()) => {
                    return Verdict::Error(format!("invalid argument '{comp_arg}' for --{OPT_COMP}"));
                }
            },
            None => Comparison::Eq,
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                debug!("cannot open {}: {}", path.display(), err);
                return Verdict::NoMatch;
            }
        };
        let map = match unsafe { Mmap::map(&file) } {
            Ok(map) => map,
            Err(err) => {
                debug!("cannot map {}: {}", path.display(), err);
                return Verdict::NoMatch;
            }
        };

        let runs = count_runs(&map);
        debug!("{}: {} repeated-byte runs", path.display(), runs);

        if comparison.holds(runs, expected) {
            Verdict::Match
        } else {
            Verdict::NoMatch
        }
    }
}

/// Number of maximal runs of two or more identical consecutive bytes.
fn count_runs(data: &[u8]) -> usize {
    let mut runs = 0;
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        let start = i;
        while i < data.len() && data[i] == byte {
            i += 1;
        }
        if i - start >= 2 {
            runs += 1;
        }
    }
    runs
}
