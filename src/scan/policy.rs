//! Verdict-combination policy.

use anyhow::{Result, bail};

/// How per-plugin matches combine into one per-file result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineMode {
    /// Every active plugin must match (`-A`, the default).
    #[default]
    All,
    /// At least one active plugin must match (`-O`).
    Any,
}

/// Scan-wide policy, constructed once after parsing and passed by
/// reference to the walker and combinator. The enum makes the two
/// combination modes mutually exclusive by construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanPolicy {
    pub mode: CombineMode,
    pub invert: bool,
}

impl ScanPolicy {
    /// Build the policy from the host flags. `-A` and `-O` together is a
    /// configuration error; neither means `-A`.
    pub fn from_flags(all: bool, any: bool, invert: bool) -> Result<Self> {
        if all && any {
            bail!("options -A and -O cannot be used together");
        }
        let mode = if any { CombineMode::Any } else { CombineMode::All };
        Ok(Self { mode, invert })
    }

    /// Seed value for the per-file fold.
    pub(crate) fn seed(&self) -> bool {
        self.mode == CombineMode::All
    }
}
