//! Filter matching files that contain an IPv4 address in binary form.

use std::fs::File;
use std::net::Ipv4Addr;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::plugin::{ArgSpec, BoundOption, FilterPlugin, PluginInfo, PluginOption, Verdict};

const OPT_ADDR: &str = "ipv4-addr-bin";

/// Matches files whose contents contain the four raw bytes of the given
/// IPv4 address, in either byte order, at any offset.
#[derive(Debug, Default)]
pub struct Ipv4Filter;

impl FilterPlugin for Ipv4Filter {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            purpose: "IPv4 binary address search".to_string(),
            author: "Sifter Maintainers".to_string(),
            options: vec![PluginOption {
                name: OPT_ADDR.to_string(),
                arg: ArgSpec::Required,
                description: "Report files containing this IPv4 address in binary form".to_string(),
            }],
        }
    }

    fn process_file(&self, path: &Path, options: &[BoundOption]) -> Verdict {
        let raw = options
            .iter()
            .find(|option| option.name == OPT_ADDR)
            .and_then(|option| option.value.as_deref());
        let Some(raw) = raw else {
            return Verdict::Error(format!("option --{OPT_ADDR} requires an argument"));
        };
        let addr: Ipv4Addr = match raw.parse() {
            Ok(addr) => addr,
            Err(_) => return Verdict::Error(format!("invalid IPv4 address '{raw}'")),
        };

        let needle = addr.octets();
        let mut swapped = needle;
        swapped.reverse();

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
        if map.len() < needle.len() {
            return Verdict::NoMatch;
        }

        if map.windows(4).any(|window| window == needle || window == swapped) {
            Verdict::Match
        } else {
            Verdict::NoMatch
        }
    }
}
