//! The merged option table: every plugin's declared options flattened
//! into one namespace for command-line parsing.

use std::collections::HashMap;

use anyhow::{Result, bail};

use super::registry::PluginList;
use super::types::ArgSpec;

/// One entry in the merged table. `plugin` and `slot` are the
/// back-reference used to route a parsed value to the declaring plugin.
#[derive(Debug, Clone)]
pub struct MergedOption {
    pub name: String,
    pub arg: ArgSpec,
    pub description: String,
    pub plugin: usize,
    pub slot: usize,
}

/// Flattened, deduplicated table of every plugin option, in plugin
/// discovery order. Purely additive: the table is read by the CLI parser
/// and never parses arguments itself.
#[derive(Debug, Default)]
pub struct OptionTable {
    entries: Vec<MergedOption>,
}

impl OptionTable {
    /// Flatten all declared options. No two plugins may declare the same
    /// name; a collision fails the merge, naming both declaring plugins.
    pub fn merge(list: &PluginList) -> Result<OptionTable> {
        let mut entries = Vec::with_capacity(list.total_options());
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for (plugin_idx, plugin) in list.iter().enumerate() {
            for (slot_idx, slot) in plugin.options().iter().enumerate() {
                if let Some(previous) = owners.insert(&slot.decl.name, plugin.purpose()) {
                    bail!(
                        "option --{} is declared by both \"{}\" and \"{}\"",
                        slot.decl.name,
                        previous,
                        plugin.purpose()
                    );
                }
                entries.push(MergedOption {
                    name: slot.decl.name.clone(),
                    arg: slot.decl.arg,
                    description: slot.decl.description.clone(),
                    plugin: plugin_idx,
                    slot: slot_idx,
                });
            }
        }

        Ok(OptionTable { entries })
    }

    pub fn entries(&self) -> &[MergedOption] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route a parsed option back to the plugin that declared it and
    /// record the raw argument. A name absent from the table is an
    /// invariant violation, not a user error.
    pub fn route(&self, list: &mut PluginList, name: &str, value: Option<String>) -> Result<()> {
        let entry = match self.entries.iter().find(|entry| entry.name == name) {
            Some(entry) => entry,
            None => bail!("option --{name} is not in the merged table"),
        };
        list.bind(entry.plugin, entry.slot, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::testing::{StubFilter, list_of};
    use crate::plugin::types::Verdict;

    fn two_plugin_list() -> PluginList {
        let first = StubFilter::returning("first", Verdict::Match)
            .with_option("alpha", ArgSpec::Required)
            .with_option("beta", ArgSpec::None);
        let second = StubFilter::returning("second", Verdict::Match).with_option("gamma", ArgSpec::Required);
        list_of(vec![first, second])
    }

    #[test]
    fn merge_preserves_discovery_order() {
        let list = two_plugin_list();
        let table = OptionTable::merge(&list).unwrap();

        let names: Vec<&str> = table.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
        assert_eq!(table.entries()[2].plugin, 1);
        assert_eq!(table.entries()[2].slot, 0);
    }

    #[test]
    fn merge_rejects_cross_plugin_collisions() {
        let first = StubFilter::returning("first", Verdict::Match).with_option("alpha", ArgSpec::Required);
        let second = StubFilter::returning("second", Verdict::Match).with_option("alpha", ArgSpec::None);
        let list = list_of(vec![first, second]);

        let err = OptionTable::merge(&list).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--alpha"));
        assert!(message.contains("first"));
        assert!(message.contains("second"));
    }

    #[test]
    fn route_binds_through_back_references() {
        let mut list = two_plugin_list();
        let table = OptionTable::merge(&list).unwrap();

        table.route(&mut list, "gamma", Some("42".to_string())).unwrap();

        assert!(!list.get(0).unwrap().is_active());
        assert!(list.get(1).unwrap().is_active());
        let bound = list.get(1).unwrap().bound_options();
        assert_eq!(bound[0].name, "gamma");
        assert_eq!(bound[0].value.as_deref(), Some("42"));
    }

    #[test]
    fn route_rejects_duplicate_binding() {
        let mut list = two_plugin_list();
        let table = OptionTable::merge(&list).unwrap();

        table.route(&mut list, "alpha", Some("x".to_string())).unwrap();
        let err = table.route(&mut list, "alpha", Some("y".to_string())).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn route_rejects_unknown_names() {
        let mut list = two_plugin_list();
        let table = OptionTable::merge(&list).unwrap();

        assert!(table.route(&mut list, "delta", None).is_err());
    }

    #[test]
    fn declared_option_survives_merge_and_route_unchanged() {
        let stub = StubFilter::returning("round-trip", Verdict::Match).with_option("needle", ArgSpec::Required);
        let mut list = list_of(vec![stub]);
        let table = OptionTable::merge(&list).unwrap();

        let entry = &table.entries()[0];
        assert_eq!(entry.name, "needle");
        assert_eq!(entry.arg, ArgSpec::Required);

        table
            .route(&mut list, "needle", Some("10.1.2.3".to_string()))
            .unwrap();
        let bound = list.get(0).unwrap().bound_options();
        assert_eq!(bound[0].name, "needle");
        assert_eq!(bound[0].value.as_deref(), Some("10.1.2.3"));
    }
}
