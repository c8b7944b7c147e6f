//! Region alias resolution.

use std::collections::BTreeMap;

/// Fixed allow-list mapping token region aliases to deployment regions.
#[derive(Debug, Clone)]
pub struct RegionTable {
    aliases: BTreeMap<String, String>,
}

impl RegionTable {
    #[must_use]
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Deployment region for `alias`, if the alias is known.
    #[must_use]
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::AuthorizerConfig;

    #[test]
    fn resolves_configured_aliases_only() {
        let table = RegionTable::new(AuthorizerConfig::default().region_aliases);

        assert_eq!(table.resolve("eu1"), Some("eu-west-2"));
        assert_eq!(table.resolve("EU1"), None);
        assert_eq!(table.resolve("zz9"), None);
    }
}
