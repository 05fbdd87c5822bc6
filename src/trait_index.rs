use crate::records::{TraitCounts, TraitRecord};
use foldhash::HashMap;

/// Lookup tables over the traits of one snapshot, used to resolve trait
/// references found in champions, augments and emblems.
///
/// Matchers that scan for a trait inside a longer string are stored
/// longest-first so that `StarGuardian` is tried before `Guardian`.
#[derive(Debug, Default)]
pub struct TraitIndex {
    /// Display name → api name.
    by_name: HashMap<String, String>,
    /// (api name suffix, display name), longest suffix first.
    emblem_suffixes: Vec<(String, String)>,
    /// Display names, longest first.
    names_longest_first: Vec<String>,
}

impl TraitIndex {
    pub fn build(traits: &[TraitRecord]) -> Self {
        let mut by_name: HashMap<String, String> = HashMap::default();
        let mut emblem_suffixes: Vec<(String, String)> = Vec::with_capacity(traits.len());
        let mut suffix_slots: HashMap<String, usize> = HashMap::default();

        for t in traits {
            by_name.insert(t.name.clone(), t.api_name.clone());

            // `Set9_Bastion` → `Bastion`; the suffix is what emblem api names embed.
            let suffix = t.api_name.split('_').nth(1).unwrap_or(&t.api_name);
            match suffix_slots.get(suffix) {
                Some(&slot) => emblem_suffixes[slot].1 = t.name.clone(),
                None => {
                    suffix_slots.insert(suffix.to_string(), emblem_suffixes.len());
                    emblem_suffixes.push((suffix.to_string(), t.name.clone()));
                }
            }
        }

        // Stable sorts: equal lengths keep snapshot order.
        emblem_suffixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let mut names_longest_first: Vec<String> = traits.iter().map(|t| t.name.clone()).collect();
        names_longest_first.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            by_name,
            emblem_suffixes,
            names_longest_first,
        }
    }

    /// Resolves a trait display name to its api name.
    pub fn api_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Trait granted by an emblem item, as `{trait_api_name: 1}`.
    ///
    /// First tries the api name (`TFT9_Item_<suffix>EmblemItem`), then falls
    /// back to the longest trait display name contained in the item name.
    pub fn emblem_trait(&self, api_name: Option<&str>, name: Option<&str>) -> Option<TraitCounts> {
        let (api_name, name) = (api_name?, name?);
        if api_name.is_empty() || name.is_empty() {
            return None;
        }

        let trait_name = self
            .trait_name_from_emblem_api_name(api_name)
            .or_else(|| self.trait_name_in(name))?;
        let trait_api_name = self.api_name(trait_name)?;
        Some(TraitCounts::from([(trait_api_name.to_string(), 1)]))
    }

    fn trait_name_from_emblem_api_name(&self, api_name: &str) -> Option<&str> {
        let body = api_name.strip_suffix("EmblemItem")?;
        self.emblem_suffixes
            .iter()
            .find(|(suffix, _)| {
                body.strip_suffix(suffix.as_str())
                    .and_then(|head| head.strip_suffix('_'))
                    .is_some_and(|head| !head.is_empty())
            })
            .map(|(_, name)| name.as_str())
    }

    fn trait_name_in(&self, text: &str) -> Option<&str> {
        self.names_longest_first
            .iter()
            .find(|name| !name.is_empty() && text.contains(name.as_str()))
            .map(String::as_str)
    }
}
