//! Hand-maintained reference tables and the reconciler that layers them onto
//! machine-derived records.

use crate::error::{Error, Result, ValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One override: the primary key plus the fields to replace.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideEntry {
    pub key: String,
    pub fields: Map<String, Value>,
}

impl<'de> Deserialize<'de> for OverrideEntry {
    /// Entries are written as flat objects keyed by `api_name`, e.g.
    /// `{"api_name": "TFT9_Ryze", "cost": 5}`.
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Proxy {
            api_name: String,
            #[serde(flatten)]
            fields: Map<String, Value>,
        }

        let proxy = Proxy::deserialize(deserializer)?;
        Ok(OverrideEntry {
            key: proxy.api_name,
            fields: proxy.fields,
        })
    }
}

/// Ordered override entries; later entries for the same key win.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct OverrideTable(pub Vec<OverrideEntry>);

/// The three stages of one legend tier, each naming an augment api name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegendStages {
    pub stage1: Option<String>,
    pub stage2: Option<String>,
    pub stage3: Option<String>,
}

/// Augments offered by one legend, by tier.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegendTiers {
    #[serde(rename = "1")]
    pub tier1: Option<LegendStages>,
    #[serde(rename = "2")]
    pub tier2: Option<LegendStages>,
    #[serde(rename = "3")]
    pub tier3: Option<LegendStages>,
}

/// Legend membership of one augment.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendAssignment {
    /// Sorted, without duplicates.
    pub legend_ids: Vec<String>,
    /// Tier and stage of the first legend entry naming the augment.
    pub tier: String,
    pub stage: String,
}

/// All hand-maintained tables. Per-set tables are keyed by set mutator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReferenceTables {
    /// Field overrides for champions with known-bad upstream data.
    pub champion_overrides: OverrideTable,
    /// Variant api name → generic api name (e.g. per-region unit variants).
    pub generic_units: BTreeMap<String, BTreeMap<String, String>>,
    /// `(client icon, upstream api name)` pairs for joining with client data.
    pub lcu_icons: BTreeMap<String, Vec<(String, String)>>,
    /// Legend id → tiered augment tree.
    pub legend_augments: BTreeMap<String, BTreeMap<String, LegendTiers>>,
    /// Augment icon path → rarity, for icons the name pattern cannot read.
    pub icon_rarities: BTreeMap<String, u8>,
}

impl ReferenceTables {
    /// Folds `other` into `self`. Overrides accumulate, map entries from
    /// `other` replace existing ones.
    pub fn merge(&mut self, other: ReferenceTables) {
        self.champion_overrides.0.extend(other.champion_overrides.0);
        for (set, units) in other.generic_units {
            self.generic_units.entry(set).or_default().extend(units);
        }
        self.lcu_icons.extend(other.lcu_icons);
        for (set, legends) in other.legend_augments {
            self.legend_augments.entry(set).or_default().extend(legends);
        }
        self.icon_rarities.extend(other.icon_rarities);
    }

    pub fn generic_api_name<'a>(&'a self, set_mutator: &str, api_name: &'a str) -> &'a str {
        self.generic_units
            .get(set_mutator)
            .and_then(|units| units.get(api_name))
            .map(String::as_str)
            .unwrap_or(api_name)
    }

    /// Upstream api name → client icon for one set.
    pub fn lcu_icons_for(&self, set_mutator: &str) -> BTreeMap<&str, &str> {
        self.lcu_icons
            .get(set_mutator)
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(lcu_icon, api_name)| (api_name.as_str(), lcu_icon.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flattens the legend tables of one set into one assignment per augment.
    pub fn legend_assignments(&self, set_mutator: &str) -> BTreeMap<String, LegendAssignment> {
        let mut assignments: BTreeMap<String, LegendAssignment> = BTreeMap::new();
        let Some(legends) = self.legend_augments.get(set_mutator) else {
            return assignments;
        };

        for (legend_id, tiers) in legends {
            let tiers = [("1", &tiers.tier1), ("2", &tiers.tier2), ("3", &tiers.tier3)];
            for (tier, stages) in tiers {
                let Some(stages) = stages else { continue };
                let stages = [
                    ("stage1", &stages.stage1),
                    ("stage2", &stages.stage2),
                    ("stage3", &stages.stage3),
                ];
                for (stage, api_name) in stages {
                    let Some(api_name) = api_name else { continue };
                    let assignment =
                        assignments
                            .entry(api_name.clone())
                            .or_insert_with(|| LegendAssignment {
                                legend_ids: Vec::new(),
                                tier: tier.to_string(),
                                stage: stage.to_string(),
                            });
                    if !assignment.legend_ids.contains(legend_id) {
                        assignment.legend_ids.push(legend_id.clone());
                    }
                }
            }
        }

        for assignment in assignments.values_mut() {
            assignment.legend_ids.sort();
        }
        assignments
    }
}

/// Loads reference tables from one JSON file, or from every `*.json` file
/// under a directory (merged in path order).
pub fn load_reference_tables(path: &Path) -> Result<ReferenceTables> {
    if path.is_file() {
        return read_tables_file(path);
    }

    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| Error::Io(err.into()))?
        .into_iter()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut tables = ReferenceTables::default();
    for file in files {
        tables.merge(read_tables_file(&file)?);
    }
    Ok(tables)
}

fn read_tables_file(path: &Path) -> Result<ReferenceTables> {
    debug!("Reading reference tables from {}", path.display());
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Records that can be targeted by an override table.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Applies `table` to `records`, matching on [`Keyed::key`].
///
/// Each non-null field of a matching entry replaces the record's field; every
/// other field is left alone. Entries without a matching record are skipped
/// with a warning, or rejected in `strict` mode. Returns the number of entries
/// applied.
pub fn apply_overrides<T>(
    records: &mut [T],
    table: &OverrideTable,
    table_name: &str,
    strict: bool,
) -> Result<usize>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    let mut applied = 0;
    for entry in &table.0 {
        let Some(record) = records.iter_mut().find(|r| r.key() == entry.key) else {
            if strict {
                return Err(Error::OverrideMismatch {
                    table: table_name.to_string(),
                    key: entry.key.clone(),
                });
            }
            warn!("Override for {} in {} matches no record", entry.key, table_name);
            continue;
        };

        let mut value = serde_json::to_value(&*record)?;
        if let Value::Object(fields) = &mut value {
            for (field, replacement) in &entry.fields {
                if replacement.is_null() {
                    continue;
                }
                let Some(slot) = fields.get_mut(field) else {
                    return Err(ValidationError::UnknownOverrideField {
                        key: entry.key.clone(),
                        field: field.clone(),
                    }
                    .into());
                };
                *slot = replacement.clone();
            }
        }
        *record = serde_json::from_value(value)?;
        applied += 1;
    }
    Ok(applied)
}
