//! Upstream document types, as published by CommunityDragon (`cdragon/tft/en_us.json`).
//!
//! Only the fields the assembler reads are modelled. Set entries also keep their
//! traits and champions as upstream JSON so they can be written back out unchanged.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

/// The root structure of the upstream document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Every item known to the client, across all sets. Augments live here too.
    #[serde(default)]
    pub items: Vec<RawItem>,
    /// One entry per set revision (mutator).
    #[serde(rename = "setData", default)]
    pub set_data: Vec<SetEntry>,
}

/// A single set revision, e.g. `TFTSet9` or `TFTSet9_Stage2`.
///
/// Traits and champions are kept twice: typed for assembly, and as the
/// upstream JSON for the per-entity export, which must not normalise them.
#[derive(Debug, Clone)]
pub struct SetEntry {
    pub mutator: String,
    pub name: String,
    pub number: u32,
    pub traits: Vec<RawTrait>,
    pub champions: Vec<RawChampion>,
    pub raw_traits: Vec<Value>,
    pub raw_champions: Vec<Value>,
    /// Everything else upstream attaches (`augments`, `items`...).
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for SetEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Proxy {
            mutator: String,
            #[serde(default)]
            name: String,
            number: u32,
            #[serde(default)]
            traits: Vec<Value>,
            #[serde(default)]
            champions: Vec<Value>,
            #[serde(flatten)]
            extra: Map<String, Value>,
        }

        let proxy = Proxy::deserialize(deserializer)?;
        let traits = proxy
            .traits
            .iter()
            .map(RawTrait::deserialize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(<D::Error as de::Error>::custom)?;
        let champions = proxy
            .champions
            .iter()
            .map(RawChampion::deserialize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(<D::Error as de::Error>::custom)?;

        Ok(SetEntry {
            mutator: proxy.mutator,
            name: proxy.name,
            number: proxy.number,
            traits,
            champions,
            raw_traits: proxy.traits,
            raw_champions: proxy.champions,
            extra: proxy.extra,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTrait {
    #[serde(rename = "apiName")]
    pub api_name: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// One breakpoint of a trait: the unit count that activates it plus whatever
/// else upstream attaches (style, variables, maxUnits...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Effect {
    #[serde(rename = "minUnits")]
    pub min_units: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Effect {
    /// `minUnits` is occasionally null or missing on placeholder traits; both
    /// read as zero so breakpoints keep their position.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Proxy {
            #[serde(rename = "minUnits")]
            min_units: Option<u32>,
            #[serde(flatten)]
            fields: Map<String, Value>,
        }

        let proxy = Proxy::deserialize(deserializer)?;
        Ok(Effect {
            min_units: proxy.min_units.unwrap_or(0),
            fields: proxy.fields,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChampion {
    #[serde(rename = "apiName")]
    pub api_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "tileIcon", default)]
    pub tile_icon: Option<String>,
    #[serde(default)]
    pub stats: Map<String, Value>,
    /// Trait display names (not api names).
    #[serde(default)]
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(rename = "apiName")]
    pub api_name: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub effects: Map<String, Value>,
    #[serde(default)]
    pub composition: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl RawItem {
    /// Category inferred from the second `_`-delimited segment of the api name,
    /// e.g. `TFT9_Augment_Foo` → `Augment`, `TFT_Item_BFSword` → `Item`.
    pub fn category(&self) -> Option<&str> {
        self.api_name.split('_').nth(1)
    }
}
