//! Assembled reference rows. Every row carries the `(patch, set_mutator)` pair
//! it was built for.

use crate::model::Effect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Trait api name → number of trait units granted.
pub type TraitCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub set_name: String,
    /// Season number, with `.5` appended for mid-set (`_Stage2`) revisions.
    pub set_number: String,
    pub set_mutator: String,
    pub season_number: String,
    /// False when the set was picked through an explicit mutator override.
    pub is_default: bool,
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitRecord {
    pub api_name: String,
    pub name: String,
    pub icon: Option<String>,
    pub effects: Vec<Effect>,
    pub needed_unit_counts: Vec<u32>,
    pub set_mutator: String,
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub api_name: String,
    pub api_name_generic: String,
    /// 1–6 for shop units, 0 for special units.
    pub cost: u32,
    pub icon: Option<String>,
    pub name: String,
    pub stats: Map<String, Value>,
    pub traits: Vec<String>,
    pub trait_counts: TraitCounts,
    pub lcu_icon: Option<String>,
    pub image_url: Option<String>,
    pub board_size: u32,
    pub is_playable: bool,
    pub set_mutator: String,
    pub patch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    BaseComponent,
    Emblem,
    Ornn,
    Radiant,
    Support,
    Other,
}

impl ItemType {
    /// Base components and special item families can never be crafted,
    /// whatever upstream lists as their composition.
    pub fn is_craftable_kind(self) -> bool {
        !matches!(
            self,
            ItemType::Radiant | ItemType::Support | ItemType::Ornn | ItemType::BaseComponent
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub api_name: String,
    pub id: Value,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub effects: Map<String, Value>,
    pub unique: bool,
    pub composition: Vec<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub is_craftable: bool,
    pub trait_counts: Option<TraitCounts>,
    pub emblem_trait: Option<String>,
    pub set_mutator: String,
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentRecord {
    pub api_name: String,
    pub id: Value,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub effects: Map<String, Value>,
    pub unique: bool,
    pub rarity: u8,
    pub trait_counts: Option<TraitCounts>,
    pub legend_ids: Option<Vec<String>>,
    pub legend_tier: Option<String>,
    pub legend_stage: Option<String>,
    pub set_mutator: String,
    pub patch: String,
}

/// Everything assembled for one `(patch, set_mutator)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub set: SetRecord,
    pub traits: Vec<TraitRecord>,
    pub champions: Vec<ChampionRecord>,
    pub items: Vec<ItemRecord>,
    pub augments: Vec<AugmentRecord>,
}

impl Snapshot {
    pub fn patch(&self) -> &str {
        &self.set.patch
    }

    pub fn set_mutator(&self) -> &str {
        &self.set.set_mutator
    }
}
