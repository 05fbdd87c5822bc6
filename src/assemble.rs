//! Snapshot assembly: select the set, build every entity kind in dependency
//! order (traits first, everything else resolves against them), layer the
//! reference tables on top, and validate. Nothing is returned unless every
//! step succeeds.

use crate::config::RunOptions;
use crate::data::{image_url, select_set};
use crate::error::{Result, ValidationError};
use crate::extract::{IconRarities, augment_rarity, trait_bonus_count};
use crate::model::{Document, RawItem, SetEntry};
use crate::overrides::{Keyed, ReferenceTables, apply_overrides};
use crate::records::{
    AugmentRecord, ChampionRecord, ItemRecord, ItemType, SetRecord, Snapshot, TraitCounts,
    TraitRecord,
};
use crate::trait_index::TraitIndex;
use foldhash::{HashMap, HashSet};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Item categories kept in the item table. `HeimerUpgrade` is a set-specific
/// category that behaves like regular items.
const ITEM_CATEGORIES: &[&str] = &["Item", "Consumable", "Assist", "HeimerUpgrade"];

const AUGMENT_CATEGORY: &str = "Augment";

/// Highest cost of a shop unit. Anything above is a special unit and gets cost 0.
const MAX_SHOP_COST: u32 = 6;

const ORNN_ICON_PREFIX: &str = "ASSETS/Maps/Particles/TFT/Item_Icons/Ornn_Items/";
const RADIANT_ICON_PREFIX: &str = "ASSETS/Maps/Particles/TFT/Item_Icons/Radiant/";
const SUPPORT_ICON_PREFIX: &str = "ASSETS/Maps/Particles/TFT/Item_Icons/TFT9_SupportItems/";

/// The `(patch, set_mutator)` pair stamped on every row of a run.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    pub patch: &'a str,
    pub set_mutator: &'a str,
}

impl Keyed for ChampionRecord {
    fn key(&self) -> &str {
        &self.api_name
    }
}

/// Assembles the full snapshot for the set selected by `options`.
pub fn assemble(
    document: &Document,
    options: &RunOptions,
    tables: &ReferenceTables,
) -> Result<Snapshot> {
    let entry = select_set(document, options.mutator_override.as_deref())?;
    let patch = options.patch_label()?;
    let ctx = AssemblyContext {
        patch: &patch,
        set_mutator: &entry.mutator,
    };
    info!("Assembling {} for patch {}", ctx.set_mutator, ctx.patch);

    let set = build_set_record(entry, options.mutator_override.is_none(), ctx);

    let traits = build_traits(entry, ctx)?;
    let trait_index = TraitIndex::build(&traits);
    info!("Built {} traits", traits.len());

    let mut champions = build_champions(entry, &trait_index, tables, ctx)?;
    let applied = apply_overrides(
        &mut champions,
        &tables.champion_overrides,
        "champion_overrides",
        options.strict_overrides,
    )?;
    info!("Built {} champions ({} overridden)", champions.len(), applied);

    let items = build_items(&document.items, &trait_index, ctx)?;
    info!("Built {} items", items.len());

    let augments = build_augments(&document.items, &trait_index, tables, ctx)?;
    info!("Built {} augments", augments.len());

    Ok(Snapshot {
        set,
        traits,
        champions,
        items,
        augments,
    })
}

pub fn build_set_record(entry: &SetEntry, is_default: bool, ctx: AssemblyContext) -> SetRecord {
    let season_number = entry.number.to_string();
    // Mid-set revisions are tracked as "<season>.5".
    let set_number = if entry.mutator.ends_with("_Stage2") {
        format!("{}.5", season_number)
    } else {
        season_number.clone()
    };

    SetRecord {
        set_name: entry.name.clone(),
        set_number,
        set_mutator: entry.mutator.clone(),
        season_number,
        is_default,
        patch: ctx.patch.to_string(),
    }
}

pub fn build_traits(entry: &SetEntry, ctx: AssemblyContext) -> Result<Vec<TraitRecord>> {
    let mut seen: HashSet<&str> = HashSet::default();
    let mut duplicates = Vec::new();
    for t in &entry.traits {
        if !seen.insert(&t.api_name) {
            duplicates.push(t.api_name.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(ValidationError::DuplicateTraits(duplicates).into());
    }

    Ok(entry
        .traits
        .iter()
        .map(|t| TraitRecord {
            api_name: t.api_name.clone(),
            name: t.name.clone(),
            icon: t.icon.clone(),
            needed_unit_counts: t.effects.iter().map(|e| e.min_units).collect(),
            effects: t.effects.clone(),
            set_mutator: ctx.set_mutator.to_string(),
            patch: ctx.patch.to_string(),
        })
        .collect())
}

pub fn build_champions(
    entry: &SetEntry,
    traits: &TraitIndex,
    tables: &ReferenceTables,
    ctx: AssemblyContext,
) -> Result<Vec<ChampionRecord>> {
    let lcu_icons = tables.lcu_icons_for(ctx.set_mutator);
    if lcu_icons.is_empty() {
        warn!("No client icon mapping for set {}", ctx.set_mutator);
    }

    let mut champions = Vec::with_capacity(entry.champions.len());
    let mut unknown_traits = Vec::new();

    for c in &entry.champions {
        let mut trait_counts = TraitCounts::new();
        for name in &c.traits {
            match traits.api_name(name) {
                Some(api_name) => {
                    trait_counts.insert(api_name.to_string(), 1);
                }
                None => unknown_traits.push((c.api_name.clone(), name.clone())),
            }
        }

        let cost = if c.cost > MAX_SHOP_COST {
            warn!("{} has cost {}, treating it as a special unit", c.api_name, c.cost);
            0
        } else {
            c.cost
        };

        let lcu_icon = lcu_icons.get(c.api_name.as_str()).map(|icon| icon.to_string());
        if lcu_icon.is_none() && !lcu_icons.is_empty() {
            warn!("Missing client icon mapping for {}", c.name);
        }

        champions.push(ChampionRecord {
            api_name: c.api_name.clone(),
            api_name_generic: tables.generic_api_name(ctx.set_mutator, &c.api_name).to_string(),
            cost,
            icon: c.icon.clone(),
            name: c.name.clone(),
            stats: c.stats.clone(),
            traits: c.traits.clone(),
            trait_counts,
            lcu_icon,
            image_url: c.tile_icon.as_deref().map(|icon| image_url(ctx.patch, icon)),
            board_size: 1,
            // Upstream lists more units than the shop offers; traitless ones
            // (summons, props, tutorial units) are not playable.
            is_playable: !c.traits.is_empty(),
            set_mutator: ctx.set_mutator.to_string(),
            patch: ctx.patch.to_string(),
        });
    }

    if !unknown_traits.is_empty() {
        return Err(ValidationError::UnknownChampionTraits(unknown_traits).into());
    }
    Ok(champions)
}

/// Classifies an item. Base components are recognised by appearing in some
/// other item's composition; the remaining kinds by name and icon location.
pub fn item_type(api_name: &str, icon: Option<&str>, base_components: &HashSet<&str>) -> ItemType {
    let icon = icon.unwrap_or_default();
    if base_components.contains(api_name) {
        ItemType::BaseComponent
    } else if api_name.contains("Emblem") {
        ItemType::Emblem
    } else if icon.starts_with(ORNN_ICON_PREFIX) {
        ItemType::Ornn
    } else if icon.starts_with(RADIANT_ICON_PREFIX) {
        ItemType::Radiant
    } else if icon.starts_with(SUPPORT_ICON_PREFIX) {
        ItemType::Support
    } else {
        ItemType::Other
    }
}

pub fn build_items(
    raw_items: &[RawItem],
    traits: &TraitIndex,
    ctx: AssemblyContext,
) -> Result<Vec<ItemRecord>> {
    let kept: Vec<&RawItem> = raw_items
        .iter()
        .filter(|item| item.category().is_some_and(|c| ITEM_CATEGORIES.contains(&c)))
        .collect();

    let base_components: HashSet<&str> = kept
        .iter()
        .flat_map(|item| item.composition.iter().map(String::as_str))
        .collect();

    let items: Vec<ItemRecord> = kept
        .into_iter()
        .map(|item| {
            let item_type = item_type(&item.api_name, item.icon.as_deref(), &base_components);
            let is_craftable = item_type.is_craftable_kind() && !item.composition.is_empty();
            let trait_counts = match item_type {
                ItemType::Emblem => traits.emblem_trait(Some(&item.api_name), item.name.as_deref()),
                _ => None,
            };
            let emblem_trait = trait_counts
                .as_ref()
                .and_then(|counts| counts.keys().next().cloned());

            ItemRecord {
                api_name: item.api_name.clone(),
                id: item.id.clone(),
                name: item.name.clone(),
                desc: item.desc.clone(),
                icon: item.icon.clone(),
                image_url: item.icon.as_deref().map(|icon| image_url(ctx.patch, icon)),
                effects: item.effects.clone(),
                unique: item.unique,
                composition: if is_craftable {
                    item.composition.clone()
                } else {
                    Vec::new()
                },
                category: item.category().map(str::to_string),
                item_type,
                is_craftable,
                trait_counts,
                emblem_trait,
                set_mutator: ctx.set_mutator.to_string(),
                patch: ctx.patch.to_string(),
            }
        })
        .collect();

    check_composition_acyclic(&items)?;
    Ok(items)
}

/// Components must be strictly simpler than what they build, so the
/// composition graph is a DAG. Components missing from the table are leaves.
pub fn check_composition_acyclic(items: &[ItemRecord]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let by_name: HashMap<&str, &ItemRecord> = items
        .iter()
        .map(|item| (item.api_name.as_str(), item))
        .collect();
    let mut marks: HashMap<&str, Mark> = HashMap::default();

    for root in items {
        if marks.contains_key(root.api_name.as_str()) {
            continue;
        }
        // Depth-first walk with an explicit stack of (item, next child index).
        let mut path: Vec<(&str, usize)> = vec![(root.api_name.as_str(), 0)];
        marks.insert(root.api_name.as_str(), Mark::Visiting);

        while let Some((name, child_idx)) = path.last_mut() {
            let children = by_name
                .get(*name)
                .map(|item| item.composition.as_slice())
                .unwrap_or_default();
            let Some(child) = children.get(*child_idx) else {
                marks.insert(*name, Mark::Done);
                path.pop();
                continue;
            };
            *child_idx += 1;
            let child = child.as_str();

            match marks.get(child) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|(n, _)| *n == child).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|(n, _)| n.to_string()).collect();
                    cycle.push(child.to_string());
                    return Err(ValidationError::CompositionCycle(cycle).into());
                }
                None => {
                    if by_name.contains_key(child) {
                        marks.insert(child, Mark::Visiting);
                        path.push((child, 0));
                    } else {
                        marks.insert(child, Mark::Done);
                    }
                }
            }
        }
    }
    Ok(())
}

pub fn build_augments(
    raw_items: &[RawItem],
    traits: &TraitIndex,
    tables: &ReferenceTables,
    ctx: AssemblyContext,
) -> Result<Vec<AugmentRecord>> {
    let exceptions = IconRarities::with_extra(&tables.icon_rarities);
    let legends = tables.legend_assignments(ctx.set_mutator);

    let mut augments = Vec::new();
    let mut unresolved = Vec::new();
    let mut legend_hits: BTreeSet<&str> = BTreeSet::new();

    for item in raw_items
        .iter()
        .filter(|item| item.category() == Some(AUGMENT_CATEGORY))
    {
        let icon = item.icon.as_deref().unwrap_or_default();
        let Some(rarity) = augment_rarity(icon, &exceptions) else {
            unresolved.push((item.api_name.clone(), icon.to_string()));
            continue;
        };

        let trait_counts = item
            .name
            .as_deref()
            .and_then(|name| trait_bonus_count(name, item.desc.as_deref(), traits));

        let legend = legends.get(&item.api_name);
        if legend.is_some() {
            legend_hits.insert(&item.api_name);
        }

        augments.push(AugmentRecord {
            api_name: item.api_name.clone(),
            id: item.id.clone(),
            name: item.name.clone(),
            desc: item.desc.clone(),
            icon: item.icon.clone(),
            image_url: item.icon.as_deref().map(|icon| image_url(ctx.patch, icon)),
            effects: item.effects.clone(),
            unique: item.unique,
            rarity,
            trait_counts,
            legend_ids: legend.map(|l| l.legend_ids.clone()),
            legend_tier: legend.map(|l| l.tier.clone()),
            legend_stage: legend.map(|l| l.stage.clone()),
            set_mutator: ctx.set_mutator.to_string(),
            patch: ctx.patch.to_string(),
        });
    }

    if !unresolved.is_empty() {
        return Err(ValidationError::UnresolvedRarity(unresolved).into());
    }

    for api_name in legends.keys() {
        if !legend_hits.contains(api_name.as_str()) {
            warn!("Legend augment {} is not in the upstream augments", api_name);
        }
    }
    Ok(augments)
}
