//! Per-entity export of one set: upstream entities written back out unchanged,
//! one file per kind, plus a trait name → icon file map for asset lookups.

use crate::error::Result;
use crate::model::{RawTrait, SetEntry};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes `tft<N>_{augments,champions,items,traits}.json` and
/// `trait_asset_map.json` into `out_dir`, returning the written paths.
pub fn export_set(entry: &SetEntry, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let prefix = format!("tft{}", entry.number);
    let empty = Value::Array(Vec::new());

    Ok(vec![
        write_json(
            &out_dir.join(format!("{}_augments.json", prefix)),
            entry.extra.get("augments").unwrap_or(&empty),
        )?,
        write_json(
            &out_dir.join(format!("{}_champions.json", prefix)),
            &entry.raw_champions,
        )?,
        write_json(
            &out_dir.join(format!("{}_items.json", prefix)),
            entry.extra.get("items").unwrap_or(&empty),
        )?,
        write_json(&out_dir.join(format!("{}_traits.json", prefix)), &entry.raw_traits)?,
        write_json(
            &out_dir.join("trait_asset_map.json"),
            &trait_asset_map(&entry.traits),
        )?,
    ])
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    info!("Created {}", path.display());
    Ok(path.to_path_buf())
}

/// Trait display name → lower-cased icon file name with a `.png` extension,
/// e.g. `Bastion` → `trait_icon_9_bastion.tft_set9.png`. Traits without an
/// icon are left out.
pub fn trait_asset_map(traits: &[RawTrait]) -> Map<String, Value> {
    traits
        .iter()
        .filter(|t| !t.name.is_empty())
        .filter_map(|t| {
            let icon = t.icon.as_deref().filter(|icon| !icon.is_empty())?;
            let stem = Path::new(icon).file_stem()?.to_string_lossy().to_lowercase();
            Some((t.name.clone(), Value::String(format!("{}.png", stem))))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> SetEntry {
        serde_json::from_value(json!({
            "mutator": "TFTSet14",
            "name": "Cyber City",
            "number": 14,
            "augments": ["TFT14_Augment_A"],
            "traits": [
                {"apiName": "TFT14_Swift", "name": "Rapidfire",
                 "icon": "ASSETS/UX/TraitIcons/Trait_Icon_14_Rapidfire.TFT_Set14.tex",
                 "effects": [{"minUnits": 2, "style": 1}]},
                {"apiName": "TFT14_Hidden", "name": "Hidden", "icon": null}
            ],
            "champions": [{"apiName": "TFT14_Zed", "name": "Zed", "cost": 5, "traits": ["Rapidfire"],
                           "characterName": "TFT14_Zed"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_trait_asset_map() {
        let map = trait_asset_map(&entry().traits);
        assert_eq!(map.len(), 1);
        assert_eq!(map["Rapidfire"], json!("trait_icon_14_rapidfire.tft_set14.png"));
    }

    #[test]
    fn test_export_writes_entities_unchanged() {
        let traits = json!([
            {"apiName": "TFT14_Placeholder", "name": "Placeholder",
             "effects": [{"minUnits": null, "style": 1}, {"style": 3}]}
        ]);
        let champions = json!([
            {"apiName": "TFT14_Prop", "name": "Prop", "traits": [], "characterName": "TFT14_Prop"}
        ]);
        let entry: SetEntry = serde_json::from_value(json!({
            "mutator": "TFTSet14",
            "number": 14,
            "traits": traits,
            "champions": champions
        }))
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        export_set(&entry, dir.path()).unwrap();
        let read = |name: &str| -> Value {
            serde_json::from_str(&fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
        };

        assert_eq!(read("tft14_traits.json"), traits);
        assert_eq!(read("tft14_champions.json"), champions);
    }

    #[test]
    fn test_export_set() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_set(&entry(), dir.path()).unwrap();
        assert_eq!(written.len(), 5);

        let read = |name: &str| -> Value {
            serde_json::from_str(&fs::read_to_string(dir.path().join(name)).unwrap()).unwrap()
        };

        assert_eq!(read("tft14_augments.json"), json!(["TFT14_Augment_A"]));
        assert_eq!(read("tft14_items.json"), json!([]));

        let champions = read("tft14_champions.json");
        assert_eq!(champions[0]["apiName"], "TFT14_Zed");
        // Unmodelled upstream fields survive the round trip.
        assert_eq!(champions[0]["characterName"], "TFT14_Zed");

        let traits = read("tft14_traits.json");
        assert_eq!(traits[0]["effects"][0]["minUnits"], 2);
        assert_eq!(traits[0]["effects"][0]["style"], 1);
        assert_eq!(traits[1], json!({"apiName": "TFT14_Hidden", "name": "Hidden", "icon": null}));

        let assets = read("trait_asset_map.json");
        assert_eq!(assets["Rapidfire"], "trait_icon_14_rapidfire.tft_set14.png");
    }
}
