//! Fact extractors: pure functions from upstream text or icon paths to small
//! structured facts. `None` means "no fact here", never an error.

use crate::records::TraitCounts;
use crate::trait_index::TraitIndex;
use std::collections::BTreeMap;

/// Icon directory of augments whose rarity is encoded in the file name.
pub const HEXCORE_ICON_PREFIX: &str = "ASSETS/Maps/TFT/Icons/Augments/Hexcore/";

/// Icon paths whose file names do not encode a rarity, or encode it wrong.
const ICON_RARITY_EXCEPTIONS: &[(&str, u8)] = &[
    (
        "ASSETS/Maps/TFT/Icons/Augments/Hexcore/Tiniest-TitanIII.TFT_Set9.tex",
        3,
    ),
    (
        "ASSETS/Maps/TFT/Icons/Augments/Hexcore/TFT_Augment_EagleEye.tex",
        2,
    ),
    ("ASSETS/Maps/TFT/Icons/Augments/Hexcore/NoScope.tex", 2),
    (
        "ASSETS/Maps/Particles/TFT/Item_Icons/Traits/Spatula/Set14/TFT14_Emblem_StreetDemon.TFT_Set14.tex",
        2,
    ),
    // Template icon; the rarity is a placeholder.
    (
        "ASSETS/Maps/TFT/Icons/TFT14/TFT14_Template_Augment_Icon.TFT_Set14.tex",
        1,
    ),
];

/// Exact icon path → rarity, consulted before the file-name pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct IconRarities(BTreeMap<String, u8>);

impl IconRarities {
    /// The built-in exceptions plus `extra` (which wins on conflicts).
    pub fn with_extra(extra: &BTreeMap<String, u8>) -> Self {
        let mut table: BTreeMap<String, u8> = ICON_RARITY_EXCEPTIONS
            .iter()
            .map(|(icon, rarity)| (icon.to_string(), *rarity))
            .collect();
        table.extend(extra.iter().map(|(icon, rarity)| (icon.clone(), *rarity)));
        Self(table)
    }

    pub fn get(&self, icon: &str) -> Option<u8> {
        self.0.get(icon).copied()
    }
}

impl Default for IconRarities {
    fn default() -> Self {
        Self::with_extra(&BTreeMap::new())
    }
}

/// Extra trait units granted by a trait augment, e.g.
/// `("Shimmerscale Soul", "Your team counts as having 1 additional Shimmerscale. ...")`
/// → `{Shimmerscale: 1}`.
///
/// Both the description ("... having N additional ...") and the name
/// ("<trait name> <Word>") must match, and the trait name must be known.
pub fn trait_bonus_count(name: &str, desc: Option<&str>, traits: &TraitIndex) -> Option<TraitCounts> {
    let count = additional_count(desc?)?;
    let phrase = trait_phrase(name)?;
    let trait_api_name = traits.api_name(phrase)?;
    Some(TraitCounts::from([(trait_api_name.to_string(), count)]))
}

/// The digit N in "... having N additional ...". Needs text on both sides;
/// with several candidates the last one counts.
pub fn additional_count(desc: &str) -> Option<u32> {
    let desc = single_line(desc)?;
    desc.rmatch_indices("having ").find_map(|(start, needle)| {
        if start == 0 {
            return None;
        }
        let rest = &desc[start + needle.len()..];
        let digit = rest.chars().next().filter(char::is_ascii_digit)?;
        let tail = rest[1..].strip_prefix(" additional")?;
        if tail.is_empty() {
            return None;
        }
        digit.to_digit(10)
    })
}

/// Everything before the final word of an augment name, when that word is
/// plain ASCII letters: `"Star Guardian Heart"` → `"Star Guardian"`.
pub fn trait_phrase(name: &str) -> Option<&str> {
    let name = single_line(name)?;
    let (phrase, word) = name.rsplit_once(' ')?;
    if phrase.is_empty() || word.is_empty() || !word.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    Some(phrase)
}

/// Text matching stops at line breaks; a single trailing newline is tolerated.
fn single_line(text: &str) -> Option<&str> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    (!text.contains('\n')).then_some(text)
}

/// Augment rarity (1–3): the exception table first, then the icon file name.
pub fn augment_rarity(icon: &str, exceptions: &IconRarities) -> Option<u8> {
    exceptions.get(icon).or_else(|| rarity_from_icon(icon))
}

/// Reads the rarity tier encoded at the end of a Hexcore augment icon name:
///
/// - `Freljord-Heart-I.TFT_Set9.tex` → 1 (roman numeral after a separator)
/// - `Tiniest-TitanIII.tex` → 3 (roman numeral glued to the name)
/// - `Pirates2.tex` → 2 (arabic digit)
///
/// The numeral closest to the end of the file stem wins. At least one
/// character must precede it in the stem and follow it in the path.
pub fn rarity_from_icon(icon: &str) -> Option<u8> {
    let file = icon.strip_prefix(HEXCORE_ICON_PREFIX)?;
    let bytes = file.as_bytes();
    let stem_len = bytes.iter().position(|&b| b == b'.').unwrap_or(bytes.len());
    (1..stem_len).rev().find_map(|pos| numeral_at(bytes, pos))
}

fn numeral_at(bytes: &[u8], pos: usize) -> Option<u8> {
    match bytes[pos] {
        b @ b'1'..=b'3' if pos + 1 < bytes.len() => Some(b - b'0'),
        b'-' | b'_' => roman_run(bytes, pos + 1),
        b'I' if !matches!(bytes[pos - 1], b'-' | b'_' | b'I') => roman_run(bytes, pos),
        _ => None,
    }
}

/// Length of the `I` run starting at `start`, leaving at least one byte after it.
fn roman_run(bytes: &[u8], start: usize) -> Option<u8> {
    let run = bytes
        .get(start..)?
        .iter()
        .take_while(|&&b| b == b'I')
        .count();
    let run = if start + run < bytes.len() { run } else { run.saturating_sub(1) };
    match run {
        1..=3 => Some(run as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::TraitRecord;

    fn index(traits: &[(&str, &str)]) -> TraitIndex {
        let records: Vec<TraitRecord> = traits
            .iter()
            .map(|(api_name, name)| TraitRecord {
                api_name: api_name.to_string(),
                name: name.to_string(),
                icon: None,
                effects: Vec::new(),
                needed_unit_counts: Vec::new(),
                set_mutator: "TFTSet7".to_string(),
                patch: "12.23".to_string(),
            })
            .collect();
        TraitIndex::build(&records)
    }

    fn set7_index() -> TraitIndex {
        index(&[
            ("Shimmerscale", "Shimmerscale"),
            ("Swiftshot", "Swiftshot"),
            ("Clockwork", "Clockwork"),
            ("Star Guardian", "Star Guardian"),
        ])
    }

    fn counts(api_name: &str, n: u32) -> Option<TraitCounts> {
        Some(TraitCounts::from([(api_name.to_string(), n)]))
    }

    #[test]
    fn test_trait_bonus_count() {
        let traits = set7_index();
        assert_eq!(
            trait_bonus_count(
                "Shimmerscale Soul",
                Some("Your team counts as having 1 additional Shimmerscale. Gain a Jax."),
                &traits
            ),
            counts("Shimmerscale", 1)
        );
        assert_eq!(
            trait_bonus_count(
                "Swiftshot Heart",
                Some("Your team counts has having 1 additional Swiftshot. Gain a Twitch."),
                &traits
            ),
            counts("Swiftshot", 1)
        );
        assert_eq!(
            trait_bonus_count(
                "Clockwork Soul",
                Some("Your team counts as having 2 additional Clockworks. Gain @Gold@ gold."),
                &traits
            ),
            counts("Clockwork", 2)
        );
        assert_eq!(
            trait_bonus_count(
                "Star Guardian Heart",
                Some("Your team counts as having 1 additional Star Guardian. Gain a Yuumi."),
                &traits
            ),
            counts("Star Guardian", 1)
        );
    }

    #[test]
    fn test_trait_bonus_count_resolves_api_name() {
        let traits = index(&[("Set7_Shimmerscale", "Shimmerscale")]);
        assert_eq!(
            trait_bonus_count(
                "Shimmerscale Soul",
                Some("Your team counts as having 1 additional Shimmerscale."),
                &traits
            ),
            counts("Set7_Shimmerscale", 1)
        );
    }

    #[test]
    fn test_trait_bonus_count_misses() {
        let traits = set7_index();
        assert_eq!(
            trait_bonus_count("Ancient Archives II", Some("Gain @NumTomes@ Tome of Traits."), &traits),
            None
        );
        assert_eq!(trait_bonus_count("Shimmerscale Soul", None, &traits), None);
        // Unknown trait phrase.
        assert_eq!(
            trait_bonus_count(
                "Dragonmancer Heart",
                Some("Your team counts as having 1 additional Dragonmancer."),
                &traits
            ),
            None
        );
        // Single-word name has no trait phrase.
        assert_eq!(
            trait_bonus_count("Shimmerscale", Some("Counts as having 1 additional Shimmerscale."), &traits),
            None
        );
    }

    #[test]
    fn test_additional_count() {
        assert_eq!(additional_count("Team counts as having 3 additional Mages."), Some(3));
        assert_eq!(additional_count("having 1 additional Mage"), None);
        assert_eq!(additional_count("Counts as having 1 additional"), None);
        assert_eq!(additional_count("Counts as having 12 additional Mages"), None);
        assert_eq!(
            additional_count("A having 1 additional B, then having 2 additional C"),
            Some(2)
        );
        assert_eq!(additional_count("Counts as\nhaving 1 additional Mage"), None);
        assert_eq!(additional_count("Counts as having 1 additional Mage\n"), Some(1));
    }

    #[test]
    fn test_trait_phrase() {
        assert_eq!(trait_phrase("Star Guardian Heart"), Some("Star Guardian"));
        assert_eq!(trait_phrase("Ancient Archives II"), Some("Ancient Archives"));
        assert_eq!(trait_phrase("Mage Crest+"), None);
        assert_eq!(trait_phrase("Heart"), None);
        assert_eq!(trait_phrase(" Heart"), None);
    }

    #[test]
    fn test_rarity_from_icon() {
        let p = |f: &str| format!("{}{}", HEXCORE_ICON_PREFIX, f);
        assert_eq!(rarity_from_icon(&p("Freljord-Heart-I.TFT_Set9.tex")), Some(1));
        assert_eq!(rarity_from_icon(&p("Stars-are-born-II.TFT_Set9.tex")), Some(2));
        assert_eq!(rarity_from_icon(&p("Pirates2.tex")), Some(2));
        assert_eq!(rarity_from_icon(&p("Tiniest-TitanIII.tex")), Some(3));
        assert_eq!(rarity_from_icon(&p("Battlemage-III-A.tex")), Some(3));
        assert_eq!(rarity_from_icon(&p("Cybernetic_II.tex")), Some(2));
    }

    #[test]
    fn test_rarity_from_icon_misses() {
        let p = |f: &str| format!("{}{}", HEXCORE_ICON_PREFIX, f);
        assert_eq!(rarity_from_icon(&p("NoScope.tex")), None);
        assert_eq!(rarity_from_icon(&p("TFT_Augment_EagleEye.tex")), None);
        // The numeral needs something before it in the stem and after it in the path.
        assert_eq!(rarity_from_icon(&p("2.tex")), None);
        assert_eq!(rarity_from_icon(&p("Pirates2")), None);
        // Only I, II and III are tiers.
        assert_eq!(rarity_from_icon(&p("Odd-IIII.tex")), None);
        // Digits past the stem do not count.
        assert_eq!(rarity_from_icon(&p("NoScope.TFT_Set9.tex")), None);
        assert_eq!(rarity_from_icon("ASSETS/Maps/TFT/Icons/Augments/Other/Pirates2.tex"), None);
    }

    #[test]
    fn test_augment_rarity_prefers_exceptions() {
        let exceptions = IconRarities::default();
        assert_eq!(
            augment_rarity("ASSETS/Maps/TFT/Icons/Augments/Hexcore/NoScope.tex", &exceptions),
            Some(2)
        );
        assert_eq!(
            augment_rarity(
                "ASSETS/Maps/TFT/Icons/TFT14/TFT14_Template_Augment_Icon.TFT_Set14.tex",
                &exceptions
            ),
            Some(1)
        );

        let extra = BTreeMap::from([(
            "ASSETS/Maps/TFT/Icons/Augments/Hexcore/Pirates2.tex".to_string(),
            3,
        )]);
        let exceptions = IconRarities::with_extra(&extra);
        assert_eq!(
            augment_rarity("ASSETS/Maps/TFT/Icons/Augments/Hexcore/Pirates2.tex", &exceptions),
            Some(3)
        );
        assert_eq!(
            augment_rarity("ASSETS/Maps/TFT/Icons/Augments/Hexcore/Pirates1.tex", &exceptions),
            Some(1)
        );
    }
}
