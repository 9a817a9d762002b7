//! Map name cleanup and OCR misread correction.
//!
//! OCR output of the briefing's map name is normalized into the hyphenated
//! lowercase keys used by the spawn table. Known systematic misreads are fixed
//! by a correction table that is only consulted when the cleaned name is not
//! already a known map, and a correction only counts if it yields a known map.

use anyhow::Result;
use regex::Regex;

const NVN_PATTERN: &str = r"(\d+).?v.?(\d+)";
const SEPARATOR_PATTERN: &str = r"[_.\s]";
const STRIP_PATTERN: &str = r"['()]";
const DASH_RUN_PATTERN: &str = r"-{2,}";

/// Misread corrections, tried in order: (pattern, replacement).
const CORRECTIONS: &[(&str, &str)] = &[
    // "q" read as "g" (first occurrence)
    (r"^([^g]*?)g(.*)$", "${1}q${2}"),
    // "i" read as "t" (second "t" of the name)
    (r"^([^t]*?t[^t]+?)t(.*)$", "${1}i${2}"),
    // trailing "e" read as ":"
    (r"^(.*?):$", "${1}e"),
];

struct Correction {
    pattern: Regex,
    replacement: &'static str,
}

pub struct MapNameNormalizer {
    nvn: Regex,
    separator: Regex,
    strip: Regex,
    dash_run: Regex,
    corrections: Vec<Correction>,
}

impl MapNameNormalizer {
    pub fn new() -> Result<Self> {
        let corrections = CORRECTIONS
            .iter()
            .map(|&(pattern, replacement)| {
                Regex::new(pattern).map(|pattern| Correction {
                    pattern,
                    replacement,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            nvn: Regex::new(NVN_PATTERN)?,
            separator: Regex::new(SEPARATOR_PATTERN)?,
            strip: Regex::new(STRIP_PATTERN)?,
            dash_run: Regex::new(DASH_RUN_PATTERN)?,
            corrections,
        })
    }

    /// Cleans raw OCR text into a map key, applying the first correction that
    /// produces a known map when the cleaned text is not known itself.
    pub fn normalize(&self, raw: &str, is_known: impl Fn(&str) -> bool) -> String {
        let cleaned = self.clean(raw);
        if is_known(&cleaned) {
            return cleaned;
        }

        for correction in &self.corrections {
            if !correction.pattern.is_match(&cleaned) {
                continue;
            }
            let corrected = correction
                .pattern
                .replace(&cleaned, correction.replacement)
                .into_owned();
            if is_known(&corrected) {
                return corrected;
            }
        }

        cleaned
    }

    fn clean(&self, raw: &str) -> String {
        let name = self.nvn.replace_all(raw.trim(), "${1}v${2}");
        let name = self.separator.replace_all(&name, "-");
        let name = self.strip.replace_all(&name, "");
        let name = self.dash_run.replace_all(&name, "-");
        name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SpawnTable;

    fn normalize(raw: &str) -> String {
        let table = SpawnTable::builtin();
        MapNameNormalizer::new()
            .unwrap()
            .normalize(raw, |name| table.contains_map(name))
    }

    #[test]
    fn test_cleans_separators_and_case() {
        assert_eq!(normalize("Strike At Karkand"), "strike-at-karkand");
        assert_eq!(normalize("dragon_valley"), "dragon-valley");
        assert_eq!(normalize("Wake Island 2007"), "wake-island-2007");
        assert_eq!(normalize("Operation  Clean Sweep"), "operation-clean-sweep");
    }

    #[test]
    fn test_removes_quotes_and_parens() {
        assert_eq!(normalize("Mashtuur City (Day)"), "mashtuur-city-day");
    }

    #[test]
    fn test_nvn_pattern() {
        assert_eq!(normalize("Inf 16 v 16"), "inf-16v16");
        assert_eq!(normalize("arena 4-v-4"), "arena-4v4");
    }

    #[test]
    fn test_g_misread_as_q() {
        // "daqing" read with a "g"
        assert_eq!(normalize("Daging Oilfields"), "daqing-oilfields");
    }

    #[test]
    fn test_second_t_misread() {
        assert_eq!(normalize("Mashtuur Ctty"), "mashtuur-city");
    }

    #[test]
    fn test_trailing_colon_misread() {
        assert_eq!(normalize("Songhua Stalemat:"), "songhua-stalemate");
    }

    #[test]
    fn test_unknown_names_are_left_cleaned() {
        assert_eq!(normalize("Some Custom Map"), "some-custom-map");
    }

    #[test]
    fn test_known_names_are_fixed_points() {
        let table = SpawnTable::builtin();
        let normalizer = MapNameNormalizer::new().unwrap();
        for name in table.map_names() {
            assert_eq!(normalizer.normalize(name, |n| table.contains_map(n)), name);
        }
    }
}
