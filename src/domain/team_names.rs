use regex::Regex;

use super::models::TeamMap;

pub const PLACEHOLDER_TEAM: &str = "TBD";

const PLACEHOLDER_TOKENS: [&str; 3] = ["TBD", "TBA", "TO BE DETERMINED"];

/// Maps upstream team names onto the short names used in statistics
pub struct TeamNameNormalizer {
    aliases: Vec<(String, String)>,
    generic_words: Regex,
}

impl TeamNameNormalizer {
    pub fn new(team_map: &TeamMap) -> Self {
        let mut aliases: Vec<(String, String)> = team_map
            .iter()
            .filter(|(alias, _)| !alias.trim().is_empty())
            .map(|(alias, short)| (alias.to_uppercase(), short.clone()))
            .collect();
        // Longest alias wins so "T1 Academy" is not swallowed by "T1"
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            aliases,
            generic_words: Regex::new(r"(?i)(esports|gaming|academy|team|club)")
                .expect("generic team word pattern is valid"),
        }
    }

    /// Returns `None` for missing or blank names, including names made only of generic words
    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let name = raw?.trim();
        if name.is_empty() {
            return None;
        }

        let upper = name.to_uppercase();
        if is_placeholder(&upper) {
            return Some(PLACEHOLDER_TEAM.to_string());
        }

        if let Some((_, short)) = self.aliases.iter().find(|(alias, _)| upper.contains(alias.as_str())) {
            return Some(short.clone());
        }

        let stripped = self.generic_words.replace_all(name, "");
        let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() { None } else { Some(cleaned) }
    }
}

fn is_placeholder(upper: &str) -> bool {
    PLACEHOLDER_TOKENS.iter().any(|token| upper.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TeamNameNormalizer {
        let mut map = TeamMap::new();
        map.insert("T1".to_string(), "T1".to_string());
        map.insert("T1 Esports Academy".to_string(), "T1A".to_string());
        map.insert("Gen.G".to_string(), "GEN".to_string());
        TeamNameNormalizer::new(&map)
    }

    #[test]
    fn test_alias_lookup_is_case_insensitive_substring() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("gen.g esports")), Some("GEN".to_string()));
        assert_eq!(n.normalize(Some("T1")), Some("T1".to_string()));
    }

    #[test]
    fn test_longest_alias_wins() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("T1 Esports Academy")), Some("T1A".to_string()));
    }

    #[test]
    fn test_placeholders_collapse_to_tbd() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("tba")), Some("TBD".to_string()));
        assert_eq!(n.normalize(Some("To Be Determined")), Some("TBD".to_string()));
        assert_eq!(n.normalize(Some("Winner of TBD vs X")), Some("TBD".to_string()));
    }

    #[test]
    fn test_unknown_names_lose_generic_words() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("Dplus Gaming")), Some("Dplus".to_string()));
        assert_eq!(n.normalize(Some("Team")), None);
        assert_eq!(n.normalize(Some("Gaming Club")), None);
    }

    #[test]
    fn test_missing_names_are_rejected() {
        let n = normalizer();
        assert_eq!(n.normalize(None), None);
        assert_eq!(n.normalize(Some("   ")), None);
    }
}
