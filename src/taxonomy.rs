// Injectable naming and classification data: spelling aliases for
// governorates and districts, and the Urban / Agriculture / Mixed buckets.
//
// The built-in tables are a starting point. Each top-level field present in
// a `taxonomy.json` file replaces the matching built-in table.
use crate::error::{AppError, Result};
use crate::types::{AreaProfile, GroupLevel};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Comparison key for alias lookups: dash variants (including the
/// mis-decoded `â€“` / `â€”` forms) fold to `-`, spacing around dashes is
/// dropped, whitespace collapses and case is ignored.
pub fn alias_key(s: &str) -> String {
    let folded: String = s
        .replace("â€“", "-")
        .replace("â€”", "-")
        .chars()
        .map(|c| match c {
            '–' | '—' | '‐' | '‑' | '−' => '-',
            '\u{00a0}' => ' ',
            other => other,
        })
        .collect();
    folded
        .split('-')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// `raw spelling -> canonical spelling`, matched on [`alias_key`].
///
/// Construction resolves alias chains to their end point and registers every
/// canonical spelling as its own alias, so [`AliasTable::apply`] is idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    map: HashMap<String, String>,
}

impl AliasTable {
    pub fn new<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw: HashMap<String, String> = HashMap::new();
        for (k, v) in pairs {
            raw.insert(alias_key(k.as_ref()), v.into());
        }

        let mut map = HashMap::with_capacity(raw.len() * 2);
        for (key, value) in &raw {
            let canonical = Self::resolve_chain(&raw, value)?;
            map.insert(key.clone(), canonical);
        }
        let canonicals: Vec<String> = map.values().cloned().collect();
        for canonical in canonicals {
            map.entry(alias_key(&canonical)).or_insert(canonical);
        }
        Ok(Self { map })
    }

    fn resolve_chain(raw: &HashMap<String, String>, start: &str) -> Result<String> {
        let mut current = start.to_string();
        for _ in 0..=raw.len() {
            match raw.get(&alias_key(&current)) {
                Some(next) if *next != current => current = next.clone(),
                _ => return Ok(current),
            }
        }
        Err(AppError::InvalidTaxonomy(format!(
            "alias cycle involving '{}'",
            start
        )))
    }

    /// Canonical spelling for `name`; unknown names pass through unchanged.
    pub fn apply(&self, name: &str) -> String {
        self.map
            .get(&alias_key(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Serialized shape of a taxonomy file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TaxonomyFile {
    pub governorate_aliases: Vec<(String, String)>,
    pub district_aliases: Vec<(String, String)>,
    pub governorate_profiles: HashMap<String, AreaProfile>,
    pub district_profiles: HashMap<String, AreaProfile>,
    pub governorate_default: AreaProfile,
    pub district_default: AreaProfile,
}

impl Default for TaxonomyFile {
    fn default() -> Self {
        let pairs = |v: &[(&str, &str)]| {
            v.iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect::<Vec<_>>()
        };
        let profiles = |v: &[(&str, AreaProfile)]| {
            v.iter()
                .map(|(a, p)| (a.to_string(), *p))
                .collect::<HashMap<_, _>>()
        };
        use AreaProfile::{Agriculture, Mixed, Urban};
        Self {
            governorate_aliases: pairs(&[
                ("North", "North Lebanon"),
                ("South", "South Lebanon"),
                ("Beqaa", "Bekaa"),
            ]),
            district_aliases: pairs(&[
                ("Minieh-Danniyeh", "Minieh - Danniyeh"),
                ("Miniyeh-Danniyeh", "Minieh - Danniyeh"),
                ("Minieh-Dinnieh", "Minieh - Danniyeh"),
                ("Miniyeh-Dinnieh", "Minieh - Danniyeh"),
                ("Metn", "El Metn"),
                ("Keserwan", "Kesrouan"),
                ("Shouf", "Chouf"),
                ("Byblos", "Jbail"),
                ("Tyre", "Sour"),
                ("Zahle", "Zahleh"),
                ("Marjeyoun", "Marjaayoun"),
            ]),
            governorate_profiles: profiles(&[
                ("Beirut", Urban),
                ("Mount Lebanon", Urban),
                ("Keserwan-Jbeil", Urban),
                ("Bekaa", Agriculture),
                ("Baalbek-El Hermel", Agriculture),
                ("El Nabatieh", Agriculture),
                ("Akkar", Agriculture),
                ("North Lebanon", Mixed),
                ("South Lebanon", Mixed),
            ]),
            district_profiles: profiles(&[
                ("Tripoli", Urban),
                ("Saida", Urban),
                ("Sour", Urban),
                ("Baabda", Urban),
                ("El Metn", Urban),
                ("Aley", Urban),
                ("Kesrouan", Urban),
                ("Chouf", Urban),
                ("Jbail", Urban),
                ("Akkar", Agriculture),
                ("Baalbek", Agriculture),
                ("Hermel", Agriculture),
                ("Zahleh", Agriculture),
                ("West Bekaa", Agriculture),
                ("Rachaya", Agriculture),
                ("Bint Jbeil", Agriculture),
                ("Marjaayoun", Agriculture),
                ("Hasbaya", Agriculture),
                ("Jezzine", Agriculture),
                ("Minieh - Danniyeh", Agriculture),
                ("Bcharre", Agriculture),
                ("Koura", Agriculture),
                ("Batroun", Agriculture),
                ("Zgharta", Agriculture),
            ]),
            governorate_default: Mixed,
            district_default: Agriculture,
        }
    }
}

/// Validated alias tables plus area-profile buckets.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub governorate_aliases: AliasTable,
    pub district_aliases: AliasTable,
    governorate_profiles: HashMap<String, AreaProfile>,
    district_profiles: HashMap<String, AreaProfile>,
    governorate_default: AreaProfile,
    district_default: AreaProfile,
}

impl Taxonomy {
    pub fn builtin() -> Result<Self> {
        Self::from_file(TaxonomyFile::default())
    }

    pub fn from_file(file: TaxonomyFile) -> Result<Self> {
        Ok(Self {
            governorate_aliases: AliasTable::new(file.governorate_aliases)?,
            district_aliases: AliasTable::new(file.district_aliases)?,
            governorate_profiles: file.governorate_profiles,
            district_profiles: file.district_profiles,
            governorate_default: file.governorate_default,
            district_default: file.district_default,
        })
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let file: TaxonomyFile = serde_json::from_str(&text)?;
        Self::from_file(file)
    }

    /// Profile of `area` at `level`, falling back to the level default.
    pub fn profile(&self, level: GroupLevel, area: &str) -> AreaProfile {
        let (table, default) = match level {
            GroupLevel::Governorate => (&self.governorate_profiles, self.governorate_default),
            GroupLevel::District => (&self.district_profiles, self.district_default),
        };
        table.get(area.trim()).copied().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mis_decoded_dashes_share_a_key() {
        let expected = alias_key("Minieh-Danniyeh");
        assert_eq!(alias_key("Minieh â€“ Danniyeh"), expected);
        assert_eq!(alias_key("Minieh – Danniyeh"), expected);
        assert_eq!(alias_key("minieh -  danniyeh"), expected);
    }

    #[test]
    fn district_variants_normalize_to_one_spelling() {
        let tax = Taxonomy::builtin().unwrap();
        for raw in [
            "Minieh-Danniyeh",
            "Minieh â€“ Danniyeh",
            "Minieh—Danniyeh",
            "Miniyeh-Danniyeh",
            "Minieh - Danniyeh",
        ] {
            assert_eq!(tax.district_aliases.apply(raw), "Minieh - Danniyeh", "{raw}");
        }
        assert_eq!(tax.district_aliases.apply("Batroun"), "Batroun");
    }

    #[test]
    fn chains_resolve_to_end_point() {
        let table = AliasTable::new([("A", "B"), ("B", "C")]).unwrap();
        assert_eq!(table.apply("A"), "C");
        assert_eq!(table.apply("B"), "C");
        assert_eq!(table.apply("C"), "C");
    }

    #[test]
    fn cycles_are_rejected() {
        let err = AliasTable::new([("A", "B"), ("B", "A")]).unwrap_err();
        assert!(matches!(err, AppError::InvalidTaxonomy(_)));
    }

    #[test]
    fn profiles_fall_back_to_level_default() {
        let tax = Taxonomy::builtin().unwrap();
        assert_eq!(tax.profile(GroupLevel::Governorate, "Beirut"), AreaProfile::Urban);
        assert_eq!(tax.profile(GroupLevel::Governorate, "Nowhere"), AreaProfile::Mixed);
        assert_eq!(tax.profile(GroupLevel::District, "Nowhere"), AreaProfile::Agriculture);
    }

    #[test]
    fn json_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(
            &path,
            r#"{"governorate_aliases": [["Beqaa", "Bekaa"]],
                "governorate_profiles": {"Bekaa": "Urban"}}"#,
        )
        .unwrap();
        let tax = Taxonomy::from_json_path(&path).unwrap();
        assert_eq!(tax.governorate_aliases.apply("Beqaa"), "Bekaa");
        assert_eq!(tax.governorate_aliases.apply("North"), "North");
        assert_eq!(tax.profile(GroupLevel::Governorate, "Bekaa"), AreaProfile::Urban);
    }

    proptest! {
        #[test]
        fn alias_application_is_idempotent(name in "[A-Za-z \\-–]{0,20}") {
            let tax = Taxonomy::builtin().unwrap();
            for table in [&tax.governorate_aliases, &tax.district_aliases] {
                let once = table.apply(&name);
                prop_assert_eq!(table.apply(&once), once);
            }
        }

        #[test]
        fn known_spellings_are_idempotent(idx in 0usize..11) {
            let tax = Taxonomy::builtin().unwrap();
            let raw = &TaxonomyFile::default().district_aliases[idx].0;
            let once = tax.district_aliases.apply(raw);
            prop_assert_eq!(tax.district_aliases.apply(&once), once);
        }
    }
}
