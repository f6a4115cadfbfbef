// Dashboard view settings.
//
// A `ViewConfig` is never mutated in place: each menu action consumes the
// current value and returns a new one, and reports are pure functions of
// (dataset, config).
use crate::types::{AreaProfile, Category, GroupLevel};
use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_TOP_N: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFilter {
    All,
    Only(AreaProfile),
}

impl ProfileFilter {
    pub fn accepts(self, profile: AreaProfile) -> bool {
        match self {
            ProfileFilter::All => true,
            ProfileFilter::Only(p) => p == profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpringsScale {
    Totals,
    PerTownAverage,
}

impl fmt::Display for SpringsScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpringsScale::Totals => write!(f, "Totals"),
            SpringsScale::PerTownAverage => write!(f, "Per-town average"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpringSortKey {
    Total,
    Gap,
    Ratio,
    SeasonalOnly,
    PermanentOnly,
}

impl SpringSortKey {
    pub const ALL: [SpringSortKey; 5] = [
        SpringSortKey::Total,
        SpringSortKey::Gap,
        SpringSortKey::Ratio,
        SpringSortKey::SeasonalOnly,
        SpringSortKey::PermanentOnly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SpringSortKey::Total => "Total springs",
            SpringSortKey::Gap => "Seasonal - Permanent (gap)",
            SpringSortKey::Ratio => "Seasonal / Permanent (ratio)",
            SpringSortKey::SeasonalOnly => "Seasonal only",
            SpringSortKey::PermanentOnly => "Permanent only",
        }
    }
}

/// Sort key, direction and window size for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<K> {
    pub key: K,
    pub ascending: bool,
    pub top_n: usize,
}

impl<K> SortSpec<K> {
    pub fn descending(key: K) -> Self {
        Self { key, ascending: false, top_n: DEFAULT_TOP_N }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub group_level: GroupLevel,
    pub profile: ProfileFilter,
    /// `None` selects every area that survives the profile filter.
    pub areas: Option<BTreeSet<String>>,
    pub springs_scale: SpringsScale,
    pub springs: SortSpec<SpringSortKey>,
    pub network: SortSpec<Category>,
    pub source_mix: SortSpec<Category>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            group_level: GroupLevel::Governorate,
            profile: ProfileFilter::All,
            areas: None,
            springs_scale: SpringsScale::Totals,
            springs: SortSpec::descending(SpringSortKey::Gap),
            network: SortSpec::descending(Category::Good),
            source_mix: SortSpec::descending(Category::Public),
        }
    }
}

impl ViewConfig {
    /// Changing level also clears the area selection, since names differ
    /// between levels.
    pub fn with_group_level(self, group_level: GroupLevel) -> Self {
        if group_level == self.group_level {
            return self;
        }
        Self { group_level, areas: None, ..self }
    }

    pub fn with_profile(self, profile: ProfileFilter) -> Self {
        Self { profile, ..self }
    }

    pub fn with_areas(self, areas: Option<BTreeSet<String>>) -> Self {
        Self { areas, ..self }
    }

    pub fn with_springs_scale(self, springs_scale: SpringsScale) -> Self {
        Self { springs_scale, ..self }
    }

    pub fn with_springs_sort(self, springs: SortSpec<SpringSortKey>) -> Self {
        Self { springs, ..self }
    }

    /// Share sorts are routed by the key's family.
    pub fn with_share_sort(self, spec: SortSpec<Category>) -> Self {
        match spec.key.family() {
            crate::types::ShareFamily::NetworkCondition => Self { network: spec, ..self },
            crate::types::ShareFamily::SourceMix => Self { source_mix: spec, ..self },
        }
    }

    /// Short human description used in error messages.
    pub fn describe(&self) -> String {
        let profile = match self.profile {
            ProfileFilter::All => "all areas".to_string(),
            ProfileFilter::Only(p) => format!("{:?} only", p),
        };
        let areas = match &self.areas {
            None => "every area".to_string(),
            Some(set) => format!("{} selected", set.len()),
        };
        format!("{} level, {}, {}", self.group_level, profile, areas)
    }
}
