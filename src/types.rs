use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaType {
    Governorate,
    District,
    Other,
}

/// Administrative level used as the group-by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupLevel {
    Governorate,
    District,
}

impl fmt::Display for GroupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLevel::Governorate => write!(f, "Governorate"),
            GroupLevel::District => write!(f, "District"),
        }
    }
}

/// External Urban / Agriculture / Mixed classification of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaProfile {
    Urban,
    Agriculture,
    Mixed,
}

/// Network-condition shares.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkCondition {
    pub good: f64,
    pub acceptable: f64,
    pub bad: f64,
}

/// Counts of households per main water source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceMix {
    pub public: f64,
    pub well: f64,
    pub gallons: f64,
    pub water_point: f64,
    pub other: f64,
}

/// The two categorical families that are rendered as 100% shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShareFamily {
    NetworkCondition,
    SourceMix,
}

impl ShareFamily {
    pub fn categories(self) -> &'static [Category] {
        match self {
            ShareFamily::NetworkCondition => &[Category::Good, Category::Acceptable, Category::Bad],
            ShareFamily::SourceMix => &[
                Category::Public,
                Category::Well,
                Category::Gallons,
                Category::WaterPoint,
                Category::Other,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Good,
    Acceptable,
    Bad,
    Public,
    Well,
    Gallons,
    WaterPoint,
    Other,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Good => "Good %",
            Category::Acceptable => "Acceptable %",
            Category::Bad => "Bad %",
            Category::Public => "Public network %",
            Category::Well => "Well %",
            Category::Gallons => "Gallons %",
            Category::WaterPoint => "Water point %",
            Category::Other => "Other %",
        }
    }

    pub fn family(self) -> ShareFamily {
        match self {
            Category::Good | Category::Acceptable | Category::Bad => ShareFamily::NetworkCondition,
            _ => ShareFamily::SourceMix,
        }
    }
}

/// One cleaned input row. Numeric fields are always finite and `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub area_name: String,
    pub area_type: AreaType,
    pub governorate: Option<String>,
    pub district: Option<String>,
    pub town: Option<String>,
    pub permanent_springs: f64,
    pub seasonal_springs: f64,
    pub network: Option<NetworkCondition>,
    pub source_mix: Option<SourceMix>,
}

impl CanonicalRecord {
    pub fn area_at(&self, level: GroupLevel) -> Option<&str> {
        match level {
            GroupLevel::Governorate => self.governorate.as_deref(),
            GroupLevel::District => self.district.as_deref(),
        }
    }

    pub fn category_value(&self, category: Category) -> f64 {
        match category {
            Category::Good => self.network.map_or(0.0, |n| n.good),
            Category::Acceptable => self.network.map_or(0.0, |n| n.acceptable),
            Category::Bad => self.network.map_or(0.0, |n| n.bad),
            Category::Public => self.source_mix.map_or(0.0, |s| s.public),
            Category::Well => self.source_mix.map_or(0.0, |s| s.well),
            Category::Gallons => self.source_mix.map_or(0.0, |s| s.gallons),
            Category::WaterPoint => self.source_mix.map_or(0.0, |s| s.water_point),
            Category::Other => self.source_mix.map_or(0.0, |s| s.other),
        }
    }
}

/// Aggregated permanent vs seasonal springs for one area.
///
/// `permanent`/`seasonal` are `None` only in per-town mode when the area has
/// no named towns.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringRow {
    pub area_name: String,
    pub permanent: Option<f64>,
    pub seasonal: Option<f64>,
    pub towns: Option<usize>,
}

impl SpringRow {
    pub fn total(&self) -> Option<f64> {
        Some(self.permanent? + self.seasonal?)
    }

    pub fn gap(&self) -> Option<f64> {
        Some(self.seasonal? - self.permanent?)
    }

    pub fn ratio(&self) -> Option<f64> {
        let permanent = self.permanent?;
        if permanent > 0.0 {
            Some(self.seasonal? / permanent)
        } else {
            None
        }
    }
}

/// Percentage shares for one area; shares are in family category order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub area_name: String,
    pub family: ShareFamily,
    pub shares: Vec<(Category, f64)>,
}

impl ShareRow {
    pub fn share(&self, category: Category) -> Option<f64> {
        self.shares
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SpringExportRow {
    #[serde(rename = "Area")]
    #[tabled(rename = "Area")]
    pub area_name: String,
    #[serde(rename = "Permanent")]
    #[tabled(rename = "Permanent")]
    pub permanent_value: String,
    #[serde(rename = "Seasonal")]
    #[tabled(rename = "Seasonal")]
    pub seasonal_value: String,
    #[serde(rename = "Gap")]
    #[tabled(rename = "Gap")]
    pub gap: String,
    #[serde(rename = "Ratio")]
    #[tabled(rename = "Ratio")]
    pub ratio: String,
    #[serde(rename = "Towns")]
    #[tabled(rename = "Towns")]
    pub towns: String,
}

#[derive(Debug, Serialize)]
pub struct Takeaway {
    pub area: String,
    pub gap: f64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub group_level: GroupLevel,
    pub springs_scale: String,
    pub records_in_scope: usize,
    pub areas_in_scope: usize,
    pub total_permanent_springs: f64,
    pub total_seasonal_springs: f64,
    pub largest_seasonal_dependence: Option<Takeaway>,
    pub unavailable: Vec<String>,
}
