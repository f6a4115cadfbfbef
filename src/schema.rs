// Column resolution.
//
// Deployments of the water-resources CSV disagree on header spelling, so
// every logical field carries an ordered list of known aliases. The first
// alias present in the header wins.
use log::debug;

pub const GOVERNORATE: &[&str] = &["GovernorateName"];
pub const DISTRICT: &[&str] = &["DistrictName"];
pub const REF_AREA: &[&str] = &["refArea"];
pub const TOWN: &[&str] = &["Town"];

pub const PERMANENT_SPRINGS: &[&str] = &[
    "Total number of permanent water springs",
    "Permanent springs",
    "Permanent",
];
pub const SEASONAL_SPRINGS: &[&str] = &[
    "Total number of seasonal water springs",
    "Seasonal springs",
    "Seasonal",
];

pub const NETWORK_GOOD: &[&str] = &["State of the water network - good", "Good %", "Good"];
pub const NETWORK_ACCEPTABLE: &[&str] = &[
    "State of the water network - acceptable",
    "Acceptable %",
    "Acceptable",
];
pub const NETWORK_BAD: &[&str] = &["State of the water network - bad", "Bad %", "Bad"];

pub const SOURCE_PUBLIC: &[&str] = &[
    "Main source of drinking water - public network",
    "Public network",
    "Public",
];
pub const SOURCE_WELL: &[&str] = &["Main source of drinking water - well", "Wells", "Well"];
pub const SOURCE_GALLONS: &[&str] = &["Main source of drinking water - gallons", "Gallons"];
pub const SOURCE_WATER_POINT: &[&str] = &[
    "Main source of drinking water - water point",
    "Water point",
    "Water points",
];
pub const SOURCE_OTHER: &[&str] = &["Main source of drinking water - other", "Other source", "Other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpringColumns {
    pub permanent: usize,
    pub seasonal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkColumns {
    pub good: usize,
    pub acceptable: usize,
    pub bad: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMixColumns {
    pub public: usize,
    pub well: usize,
    pub gallons: usize,
    pub water_point: usize,
    pub other: usize,
}

/// Where the geography comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeographySource {
    Direct {
        governorate: usize,
        district: Option<usize>,
    },
    RefArea(usize),
}

/// Which optional field families resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub has_springs: bool,
    pub has_town: bool,
    /// From the header this only means a district column exists; the
    /// loader narrows it to "some row names a district".
    pub has_district: bool,
    pub has_network_condition: bool,
    pub has_source_mix: bool,
}

/// Column indexes selected for every logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub geography: Option<GeographySource>,
    pub town: Option<usize>,
    pub springs: Option<SpringColumns>,
    pub network: Option<NetworkColumns>,
    pub source_mix: Option<SourceMixColumns>,
}

impl ResolvedSchema {
    pub fn capabilities(&self) -> Capabilities {
        let has_district = match self.geography {
            Some(GeographySource::Direct { district, .. }) => district.is_some(),
            Some(GeographySource::RefArea(_)) => true,
            None => false,
        };
        Capabilities {
            has_springs: self.springs.is_some(),
            has_town: self.town.is_some(),
            has_district,
            has_network_condition: self.network.is_some(),
            has_source_mix: self.source_mix.is_some(),
        }
    }
}

/// Index of the first candidate present in `headers`.
pub fn first_present<S: AsRef<str>>(headers: &[S], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|cand| headers.iter().position(|h| h.as_ref() == *cand))
}

/// Resolve every field family against a trimmed header row.
///
/// Never fails: a family without a match is simply `None`, and callers
/// decide whether that is fatal (geography) or degrades a view.
pub fn resolve<S: AsRef<str>>(headers: &[S]) -> ResolvedSchema {
    let geography = match first_present(headers, GOVERNORATE) {
        Some(governorate) => Some(GeographySource::Direct {
            governorate,
            district: first_present(headers, DISTRICT),
        }),
        None => first_present(headers, REF_AREA).map(GeographySource::RefArea),
    };

    let springs = match (
        first_present(headers, PERMANENT_SPRINGS),
        first_present(headers, SEASONAL_SPRINGS),
    ) {
        (Some(permanent), Some(seasonal)) => Some(SpringColumns { permanent, seasonal }),
        _ => None,
    };

    let network = match (
        first_present(headers, NETWORK_GOOD),
        first_present(headers, NETWORK_ACCEPTABLE),
        first_present(headers, NETWORK_BAD),
    ) {
        (Some(good), Some(acceptable), Some(bad)) => Some(NetworkColumns { good, acceptable, bad }),
        _ => None,
    };

    let source_mix = match (
        first_present(headers, SOURCE_PUBLIC),
        first_present(headers, SOURCE_WELL),
        first_present(headers, SOURCE_GALLONS),
        first_present(headers, SOURCE_WATER_POINT),
        first_present(headers, SOURCE_OTHER),
    ) {
        (Some(public), Some(well), Some(gallons), Some(water_point), Some(other)) => {
            Some(SourceMixColumns { public, well, gallons, water_point, other })
        }
        _ => None,
    };

    let schema = ResolvedSchema {
        geography,
        town: first_present(headers, TOWN),
        springs,
        network,
        source_mix,
    };
    debug!("Resolved schema: {:?}", schema);
    schema
}
