use crate::taxonomy::Taxonomy;
use crate::types::AreaType;
use crate::util::clean_label;

/// Governorate/district labels for one row, before any record cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geography {
    pub area_name: String,
    pub area_type: AreaType,
    pub governorate: Option<String>,
    pub district: Option<String>,
}

/// Split a composite identifier like `Akkar_Governorate` or
/// `West_Bekaa_District` into a display name and area type.
///
/// Identifiers without either suffix are `Other` and keep their full text.
pub fn parse_ref_area(raw: &str) -> Option<(String, AreaType)> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let (prefix, area_type) = if let Some(p) = s.strip_suffix("_Governorate") {
        (p, AreaType::Governorate)
    } else if let Some(p) = s.strip_suffix("_District") {
        (p, AreaType::District)
    } else {
        (s, AreaType::Other)
    };
    let name = prefix.replace('_', " ").trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some((name, area_type))
}

/// Geography from direct `GovernorateName` / `DistrictName` cells.
///
/// The row is typed by its finest populated level.
pub fn from_direct(
    governorate: Option<&str>,
    district: Option<&str>,
    taxonomy: &Taxonomy,
) -> Geography {
    let governorate = clean_label(governorate).map(|g| taxonomy.governorate_aliases.apply(&g));
    let district = clean_label(district).map(|d| taxonomy.district_aliases.apply(&d));
    let (area_name, area_type) = match (&governorate, &district) {
        (_, Some(d)) => (d.clone(), AreaType::District),
        (Some(g), None) => (g.clone(), AreaType::Governorate),
        (None, None) => (String::new(), AreaType::Other),
    };
    Geography { area_name, area_type, governorate, district }
}

/// Geography from a composite `refArea` cell.
pub fn from_ref_area(ref_area: Option<&str>, taxonomy: &Taxonomy) -> Geography {
    match ref_area.and_then(parse_ref_area) {
        Some((name, AreaType::Governorate)) => {
            let name = taxonomy.governorate_aliases.apply(&name);
            Geography {
                area_name: name.clone(),
                area_type: AreaType::Governorate,
                governorate: Some(name),
                district: None,
            }
        }
        Some((name, AreaType::District)) => {
            let name = taxonomy.district_aliases.apply(&name);
            Geography {
                area_name: name.clone(),
                area_type: AreaType::District,
                governorate: None,
                district: Some(name),
            }
        }
        Some((name, AreaType::Other)) => Geography {
            area_name: name,
            area_type: AreaType::Other,
            governorate: None,
            district: None,
        },
        None => Geography {
            area_name: String::new(),
            area_type: AreaType::Other,
            governorate: None,
            district: None,
        },
    }
}
