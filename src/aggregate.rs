use crate::config::SpringsScale;
use crate::types::{CanonicalRecord, GroupLevel, ShareFamily, ShareRow, SpringRow};
use crate::util::round_to;
use std::collections::{BTreeMap, BTreeSet};

/// Sum permanent/seasonal springs per area at `level`.
///
/// Groups come out in alphabetical order. Records without a name at `level`
/// are skipped. In per-town mode each sum is divided by the number of
/// distinct named towns in the group and rounded to 2 decimals; a group with
/// no named towns has undefined values. `has_town == false` falls back to
/// totals.
pub fn aggregate_springs(
    records: &[&CanonicalRecord],
    level: GroupLevel,
    scale: SpringsScale,
    has_town: bool,
) -> Vec<SpringRow> {
    #[derive(Default)]
    struct Acc<'a> {
        permanent: f64,
        seasonal: f64,
        towns: BTreeSet<&'a str>,
    }

    // BTreeMap keeps groups in alphabetical order without a separate sort.
    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in records {
        let Some(area) = r.area_at(level) else { continue };
        let e = map.entry(area).or_default();
        e.permanent += r.permanent_springs;
        e.seasonal += r.seasonal_springs;
        // Towns are counted once per group no matter how many rows name them.
        if let Some(town) = r.town.as_deref() {
            e.towns.insert(town);
        }
    }

    // Without a Town column there is nothing to divide by; show totals.
    let per_town = scale == SpringsScale::PerTownAverage && has_town;
    map.into_iter()
        .map(|(area, acc)| {
            if !per_town {
                return SpringRow {
                    area_name: area.to_string(),
                    permanent: Some(acc.permanent),
                    seasonal: Some(acc.seasonal),
                    towns: None,
                };
            }
            let towns = acc.towns.len();
            // 0 towns -> undefined rather than a division by zero.
            let per = |v: f64| (towns > 0).then(|| round_to(v / towns as f64, 2));
            SpringRow {
                area_name: area.to_string(),
                permanent: per(acc.permanent),
                seasonal: per(acc.seasonal),
                towns: Some(towns),
            }
        })
        .collect()
}

/// Sum each category of `family` per area and convert to percentage shares
/// rounded to 1 decimal. Areas whose category total is zero are dropped.
pub fn aggregate_shares(
    records: &[&CanonicalRecord],
    level: GroupLevel,
    family: ShareFamily,
) -> Vec<ShareRow> {
    let categories = family.categories();
    let mut map: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        let Some(area) = r.area_at(level) else { continue };
        // One slot per category, in `family.categories()` order.
        let sums = map
            .entry(area)
            .or_insert_with(|| vec![0.0; categories.len()]);
        for (slot, cat) in sums.iter_mut().zip(categories) {
            *slot += r.category_value(*cat);
        }
    }

    map.into_iter()
        .filter_map(|(area, sums)| {
            let total: f64 = sums.iter().sum();
            // No observations at all: a 0/0 share row would be meaningless.
            if total <= 0.0 {
                return None;
            }
            let shares = categories
                .iter()
                .zip(sums)
                .map(|(cat, v)| (*cat, round_to(v / total * 100.0, 1)))
                .collect();
            Some(ShareRow { area_name: area.to_string(), family, shares })
        })
        .collect()
}
