// Ranking and top-N windowing.
//
// The window always keeps the N strongest rows (largest metric values),
// whatever the direction; `ascending` only changes the order in which the
// kept rows are presented. Rows whose metric is undefined rank below every
// defined row and are always presented last.
use crate::config::{SortSpec, SpringSortKey};
use crate::types::{Category, ShareRow, SpringRow};
use std::cmp::Ordering;

/// An aggregated row that can be ranked by some key.
pub trait Rankable {
    type Key: Copy;

    fn metric(&self, key: Self::Key) -> Option<f64>;
}

impl Rankable for SpringRow {
    type Key = SpringSortKey;

    fn metric(&self, key: SpringSortKey) -> Option<f64> {
        match key {
            SpringSortKey::Total => self.total(),
            SpringSortKey::Gap => self.gap(),
            SpringSortKey::Ratio => self.ratio(),
            SpringSortKey::SeasonalOnly => self.seasonal,
            SpringSortKey::PermanentOnly => self.permanent,
        }
    }
}

impl Rankable for ShareRow {
    type Key = Category;

    fn metric(&self, key: Category) -> Option<f64> {
        self.share(key)
    }
}

/// Stable-sort `rows` (assumed alphabetical, so ties stay alphabetical)
/// and keep the strongest `spec.top_n`, clamped to `[1, rows.len()]`.
pub fn rank_and_window<T: Rankable>(rows: Vec<T>, spec: &SortSpec<T::Key>) -> Vec<T> {
    let n = spec.top_n.max(1).min(rows.len());

    let mut defined: Vec<(f64, T)> = Vec::with_capacity(rows.len());
    let mut undefined: Vec<T> = Vec::new();
    for row in rows {
        match row.metric(spec.key) {
            Some(v) if !v.is_nan() => defined.push((v, row)),
            _ => undefined.push(row),
        }
    }

    defined.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    let undefined_kept = n.saturating_sub(defined.len());
    defined.truncate(n);

    if spec.ascending {
        defined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    }

    defined
        .into_iter()
        .map(|(_, row)| row)
        .chain(undefined.into_iter().take(undefined_kept))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShareFamily;
    use proptest::prelude::*;

    fn spring(name: &str, perm: f64, seas: f64) -> SpringRow {
        SpringRow {
            area_name: name.to_string(),
            permanent: Some(perm),
            seasonal: Some(seas),
            towns: None,
        }
    }

    fn names<T>(rows: &[T], f: impl Fn(&T) -> &str) -> Vec<String> {
        rows.iter().map(|r| f(r).to_string()).collect()
    }

    fn spec(key: SpringSortKey, ascending: bool, top_n: usize) -> SortSpec<SpringSortKey> {
        SortSpec { key, ascending, top_n }
    }

    #[test]
    fn gap_descending_top_one_keeps_largest_gap() {
        let rows = vec![spring("A", 10.0, 40.0), spring("B", 30.0, 30.0)];
        let out = rank_and_window(rows, &spec(SpringSortKey::Gap, false, 1));
        assert_eq!(names(&out, |r| r.area_name.as_str()), vec!["A"]);
    }

    #[test]
    fn ascending_keeps_strongest_but_reverses_presentation() {
        let rows = vec![
            spring("A", 1.0, 0.0),
            spring("B", 3.0, 0.0),
            spring("C", 2.0, 0.0),
            spring("D", 4.0, 0.0),
        ];
        let desc = rank_and_window(rows.clone(), &spec(SpringSortKey::PermanentOnly, false, 3));
        assert_eq!(names(&desc, |r| r.area_name.as_str()), vec!["D", "B", "C"]);
        let asc = rank_and_window(rows, &spec(SpringSortKey::PermanentOnly, true, 3));
        assert_eq!(names(&asc, |r| r.area_name.as_str()), vec!["C", "B", "D"]);
    }

    #[test]
    fn ties_stay_alphabetical() {
        let rows = vec![spring("A", 1.0, 1.0), spring("B", 1.0, 1.0), spring("C", 2.0, 2.0)];
        let out = rank_and_window(rows.clone(), &spec(SpringSortKey::Total, false, 3));
        assert_eq!(names(&out, |r| r.area_name.as_str()), vec!["C", "A", "B"]);
        let out = rank_and_window(rows, &spec(SpringSortKey::Total, true, 3));
        assert_eq!(names(&out, |r| r.area_name.as_str()), vec!["A", "B", "C"]);
    }

    #[test]
    fn undefined_ratio_sorts_last() {
        let rows = vec![spring("A", 0.0, 5.0), spring("B", 2.0, 4.0), spring("C", 1.0, 3.0)];
        let out = rank_and_window(rows.clone(), &spec(SpringSortKey::Ratio, true, 10));
        assert_eq!(names(&out, |r| r.area_name.as_str()), vec!["B", "C", "A"]);
        let out = rank_and_window(rows, &spec(SpringSortKey::Ratio, false, 2));
        assert_eq!(names(&out, |r| r.area_name.as_str()), vec!["C", "B"]);
    }

    #[test]
    fn window_clamps_to_row_count() {
        let rows = vec![spring("A", 1.0, 1.0), spring("B", 2.0, 2.0)];
        assert_eq!(rank_and_window(rows.clone(), &spec(SpringSortKey::Total, false, 50)).len(), 2);
        assert_eq!(rank_and_window(rows, &spec(SpringSortKey::Total, false, 0)).len(), 1);
        assert!(rank_and_window(Vec::<SpringRow>::new(), &spec(SpringSortKey::Total, false, 5)).is_empty());
    }

    #[test]
    fn share_rows_rank_by_category() {
        let share = |name: &str, good: f64| ShareRow {
            area_name: name.to_string(),
            family: ShareFamily::NetworkCondition,
            shares: vec![(Category::Good, good), (Category::Acceptable, 0.0), (Category::Bad, 100.0 - good)],
        };
        let rows = vec![share("A", 20.0), share("B", 80.0), share("C", 50.0)];
        let out = rank_and_window(rows, &SortSpec { key: Category::Bad, ascending: false, top_n: 2 });
        assert_eq!(names(&out, |r| r.area_name.as_str()), vec!["A", "C"]);
    }

    proptest! {
        #[test]
        fn window_size_and_determinism(
            values in proptest::collection::vec((0u32..50, 0u32..50), 0..20),
            top_n in 0usize..30,
            ascending in any::<bool>(),
        ) {
            let rows: Vec<SpringRow> = values
                .iter()
                .enumerate()
                .map(|(i, (p, s))| spring(&format!("{i:02}"), *p as f64, *s as f64))
                .collect();
            let spec = spec(SpringSortKey::Ratio, ascending, top_n);
            let first = rank_and_window(rows.clone(), &spec);
            let second = rank_and_window(rows.clone(), &spec);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.len() <= rows.len());
            prop_assert!(first.len() >= top_n.min(rows.len()));
        }
    }
}
