use crate::error::Result;
use crate::types::{GroupLevel, ShareFamily, ShareRow};
use crate::util::format_number;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn share_header(level: GroupLevel, family: ShareFamily) -> Vec<String> {
    std::iter::once(level.to_string())
        .chain(family.categories().iter().map(|c| c.label().to_string()))
        .collect()
}

// Cells follow the row's own family order so they always line up with
// `share_header`; a category the row lacks is left blank.
fn share_cells(row: &ShareRow) -> Vec<String> {
    std::iter::once(row.area_name.clone())
        .chain(
            row.family
                .categories()
                .iter()
                .map(|c| row.share(*c).map(|v| format_number(v, 1)).unwrap_or_default()),
        )
        .collect()
}

/// Share rows have one column per category, so the header is built from
/// the family rather than a derived struct.
pub fn write_share_csv<P: AsRef<Path>>(
    path: P,
    level: GroupLevel,
    family: ShareFamily,
    rows: &[ShareRow],
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    // The header is written even when no area survived the filters.
    wtr.write_record(share_header(level, family))?;
    for r in rows.iter().filter(|r| r.family == family) {
        wtr.write_record(share_cells(r))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn preview_share_rows(level: GroupLevel, rows: &[ShareRow], max_rows: usize) {
    let Some(first) = rows.first() else {
        println!("(no rows)\n");
        return;
    };
    let mut builder = Builder::default();
    builder.push_record(share_header(level, first.family));
    for r in rows.iter().take(max_rows) {
        builder.push_record(share_cells(r));
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    println!("{}\n", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn share_csv_has_family_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.csv");
        let rows = vec![ShareRow {
            area_name: "Akkar".into(),
            family: ShareFamily::NetworkCondition,
            shares: vec![(Category::Good, 25.0), (Category::Acceptable, 25.0), (Category::Bad, 50.0)],
        }];
        write_share_csv(&path, GroupLevel::Governorate, ShareFamily::NetworkCondition, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Governorate,Good %,Acceptable %,Bad %"));
        assert_eq!(lines.next(), Some("Akkar,25.0,25.0,50.0"));
    }

    #[test]
    fn share_cells_follow_row_family() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source_mix.csv");
        let rows = vec![
            ShareRow {
                area_name: "Zgharta".into(),
                family: ShareFamily::SourceMix,
                shares: vec![
                    (Category::Other, 10.0),
                    (Category::Public, 60.0),
                    (Category::WaterPoint, 10.0),
                    (Category::Well, 20.0),
                ],
            },
            ShareRow {
                area_name: "Akkar".into(),
                family: ShareFamily::NetworkCondition,
                shares: vec![(Category::Good, 100.0), (Category::Acceptable, 0.0), (Category::Bad, 0.0)],
            },
        ];
        write_share_csv(&path, GroupLevel::District, ShareFamily::SourceMix, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "District,Public network %,Well %,Gallons %,Water point %,Other %",
                "Zgharta,60.0,20.0,,10.0,10.0",
            ]
        );
    }

    #[test]
    fn json_summary_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &serde_json::json!({"areas": 3})).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["areas"], 3);
    }
}
