use crate::error::{AppError, Result};
use crate::geography::{self, Geography};
use crate::schema::{self, Capabilities, GeographySource, ResolvedSchema};
use crate::taxonomy::Taxonomy;
use crate::types::{AreaType, CanonicalRecord, NetworkCondition, SourceMix};
use crate::util::{clean_label, parse_count};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The CSV exactly as read: trimmed headers plus untouched records.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

/// Cleaned records plus what the header made available.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<CanonicalRecord>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub area_rows: usize,
    pub other_rows: usize,
}

// Raw tables keyed by path; the source file is static for the process lifetime.
static RAW_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<RawTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub fn read_raw<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::EmptyInput { path: path.display().to_string() });
    }
    let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(RawTable { headers, rows })
}

/// Read `path` once and hand out the same table on later calls.
pub fn load_cached<P: AsRef<Path>>(path: P) -> Result<Arc<RawTable>> {
    let key = path.as_ref().to_path_buf();
    {
        let cache = RAW_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(table) = cache.get(&key) {
            debug!("Raw table cache hit for {}", key.display());
            return Ok(Arc::clone(table));
        }
    }
    let table = Arc::new(read_raw(&key)?);
    let mut cache = RAW_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    Ok(Arc::clone(cache.entry(key).or_insert(table)))
}

/// Resolve columns, derive geography and coerce numbers for every row.
///
/// Only missing geography is fatal; other absent families show up as
/// `false` capabilities.
pub fn clean(raw: &RawTable, taxonomy: &Taxonomy) -> Result<(Dataset, LoadReport)> {
    let resolved = schema::resolve(&raw.headers);
    let Some(geo_source) = resolved.geography else {
        return Err(AppError::MissingGeography);
    };
    let mut capabilities = resolved.capabilities();
    if !capabilities.has_springs {
        warn!("Spring columns (permanent/seasonal) not found; spring view disabled");
    }
    if !capabilities.has_network_condition {
        warn!("Network condition columns not found; network view disabled");
    }
    if !capabilities.has_source_mix {
        debug!("Source mix columns not found; source mix view disabled");
    }

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut other_rows = 0usize;
    for (i, row) in raw.rows.iter().enumerate() {
        let geo = derive_geography(row, geo_source, taxonomy);
        let record = to_record(row, geo, &resolved);
        // Rows like a national total keep their name but never join a group.
        if record.area_type == AreaType::Other {
            debug!("Row {} ('{}') is neither a governorate nor a district", i + 1, record.area_name);
            other_rows += 1;
        }
        records.push(record);
    }

    // A `refArea` column or a `DistrictName` header only says districts *could*
    // be present; the District level is usable only if some row names one.
    capabilities.has_district = records.iter().any(|r| r.district.is_some());
    if !capabilities.has_district {
        warn!("No row names a district; District grouping will fall back to Governorate");
    }

    let report = LoadReport {
        total_rows: raw.rows.len(),
        area_rows: records.len() - other_rows,
        other_rows,
    };
    Ok((Dataset { records, capabilities }, report))
}

/// Convenience for callers that only want the cleaned dataset.
pub fn load_and_clean<P: AsRef<Path>>(path: P, taxonomy: &Taxonomy) -> Result<(Dataset, LoadReport)> {
    let raw = load_cached(path)?;
    clean(&raw, taxonomy)
}

fn derive_geography(row: &StringRecord, source: GeographySource, taxonomy: &Taxonomy) -> Geography {
    match source {
        GeographySource::Direct { governorate, district } => geography::from_direct(
            row.get(governorate),
            district.and_then(|i| row.get(i)),
            taxonomy,
        ),
        GeographySource::RefArea(idx) => geography::from_ref_area(row.get(idx), taxonomy),
    }
}

fn to_record(row: &StringRecord, geo: Geography, resolved: &ResolvedSchema) -> CanonicalRecord {
    // `row.get` is `None` past the end of a short (flexible) row, which
    // `parse_count` turns into 0 like any other blank cell.
    let count = |idx: usize| parse_count(row.get(idx));
    let (permanent_springs, seasonal_springs) = match resolved.springs {
        Some(cols) => (count(cols.permanent), count(cols.seasonal)),
        None => (0.0, 0.0),
    };
    let network = resolved.network.map(|cols| NetworkCondition {
        good: count(cols.good),
        acceptable: count(cols.acceptable),
        bad: count(cols.bad),
    });
    let source_mix = resolved.source_mix.map(|cols| SourceMix {
        public: count(cols.public),
        well: count(cols.well),
        gallons: count(cols.gallons),
        water_point: count(cols.water_point),
        other: count(cols.other),
    });
    CanonicalRecord {
        area_name: geo.area_name,
        area_type: geo.area_type,
        governorate: geo.governorate,
        district: geo.district,
        town: resolved.town.and_then(|idx| clean_label(row.get(idx))),
        permanent_springs,
        seasonal_springs,
        network,
        source_mix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        }
    }

    #[test]
    fn loads_ref_area_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "water.csv",
            " refArea ,Town,Total number of permanent water springs,Total number of seasonal water springs\n\
             Akkar_Governorate,  Qobayat ,10,40\n\
             Zahle_District,Zahle,abc,-2\n\
             Lebanon,,1,1\n",
        );
        let tax = Taxonomy::builtin().unwrap();
        let (data, report) = load_and_clean(&path, &tax).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.other_rows, 1);
        assert_eq!(report.area_rows, 2);

        let akkar = &data.records[0];
        assert_eq!(akkar.area_name, "Akkar");
        assert_eq!(akkar.area_type, AreaType::Governorate);
        assert_eq!(akkar.town.as_deref(), Some("Qobayat"));
        assert_eq!((akkar.permanent_springs, akkar.seasonal_springs), (10.0, 40.0));

        let zahleh = &data.records[1];
        assert_eq!(zahleh.district.as_deref(), Some("Zahleh"));
        assert_eq!((zahleh.permanent_springs, zahleh.seasonal_springs), (0.0, 0.0));
        assert!(data.capabilities.has_springs);
        assert!(!data.capabilities.has_network_condition);
    }

    #[test]
    fn cached_load_returns_same_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "cached.csv", "refArea,Permanent,Seasonal\nAkkar_Governorate,1,2\n");
        let first = load_cached(&path).unwrap();
        let second = load_cached(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cached(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, AppError::Csv(_) | AppError::Io(_)));
    }

    #[test]
    fn missing_geography_is_fatal() {
        let raw = table(&["Town", "Permanent", "Seasonal"], &[&["x", "1", "2"]]);
        let err = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::MissingGeography));
    }

    #[test]
    fn missing_springs_only_degrades() {
        let raw = table(&["GovernorateName", "Good", "Acceptable", "Bad"], &[&["Beqaa", "5", "3", "2"]]);
        let (data, _) = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap();
        assert!(!data.capabilities.has_springs);
        assert!(data.capabilities.has_network_condition);
        let rec = &data.records[0];
        assert_eq!(rec.governorate.as_deref(), Some("Bekaa"));
        assert_eq!(rec.permanent_springs, 0.0);
        assert_eq!(rec.network, Some(NetworkCondition { good: 5.0, acceptable: 3.0, bad: 2.0 }));
    }

    #[test]
    fn governorate_only_ref_area_has_no_district_level() {
        let raw = table(
            &["refArea", "Permanent", "Seasonal"],
            &[&["Akkar_Governorate", "1", "2"], &["Beirut_Governorate", "3", "4"]],
        );
        let (data, _) = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap();
        assert!(!data.capabilities.has_district);
    }

    #[test]
    fn blank_district_column_has_no_district_level() {
        let raw = table(
            &["GovernorateName", "DistrictName", "Permanent", "Seasonal"],
            &[&["Akkar", "  ", "1", "2"], &["Beirut", "", "3", "4"]],
        );
        let (data, _) = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap();
        assert!(!data.capabilities.has_district);

        let raw = table(
            &["GovernorateName", "DistrictName", "Permanent", "Seasonal"],
            &[&["Akkar", "", "1", "2"], &["North", "Koura", "3", "4"]],
        );
        let (data, _) = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap();
        assert!(data.capabilities.has_district);
    }

    #[test]
    fn loads_source_mix_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "sources.csv",
            "refArea,Main source of drinking water - public network,Main source of drinking water - well,\
             Main source of drinking water - gallons,Main source of drinking water - water point,\
             Main source of drinking water - other\n\
             Akkar_Governorate,60,20,10,5,5\n\
             Zgharta_District,\"1,200\",x,,300,0\n",
        );
        let tax = Taxonomy::builtin().unwrap();
        let (data, _) = load_and_clean(&path, &tax).unwrap();
        assert!(data.capabilities.has_source_mix);
        assert!(!data.capabilities.has_springs);
        assert_eq!(
            data.records[0].source_mix,
            Some(SourceMix { public: 60.0, well: 20.0, gallons: 10.0, water_point: 5.0, other: 5.0 })
        );
        assert_eq!(
            data.records[1].source_mix,
            Some(SourceMix { public: 1200.0, well: 0.0, gallons: 0.0, water_point: 300.0, other: 0.0 })
        );
    }

    #[test]
    fn short_rows_default_to_zero() {
        let raw = table(&["refArea", "Permanent", "Seasonal"], &[&["Akkar_Governorate"]]);
        let (data, _) = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap();
        assert_eq!(data.records[0].permanent_springs, 0.0);
        assert_eq!(data.records[0].seasonal_springs, 0.0);
    }

    proptest! {
        #[test]
        fn cleaned_numbers_are_never_negative(
            cells in proptest::collection::vec("[-0-9.,a-z% ]{0,8}", 8)
        ) {
            let headers = ["refArea", "Permanent", "Seasonal", "Good", "Acceptable", "Bad", "Town", "Public"];
            let mut row: Vec<&str> = vec!["Akkar_Governorate"];
            row.extend(cells.iter().skip(1).map(|s| s.as_str()));
            let raw = table(&headers, &[row.as_slice()]);
            let (data, _) = clean(&raw, &Taxonomy::builtin().unwrap()).unwrap();
            let rec = &data.records[0];
            prop_assert!(rec.permanent_springs >= 0.0 && rec.permanent_springs.is_finite());
            prop_assert!(rec.seasonal_springs >= 0.0 && rec.seasonal_springs.is_finite());
            let net = rec.network.unwrap();
            for v in [net.good, net.acceptable, net.bad] {
                prop_assert!(v >= 0.0 && v.is_finite());
            }
        }
    }
}
