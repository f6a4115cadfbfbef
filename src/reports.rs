use crate::aggregate::{aggregate_shares, aggregate_springs};
use crate::config::{SpringsScale, ViewConfig};
use crate::error::{AppError, Result};
use crate::loader::Dataset;
use crate::ranking::rank_and_window;
use crate::taxonomy::Taxonomy;
use crate::types::{
    CanonicalRecord, GroupLevel, ShareFamily, ShareRow, SpringExportRow, SpringRow, SummaryStats,
    Takeaway,
};
use crate::util::format_optional;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fmt;

/// A view or input feature that could not be produced for this CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SpringsUnavailable,
    NetworkConditionUnavailable,
    SourceMixUnavailable,
    TownCountUnavailable,
    DistrictLevelUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Notice::SpringsUnavailable => "Spring columns not found; spring chart disabled",
            Notice::NetworkConditionUnavailable => {
                "Network condition columns not found; network chart disabled"
            }
            Notice::SourceMixUnavailable => "Water source columns not found; source mix chart disabled",
            Notice::TownCountUnavailable => "No Town column; showing totals instead of per-town averages",
            Notice::DistrictLevelUnavailable => "No district data; falling back to Governorate",
        };
        f.write_str(msg)
    }
}

/// Everything the presentation layer needs for one configuration.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub group_level: GroupLevel,
    pub springs_scale: SpringsScale,
    pub records_in_scope: usize,
    pub areas_in_scope: usize,
    pub springs: Option<Vec<SpringRow>>,
    pub network: Option<Vec<ShareRow>>,
    pub source_mix: Option<Vec<ShareRow>>,
    pub notices: Vec<Notice>,
}

/// Level actually used for grouping, plus a notice when the request had to
/// fall back.
pub fn effective_level(data: &Dataset, requested: GroupLevel) -> (GroupLevel, Option<Notice>) {
    // `has_district` is set from the cleaned rows, not the header.
    if requested == GroupLevel::District && !data.capabilities.has_district {
        warn!("No district data in this CSV; falling back to Governorate");
        return (GroupLevel::Governorate, Some(Notice::DistrictLevelUnavailable));
    }
    (requested, None)
}

fn profile_scoped<'a>(
    data: &'a Dataset,
    level: GroupLevel,
    cfg: &ViewConfig,
    taxonomy: &Taxonomy,
) -> Vec<(&'a str, &'a CanonicalRecord)> {
    data.records
        .iter()
        .filter_map(|r| {
            // Rows with no name at this level (e.g. `Other` rows) never enter a view.
            let area = r.area_at(level)?;
            cfg.profile
                .accepts(taxonomy.profile(level, area))
                .then_some((area, r))
        })
        .collect()
}

/// Area names selectable at the effective level after the profile filter.
pub fn available_areas(data: &Dataset, cfg: &ViewConfig, taxonomy: &Taxonomy) -> Vec<String> {
    let (level, _) = effective_level(data, cfg.group_level);
    profile_scoped(data, level, cfg, taxonomy)
        .into_iter()
        .map(|(area, _)| area.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Records that survive the profile and area filters.
///
/// An empty result is fatal: there is nothing to chart.
pub fn filter_records<'a>(
    data: &'a Dataset,
    level: GroupLevel,
    cfg: &ViewConfig,
    taxonomy: &Taxonomy,
) -> Result<Vec<&'a CanonicalRecord>> {
    let selected: Vec<&CanonicalRecord> = profile_scoped(data, level, cfg, taxonomy)
        .into_iter()
        // `None` means every area is selected.
        .filter(|(area, _)| cfg.areas.as_ref().map_or(true, |set| set.contains(*area)))
        .map(|(_, r)| r)
        .collect();
    if selected.is_empty() {
        return Err(AppError::NoRowsAfterFilters { filters: cfg.describe() });
    }
    debug!("{} records in scope for {}", selected.len(), cfg.describe());
    Ok(selected)
}

/// Run the whole filter -> aggregate -> rank -> window pipeline.
pub fn build_dashboard(data: &Dataset, cfg: &ViewConfig, taxonomy: &Taxonomy) -> Result<Dashboard> {
    let caps = data.capabilities;
    let mut notices = Vec::new();
    let (level, fallback) = effective_level(data, cfg.group_level);
    notices.extend(fallback);

    let records = filter_records(data, level, cfg, taxonomy)?;
    // Counted before windowing so it reflects the filters, not top N.
    let areas_in_scope = records
        .iter()
        .filter_map(|r| r.area_at(level))
        .collect::<BTreeSet<_>>()
        .len();

    // Each view degrades on its own; a missing family only adds a notice.
    let springs = if caps.has_springs {
        if cfg.springs_scale == SpringsScale::PerTownAverage && !caps.has_town {
            notices.push(Notice::TownCountUnavailable);
        }
        let rows = aggregate_springs(&records, level, cfg.springs_scale, caps.has_town);
        Some(rank_and_window(rows, &cfg.springs))
    } else {
        notices.push(Notice::SpringsUnavailable);
        None
    };

    let network = if caps.has_network_condition {
        let rows = aggregate_shares(&records, level, ShareFamily::NetworkCondition);
        Some(rank_and_window(rows, &cfg.network))
    } else {
        notices.push(Notice::NetworkConditionUnavailable);
        None
    };

    let source_mix = if caps.has_source_mix {
        let rows = aggregate_shares(&records, level, ShareFamily::SourceMix);
        Some(rank_and_window(rows, &cfg.source_mix))
    } else {
        notices.push(Notice::SourceMixUnavailable);
        None
    };

    // Report the scale that was actually applied.
    let springs_scale = if caps.has_town {
        cfg.springs_scale
    } else {
        SpringsScale::Totals
    };

    Ok(Dashboard {
        group_level: level,
        springs_scale,
        records_in_scope: records.len(),
        areas_in_scope,
        springs,
        network,
        source_mix,
        notices,
    })
}

/// Area with the largest seasonal-minus-permanent gap among the shown rows.
/// Ties go to the row presented first.
pub fn largest_seasonal_dependence(rows: &[SpringRow]) -> Option<Takeaway> {
    let mut best: Option<Takeaway> = None;
    for row in rows {
        let Some(gap) = row.gap() else { continue };
        if best.as_ref().map_or(true, |b| gap > b.gap) {
            best = Some(Takeaway { area: row.area_name.clone(), gap });
        }
    }
    best
}

pub fn spring_export_rows(rows: &[SpringRow], scale: SpringsScale) -> Vec<SpringExportRow> {
    let decimals = match scale {
        SpringsScale::Totals => 0,
        SpringsScale::PerTownAverage => 2,
    };
    rows.iter()
        .map(|r| SpringExportRow {
            area_name: r.area_name.clone(),
            permanent_value: format_optional(r.permanent, decimals),
            seasonal_value: format_optional(r.seasonal, decimals),
            gap: format_optional(r.gap(), 2),
            ratio: format_optional(r.ratio(), 2),
            towns: r.towns.map(|t| t.to_string()).unwrap_or_default(),
        })
        .collect()
}

pub fn generate_summary(
    data: &Dataset,
    cfg: &ViewConfig,
    taxonomy: &Taxonomy,
    dash: &Dashboard,
) -> Result<SummaryStats> {
    // Totals cover every filtered record, not just the windowed rows.
    let records = filter_records(data, dash.group_level, cfg, taxonomy)?;
    let total_permanent_springs = records.iter().map(|r| r.permanent_springs).sum();
    let total_seasonal_springs = records.iter().map(|r| r.seasonal_springs).sum();
    Ok(SummaryStats {
        group_level: dash.group_level,
        springs_scale: dash.springs_scale.to_string(),
        records_in_scope: dash.records_in_scope,
        areas_in_scope: dash.areas_in_scope,
        total_permanent_springs,
        total_seasonal_springs,
        largest_seasonal_dependence: dash
            .springs
            .as_deref()
            .and_then(largest_seasonal_dependence),
        unavailable: dash.notices.iter().map(|n| n.to_string()).collect(),
    })
}
