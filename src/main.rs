// Entry point and console flow for the water-resources dashboard.
//
// - Option [1] loads and cleans the CSV, printing diagnostics.
// - Option [2] walks through the filters and builds a new view config.
// - Option [3] computes both charts' data, exports them and prints previews.
mod aggregate;
mod config;
mod error;
mod geography;
mod loader;
mod output;
mod ranking;
mod reports;
mod schema;
mod taxonomy;
mod types;
mod util;

use config::{ProfileFilter, SortSpec, SpringSortKey, SpringsScale, ViewConfig};
use log::{info, LevelFilter};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use taxonomy::Taxonomy;
use types::{AreaProfile, Category, GroupLevel, ShareFamily};

const DATA_PATH: &str = "water_resources.csv";
const TAXONOMY_PATH: &str = "taxonomy.json";

// Only the raw CSV is memoized (inside `loader`); the state here is the
// current view config and the taxonomy in use.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        loaded: false,
        taxonomy: None,
        config: ViewConfig::default(),
    })
});

static LOGGER: OnceLock<()> = OnceLock::new();

struct AppState {
    loaded: bool,
    taxonomy: Option<Taxonomy>,
    config: ViewConfig,
}

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if std::env::var("RUST_LOG").is_err() {
            builder.filter_module("water_dashboard", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

fn state() -> std::sync::MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Offer a numbered list; blank input keeps the current value (`None`).
fn choose<T: Copy>(title: &str, options: &[(&str, T)]) -> Option<T> {
    println!("{}", title);
    for (i, (label, _)) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, label);
    }
    loop {
        let input = read_line("Enter choice (blank keeps current): ");
        if input.is_empty() {
            return None;
        }
        match input.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Some(options[n - 1].1),
            _ => println!("Invalid choice. Please enter 1-{}.", options.len()),
        }
    }
}

fn ask_yes_no(prompt: &str) -> Option<bool> {
    loop {
        match read_line(prompt).to_uppercase().as_str() {
            "" => return None,
            "Y" => return Some(true),
            "N" => return Some(false),
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn ask_top_n(current: usize) -> usize {
    loop {
        let input = read_line(&format!("Show top-N areas after sort [{}]: ", current));
        if input.is_empty() {
            return current;
        }
        match input.parse::<usize>() {
            Ok(n) if n >= 1 => return n,
            _ => println!("Invalid number. Please enter a whole number >= 1."),
        }
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        if let Some(answer) = ask_yes_no("Back to main menu (Y/N): ") {
            return answer;
        }
    }
}

fn current_taxonomy() -> error::Result<Taxonomy> {
    if let Some(tax) = state().taxonomy.clone() {
        return Ok(tax);
    }
    let tax = if Path::new(TAXONOMY_PATH).exists() {
        info!("Using taxonomy overrides from {}", TAXONOMY_PATH);
        Taxonomy::from_json_path(TAXONOMY_PATH)?
    } else {
        Taxonomy::builtin()?
    };
    state().taxonomy = Some(tax.clone());
    Ok(tax)
}

/// Handle option [1]: load and clean the CSV file.
fn handle_load() {
    let result = current_taxonomy().and_then(|tax| loader::load_and_clean(DATA_PATH, &tax));
    match result {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows loaded, {} with governorate/district geography)",
                util::format_int(report.total_rows),
                util::format_int(report.area_rows)
            );
            if report.other_rows > 0 {
                println!(
                    "Note: {} rows are neither governorate nor district and are excluded from area views.",
                    util::format_int(report.other_rows)
                );
            }
            let caps = data.capabilities;
            for (enabled, what) in [
                (caps.has_springs, "spring columns"),
                (caps.has_network_condition, "network condition columns"),
                (caps.has_source_mix, "water source columns"),
                (caps.has_town, "Town column"),
                (caps.has_district, "district names"),
            ] {
                if !enabled {
                    println!("Info: no {} in this CSV.", what);
                }
            }
            println!();
            state().loaded = true;
        }
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

/// Handle option [2]: step through every filter and store the new config.
fn handle_filters() {
    let Ok(tax) = current_taxonomy() else {
        println!("Error: taxonomy could not be loaded.\n");
        return;
    };
    let data = match loader::load_and_clean(DATA_PATH, &tax) {
        Ok((data, _)) => data,
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            return;
        }
    };
    let mut cfg = state().config.clone();

    if let Some(level) = choose(
        "Aggregate by",
        &[("Governorate", GroupLevel::Governorate), ("District", GroupLevel::District)],
    ) {
        cfg = cfg.with_group_level(level);
    }
    if let Some(profile) = choose(
        "Area profile (external)",
        &[
            ("All areas", ProfileFilter::All),
            ("Urban only", ProfileFilter::Only(AreaProfile::Urban)),
            ("Agriculture/Rural only", ProfileFilter::Only(AreaProfile::Agriculture)),
            ("Mixed only", ProfileFilter::Only(AreaProfile::Mixed)),
        ],
    ) {
        cfg = cfg.with_profile(profile);
    }

    let areas = reports::available_areas(&data, &cfg, &tax);
    println!("Available areas: {}", areas.join(", "));
    let picked = read_line("Areas to include (comma separated, blank for all): ");
    let selection: BTreeSet<String> = picked
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    cfg = cfg.with_areas(if selection.is_empty() { None } else { Some(selection) });

    if let Some(scale) = choose(
        "Springs scale",
        &[("Totals", SpringsScale::Totals), ("Per-town average", SpringsScale::PerTownAverage)],
    ) {
        cfg = cfg.with_springs_scale(scale);
    }

    let options: Vec<(&str, SpringSortKey)> =
        SpringSortKey::ALL.iter().map(|k| (k.label(), *k)).collect();
    let key = choose("Pyramid sorting", &options).unwrap_or(cfg.springs.key);
    let ascending = ask_yes_no("Ascending order (Y/N, blank keeps current): ")
        .unwrap_or(cfg.springs.ascending);
    let top_n = ask_top_n(cfg.springs.top_n);
    cfg = cfg.with_springs_sort(SortSpec { key, ascending, top_n });

    for (family, current) in [
        (ShareFamily::NetworkCondition, cfg.network),
        (ShareFamily::SourceMix, cfg.source_mix),
    ] {
        let options: Vec<(&str, Category)> =
            family.categories().iter().map(|c| (c.label(), *c)).collect();
        let title = match family {
            ShareFamily::NetworkCondition => "Network sorting",
            ShareFamily::SourceMix => "Water source sorting",
        };
        let key = choose(title, &options).unwrap_or(current.key);
        let ascending = ask_yes_no("Ascending (Y/N, blank keeps current): ").unwrap_or(current.ascending);
        let top_n = ask_top_n(current.top_n);
        cfg = cfg.with_share_sort(SortSpec { key, ascending, top_n });
    }

    info!("View config updated: {}", cfg.describe());
    state().config = cfg;
    println!();
}

/// Handle option [3]: compute, export and preview every available view.
fn handle_generate() -> error::Result<()> {
    let tax = current_taxonomy()?;
    let (data, _) = loader::load_and_clean(DATA_PATH, &tax)?;
    let cfg = state().config.clone();
    let dash = reports::build_dashboard(&data, &cfg, &tax)?;

    println!("Generating views...\n");
    for notice in &dash.notices {
        println!("Info: {}", notice);
    }

    match &dash.springs {
        Some(rows) => {
            let export = reports::spring_export_rows(rows, dash.springs_scale);
            output::write_csv("springs_view.csv", &export)?;
            println!("Permanent vs Seasonal Springs by {}", dash.group_level);
            println!("({}, sorted by {})\n", dash.springs_scale, cfg.springs.key.label());
            output::preview_table_rows(&export, cfg.springs.top_n);
            println!("(Full table exported to springs_view.csv)\n");
        }
        None => println!("Spring chart disabled for this CSV.\n"),
    }

    for (rows, family, file, title) in [
        (&dash.network, ShareFamily::NetworkCondition, "network_view.csv", "State of Water Network"),
        (&dash.source_mix, ShareFamily::SourceMix, "source_mix_view.csv", "Main Water Source"),
    ] {
        let Some(rows) = rows else { continue };
        output::write_share_csv(file, dash.group_level, family, rows)?;
        println!("{} by {} (100% shares)\n", title, dash.group_level);
        output::preview_share_rows(dash.group_level, rows, rows.len());
        println!("(Full table exported to {})\n", file);
    }

    let summary = reports::generate_summary(&data, &cfg, &tax, &dash)?;
    output::write_json("summary.json", &summary)?;
    if let Some(t) = &summary.largest_seasonal_dependence {
        println!(
            "Largest seasonal dependence: {} (gap = {}{}).\n",
            t.area,
            util::format_number(t.gap, 2),
            if dash.springs_scale == SpringsScale::PerTownAverage { " avg/town" } else { "" }
        );
    }
    Ok(())
}

fn main() {
    init_logging();
    loop {
        println!("Lebanon Water: Springs & Network");
        println!("[1] Load the file");
        println!("[2] Adjust filters");
        println!("[3] Generate views\n");
        match read_line("Enter choice: ").as_str() {
            "1" => handle_load(),
            "2" | "3" if !state().loaded => {
                println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
            }
            "2" => handle_filters(),
            "3" => {
                println!();
                if let Err(e) = handle_generate() {
                    eprintln!("Error: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
