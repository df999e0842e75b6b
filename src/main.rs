use std::path::PathBuf;

use anyhow::{Context, Result};

use footlens::data::cache;
use footlens::data::filter::FilterSelection;
use footlens::views;

const DEFAULT_INPUT: &str = "player_injuries_impact.csv";

/// Load the injury table named on the command line (or the default path),
/// compose the dashboard with no filters applied, and emit the full payload
/// as JSON for the display layer.
///
/// A missing or unreadable input file is the only fatal error; everything
/// else degrades to nulls and placeholders inside the payload.
fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

    let dataset = cache::load_cached(&path)?;

    let dashboard = views::compose(&dataset, &FilterSelection::default(), None);
    let payload = serde_json::json!({
        "table": &*dataset,
        "dashboard": dashboard,
    });

    let out = serde_json::to_string_pretty(&payload).context("serializing dashboard payload")?;
    println!("{out}");
    Ok(())
}
