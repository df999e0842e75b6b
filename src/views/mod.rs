//! View composition: filtered subset → summary scalars + chart-ready
//! projections.
//!
//! ```text
//!   InjuryDataset ──┬── filtered_indices(selection)
//!                   │
//!                   ▼
//!            visible subset
//!                   │
//!     ┌─────────────┼──────────────────────────────┐
//!     ▼             ▼                              ▼
//!  summary     five projections              leaderboard
//!  (scalars)   (bar / line / grid / scatter)  (grouped table)
//! ```
//!
//! Every projection returns [`ViewData`]: either the chart-ready rows or an
//! explicit unavailable signal the display layer renders as a placeholder.
//! Nothing here holds UI types; the output is plain records.

pub mod projections;

use serde::Serialize;

use crate::data::filter::{self, FilterOptions, FilterSelection, PLAYER_COLUMN, TEAM_COLUMN};
use crate::data::model::InjuryDataset;

pub use projections::{
    AgeImpactPoint, DropRow, FrequencyGrid, LeaderboardRow, Phase, TimelinePoint, TimelineView,
};

/// Calendar-ordered month names for the frequency grid.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Month name for a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get((month as usize).checked_sub(1)?).copied()
}

// ---------------------------------------------------------------------------
// ViewData – a projection or its placeholder
// ---------------------------------------------------------------------------

/// A chart projection that either produced data or degraded because its
/// source columns are absent (or empty after filtering).  The display layer
/// renders the reason string as a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewData<T> {
    Ready(T),
    Unavailable(String),
}

impl<T> ViewData<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ViewData::Unavailable(reason.into())
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewData::Ready(t) => Some(t),
            ViewData::Unavailable(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewData::Ready(_))
    }
}

// ---------------------------------------------------------------------------
// Summary scalars
// ---------------------------------------------------------------------------

/// High-level overview of the filtered subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_injuries: usize,
    pub players_affected: usize,
    pub teams_involved: usize,
    /// Mean performance drop index over non-null values; `None` if none.
    pub avg_performance_drop: Option<f64>,
}

pub fn summary(dataset: &InjuryDataset, visible: &[usize]) -> Summary {
    let distinct = |column: &str| {
        let mut values: Vec<&str> = visible
            .iter()
            .filter_map(|&i| dataset.records[i].text(column))
            .collect();
        values.sort_unstable();
        values.dedup();
        values.len()
    };

    let drops: Vec<f64> = visible
        .iter()
        .filter_map(|&i| dataset.records[i].derived.performance_drop_index.value())
        .collect();
    let avg_performance_drop = if drops.is_empty() {
        None
    } else {
        Some(drops.iter().sum::<f64>() / drops.len() as f64)
    };

    Summary {
        total_injuries: visible.len(),
        players_affected: distinct(PLAYER_COLUMN),
        teams_involved: distinct(TEAM_COLUMN),
        avg_performance_drop,
    }
}

// ---------------------------------------------------------------------------
// Dashboard – the full payload for the display layer
// ---------------------------------------------------------------------------

/// Everything one render pass needs: option lists, summary, and the five
/// chart projections.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub filter_options: FilterOptions,
    pub summary: Summary,
    pub top_drops: ViewData<Vec<DropRow>>,
    pub timeline: ViewData<TimelineView>,
    pub injury_frequency: ViewData<FrequencyGrid>,
    pub age_impact: ViewData<Vec<AgeImpactPoint>>,
    pub comeback_leaderboard: ViewData<Vec<LeaderboardRow>>,
}

/// Compose the dashboard for the current selections.
///
/// Filtering produces a fresh index vector; the dataset itself is shared and
/// never mutated.
pub fn compose(
    dataset: &InjuryDataset,
    selection: &FilterSelection,
    timeline_player: Option<&str>,
) -> Dashboard {
    let visible = filter::filtered_indices(dataset, selection);
    compose_for_indices(dataset, &visible, timeline_player)
}

/// Compose from an already-computed visible subset (used by the session
/// state, which caches its filter result).
pub fn compose_for_indices(
    dataset: &InjuryDataset,
    visible: &[usize],
    timeline_player: Option<&str>,
) -> Dashboard {
    Dashboard {
        filter_options: filter::filter_options(dataset),
        summary: summary(dataset, visible),
        top_drops: projections::top_drops(dataset, visible),
        timeline: projections::timeline(dataset, visible, timeline_player),
        injury_frequency: projections::frequency_grid(dataset, visible),
        age_impact: projections::age_impact(dataset, visible),
        comeback_leaderboard: projections::leaderboard(dataset, visible),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_calendar_ordered() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(13), None);
        assert_eq!(month_name(0), None);
    }

    #[test]
    fn view_data_serializes_with_status_tag() {
        let ready: ViewData<Vec<u32>> = ViewData::Ready(vec![1]);
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["status"], "ready");
        let gone: ViewData<Vec<u32>> = ViewData::unavailable("no Age column");
        let json = serde_json::to_value(&gone).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["data"], "no Age column");
    }
}
