use std::collections::BTreeSet;

use serde::Serialize;

use super::model::InjuryDataset;

pub const SEASON_COLUMN: &str = "Season";
pub const TEAM_COLUMN: &str = "Team";
pub const PLAYER_COLUMN: &str = "Player_Name";

// ---------------------------------------------------------------------------
// Filter selections: which values are chosen per dimension
// ---------------------------------------------------------------------------

/// Per-dimension selection state.
///
/// An empty set means "no restriction" for that dimension, not "exclude
/// everything"; a dimension whose column is absent from the dataset is a
/// no-op regardless of the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub seasons: BTreeSet<String>,
    pub teams: BTreeSet<String>,
    pub players: BTreeSet<String>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty() && self.teams.is_empty() && self.players.is_empty()
    }
}

/// Sorted distinct values offered for each filter dimension.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub seasons: Vec<String>,
    pub teams: Vec<String>,
    pub players: Vec<String>,
}

/// Build the filter option lists from the dataset's column indices.
pub fn filter_options(dataset: &InjuryDataset) -> FilterOptions {
    FilterOptions {
        seasons: dataset.distinct_text(SEASON_COLUMN),
        teams: dataset.distinct_text(TEAM_COLUMN),
        players: dataset.distinct_text(PLAYER_COLUMN),
    }
}

/// Return indices of records passing all active filters.
///
/// Logical AND across dimensions; within one dimension, OR across the
/// selected values.  A record with a null cell in an actively filtered
/// dimension does not pass that dimension.
pub fn filtered_indices(dataset: &InjuryDataset, selection: &FilterSelection) -> Vec<usize> {
    let dims: [(&str, &BTreeSet<String>); 3] = [
        (SEASON_COLUMN, &selection.seasons),
        (TEAM_COLUMN, &selection.teams),
        (PLAYER_COLUMN, &selection.players),
    ];

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            dims.iter().all(|(col, selected)| {
                if selected.is_empty() || !dataset.has_column(col) {
                    return true;
                }
                rec.text(col).is_some_and(|v| selected.contains(v))
            })
        })
        .map(|(i, _)| i)
        .collect()
}
