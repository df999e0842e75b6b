use std::sync::Arc;

use crate::data::filter::{FilterSelection, filtered_indices};
use crate::data::model::InjuryDataset;
use crate::views::{self, Dashboard};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One interactive session over the shared dataset, independent of any
/// rendering.  The dataset is immutable; every interaction only moves the
/// selections and recomputes the visible index vector.
pub struct SessionState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Arc<InjuryDataset>>,

    /// Current filter selections.
    pub selection: FilterSelection,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Player chosen for the timeline chart; None = first player in the
    /// filtered subset.
    pub timeline_player: Option<String>,

    /// Status / error message surfaced to the display layer.
    pub status_message: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: FilterSelection::default(),
            visible_indices: Vec::new(),
            timeline_player: None,
            status_message: None,
        }
    }
}

impl SessionState {
    /// Ingest a loaded dataset and reset the selections.
    pub fn set_dataset(&mut self, dataset: Arc<InjuryDataset>) {
        self.selection = FilterSelection::default();
        self.visible_indices = (0..dataset.len()).collect();
        self.timeline_player = None;
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Recompute `visible_indices` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.selection);
        }
    }

    /// Toggle a single value in one dimension's selection.
    pub fn toggle_season(&mut self, season: &str) {
        toggle(&mut self.selection.seasons, season);
        self.refilter();
    }

    pub fn toggle_team(&mut self, team: &str) {
        toggle(&mut self.selection.teams, team);
        self.refilter();
    }

    pub fn toggle_player(&mut self, player: &str) {
        toggle(&mut self.selection.players, player);
        self.refilter();
    }

    /// Clear all selections (back to "no restriction" everywhere).
    pub fn clear_filters(&mut self) {
        self.selection = FilterSelection::default();
        self.refilter();
    }

    pub fn set_timeline_player(&mut self, player: Option<String>) {
        self.timeline_player = player;
    }

    /// Compose the dashboard payload for the current selections.
    pub fn dashboard(&self) -> Option<Dashboard> {
        let ds = self.dataset.as_ref()?;
        Some(views::compose_for_indices(
            ds,
            &self.visible_indices,
            self.timeline_player.as_deref(),
        ))
    }
}

fn toggle(set: &mut std::collections::BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::data::model::CellValue;
    use crate::data::pipeline::enrich;

    use super::*;

    fn dataset() -> Arc<InjuryDataset> {
        let row = |player: &str, team: &str| {
            let mut m = BTreeMap::new();
            m.insert("Name".to_string(), CellValue::String(player.to_string()));
            m.insert("Team Name".to_string(), CellValue::String(team.to_string()));
            m
        };
        Arc::new(enrich(vec![
            row("Saka", "Arsenal"),
            row("Mount", "Chelsea"),
        ]))
    }

    #[test]
    fn toggling_a_team_narrows_and_restores_the_subset() {
        let mut state = SessionState::default();
        state.set_dataset(dataset());
        assert_eq!(state.visible_indices, vec![0, 1]);

        state.toggle_team("Arsenal");
        assert_eq!(state.visible_indices, vec![0]);

        state.toggle_team("Arsenal");
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn dashboard_requires_a_dataset() {
        let state = SessionState::default();
        assert!(state.dashboard().is_none());

        let mut state = SessionState::default();
        state.set_dataset(dataset());
        let dash = state.dashboard().expect("dashboard should compose");
        assert_eq!(dash.summary.total_injuries, 2);
        assert_eq!(dash.summary.players_affected, 2);
    }
}
