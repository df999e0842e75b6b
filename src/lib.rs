//! FootLens – injury impact analytics engine.
//!
//! Ingests a tabular dataset of football player injury records, derives
//! per-record impact metrics (rating change around the injury, team
//! goal-difference drop during the absence), and composes chart-ready
//! projections for a display layer: drop rankings, player timelines,
//! team-by-month frequency grids, age scatter data, and a comeback
//! leaderboard.

pub mod data;
pub mod state;
pub mod views;
