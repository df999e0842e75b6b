use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::data::filter::{PLAYER_COLUMN, SEASON_COLUMN, TEAM_COLUMN};
use crate::data::model::{InjuryDataset, InjuryRecord};

use super::{MONTH_NAMES, ViewData};

pub const AGE_COLUMN: &str = "Age";
pub const INJURY_COLUMN: &str = "Injury";

const TOP_DROPS_LIMIT: usize = 10;
const LEADERBOARD_LIMIT: usize = 15;

// ---------------------------------------------------------------------------
// 1. Bar chart – top injuries by team performance drop
// ---------------------------------------------------------------------------

/// One bar of the drop ranking, with hover context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropRow {
    pub player: String,
    pub team: Option<String>,
    pub season: Option<String>,
    pub injury: Option<String>,
    pub team_gd_before: Option<f64>,
    pub team_gd_missed: Option<f64>,
    pub performance_drop_index: f64,
}

/// The filtered subset ranked by performance drop, nulls excluded,
/// truncated to the top ten.
pub fn top_drops(dataset: &InjuryDataset, visible: &[usize]) -> ViewData<Vec<DropRow>> {
    if dataset.groups.gd_before.is_empty() || dataset.groups.gd_missed.is_empty() {
        return ViewData::unavailable("no goal-difference columns in the dataset");
    }
    if !dataset.has_column(PLAYER_COLUMN) {
        return ViewData::unavailable("player information not available in the dataset");
    }

    let mut rows: Vec<DropRow> = visible
        .iter()
        .filter_map(|&i| {
            let rec = &dataset.records[i];
            let drop = rec.derived.performance_drop_index.value()?;
            Some(DropRow {
                player: rec.text(PLAYER_COLUMN).unwrap_or_default().to_string(),
                team: owned_text(rec, TEAM_COLUMN),
                season: owned_text(rec, SEASON_COLUMN),
                injury: owned_text(rec, INJURY_COLUMN),
                team_gd_before: rec.derived.team_gd_before.value(),
                team_gd_missed: rec.derived.team_gd_missed.value(),
                performance_drop_index: drop,
            })
        })
        .collect();

    if rows.is_empty() {
        return ViewData::unavailable("no valid performance drop values in the current selection");
    }

    rows.sort_by(|a, b| b.performance_drop_index.total_cmp(&a.performance_drop_index));
    rows.truncate(TOP_DROPS_LIMIT);
    ViewData::Ready(rows)
}

// ---------------------------------------------------------------------------
// 2. Line chart – player performance timeline around injuries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    BeforeInjury,
    AfterInjury,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::BeforeInjury => write!(f, "Before injury"),
            Phase::AfterInjury => write!(f, "After injury"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub player: String,
    pub team: Option<String>,
    pub season: Option<String>,
    pub phase: Phase,
    pub avg_rating: f64,
}

/// Timeline for a single player: the points and which player was plotted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    pub player: String,
    pub points: Vec<TimelinePoint>,
}

/// Before/after rating points for one player.  When no player is requested,
/// the alphabetically first player of the subset is plotted, matching the
/// default selection the display layer offers.
pub fn timeline(
    dataset: &InjuryDataset,
    visible: &[usize],
    player: Option<&str>,
) -> ViewData<TimelineView> {
    if !dataset.has_column(PLAYER_COLUMN) {
        return ViewData::unavailable("player information not available in the dataset");
    }

    let chosen: String = match player {
        Some(p) => p.to_string(),
        None => {
            let mut players: Vec<&str> = visible
                .iter()
                .filter_map(|&i| dataset.records[i].text(PLAYER_COLUMN))
                .collect();
            players.sort_unstable();
            match players.first() {
                Some(p) => p.to_string(),
                None => return ViewData::unavailable("no players in the current selection"),
            }
        }
    };

    let records: Vec<&InjuryRecord> = visible
        .iter()
        .map(|&i| &dataset.records[i])
        .filter(|rec| rec.text(PLAYER_COLUMN) == Some(chosen.as_str()))
        .collect();

    // Before points for every spell, then after points: the line runs
    // before-then-after.
    let mut points = Vec::new();
    for rec in &records {
        if let Some(rating) = rec.derived.avg_rating_before.value() {
            points.push(timeline_point(rec, &chosen, Phase::BeforeInjury, rating));
        }
    }
    for rec in &records {
        if let Some(rating) = rec.derived.avg_rating_after.value() {
            points.push(timeline_point(rec, &chosen, Phase::AfterInjury, rating));
        }
    }

    if points.is_empty() {
        return ViewData::unavailable("no rating information available for this player");
    }
    ViewData::Ready(TimelineView {
        player: chosen,
        points,
    })
}

fn timeline_point(
    rec: &InjuryRecord,
    player: &str,
    phase: Phase,
    avg_rating: f64,
) -> TimelinePoint {
    TimelinePoint {
        player: player.to_string(),
        team: owned_text(rec, TEAM_COLUMN),
        season: owned_text(rec, SEASON_COLUMN),
        phase,
        avg_rating,
    }
}

// ---------------------------------------------------------------------------
// 3. Heatmap – injury frequency by team and calendar month
// ---------------------------------------------------------------------------

/// Team-by-month injury counts.  `counts[t][m]` pairs `teams[t]` with
/// `months[m]`; all twelve months appear in calendar order and missing
/// combinations hold zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyGrid {
    pub teams: Vec<String>,
    pub months: [&'static str; 12],
    pub counts: Vec<Vec<u32>>,
}

impl FrequencyGrid {
    /// Count for a (team, month-name) combination; zero when absent.
    pub fn count(&self, team: &str, month: &str) -> u32 {
        let Some(t) = self.teams.iter().position(|t| t == team) else {
            return 0;
        };
        let Some(m) = self.months.iter().position(|m| *m == month) else {
            return 0;
        };
        self.counts[t][m]
    }
}

/// Injury counts grouped by (team, injury month).  Records with a null
/// injury month stay in the dataset but contribute to no bucket.
pub fn frequency_grid(dataset: &InjuryDataset, visible: &[usize]) -> ViewData<FrequencyGrid> {
    if !dataset.has_column(TEAM_COLUMN) {
        return ViewData::unavailable("team information not available in the dataset");
    }

    let mut buckets: BTreeMap<String, [u32; 12]> = BTreeMap::new();
    for &i in visible {
        let rec = &dataset.records[i];
        let (Some(team), Some(month)) = (rec.text(TEAM_COLUMN), rec.derived.injury_month) else {
            continue;
        };
        buckets.entry(team.to_string()).or_insert([0; 12])[month as usize - 1] += 1;
    }

    if buckets.is_empty() {
        return ViewData::unavailable("no injury month data available");
    }

    let (teams, counts): (Vec<String>, Vec<Vec<u32>>) = buckets
        .into_iter()
        .map(|(team, row)| (team, row.to_vec()))
        .unzip();
    ViewData::Ready(FrequencyGrid {
        teams,
        months: MONTH_NAMES,
        counts,
    })
}

// ---------------------------------------------------------------------------
// 4. Scatter – age vs performance drop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeImpactPoint {
    pub age: f64,
    pub performance_drop_index: f64,
    pub team: Option<String>,
}

/// (age, drop index, team) triples over records where both numerics are
/// non-null.
pub fn age_impact(dataset: &InjuryDataset, visible: &[usize]) -> ViewData<Vec<AgeImpactPoint>> {
    if !dataset.has_column(AGE_COLUMN) {
        return ViewData::unavailable("Age column not available in the dataset");
    }

    let points: Vec<AgeImpactPoint> = visible
        .iter()
        .filter_map(|&i| {
            let rec = &dataset.records[i];
            Some(AgeImpactPoint {
                age: rec.number(AGE_COLUMN)?,
                performance_drop_index: rec.derived.performance_drop_index.value()?,
                team: owned_text(rec, TEAM_COLUMN),
            })
        })
        .collect();

    if points.is_empty() {
        return ViewData::unavailable("not enough non-null data points for the age scatter");
    }
    ViewData::Ready(points)
}

// ---------------------------------------------------------------------------
// 5. Leaderboard – comeback ranking by rating improvement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub player: String,
    pub team: Option<String>,
    pub injuries_count: usize,
    pub avg_rating_before: Option<f64>,
    pub avg_rating_after: Option<f64>,
    pub avg_rating_change: Option<f64>,
}

/// Records grouped by (player, team): injury count and mean rating metrics,
/// sorted by mean rating change descending (groups without one sort last),
/// truncated to the top fifteen.
pub fn leaderboard(dataset: &InjuryDataset, visible: &[usize]) -> ViewData<Vec<LeaderboardRow>> {
    if !dataset.has_column(PLAYER_COLUMN) {
        return ViewData::unavailable("player information not available in the dataset");
    }
    if dataset.groups.rating_before.is_empty() && dataset.groups.rating_after.is_empty() {
        return ViewData::unavailable("no player rating columns in the dataset");
    }

    #[derive(Default)]
    struct Group {
        injuries: usize,
        before: Vec<f64>,
        after: Vec<f64>,
        change: Vec<f64>,
    }

    let count_injury_cells = dataset.has_column(INJURY_COLUMN);
    let mut groups: BTreeMap<(String, Option<String>), Group> = BTreeMap::new();
    for &i in visible {
        let rec = &dataset.records[i];
        let Some(player) = rec.text(PLAYER_COLUMN) else {
            continue;
        };
        let key = (player.to_string(), owned_text(rec, TEAM_COLUMN));
        let group = groups.entry(key).or_default();
        // Count non-null injury labels when the column exists, spells otherwise.
        if !count_injury_cells || !rec.field(INJURY_COLUMN).is_null() {
            group.injuries += 1;
        }
        group.before.extend(rec.derived.avg_rating_before.value());
        group.after.extend(rec.derived.avg_rating_after.value());
        group.change.extend(rec.derived.rating_change.value());
    }

    if groups.is_empty() {
        return ViewData::unavailable("no players in the current selection");
    }

    let mut rows: Vec<LeaderboardRow> = groups
        .into_iter()
        .map(|((player, team), g)| LeaderboardRow {
            player,
            team,
            injuries_count: g.injuries,
            avg_rating_before: mean(&g.before),
            avg_rating_after: mean(&g.after),
            avg_rating_change: mean(&g.change),
        })
        .collect();

    rows.sort_by(|a, b| match (a.avg_rating_change, b.avg_rating_change) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows.truncate(LEADERBOARD_LIMIT);
    ViewData::Ready(rows)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn owned_text(rec: &InjuryRecord, column: &str) -> Option<String> {
    rec.text(column).map(str::to_string)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::data::model::CellValue;
    use crate::data::pipeline::enrich;

    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn row(pairs: Vec<(&str, CellValue)>) -> BTreeMap<String, CellValue> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn all(ds: &InjuryDataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    fn spell(
        player: &str,
        team: &str,
        date: &str,
        before: &str,
        after: &str,
        gd_before: &str,
        gd_missed: &str,
    ) -> BTreeMap<String, CellValue> {
        row(vec![
            ("Name", s(player)),
            ("Team Name", s(team)),
            ("Season", s("2020/21")),
            ("Injury", s("Hamstring")),
            ("Age", CellValue::Integer(27)),
            ("Date of Injury", s(date)),
            ("Match1_before_injury_Player_rating", s(before)),
            ("Match1_after_injury_Player_rating", s(after)),
            ("Match1_before_injury_GD", s(gd_before)),
            ("Match1_missed_match_GD", s(gd_missed)),
        ])
    }

    #[test]
    fn top_drops_excludes_nulls_sorts_descending_and_truncates() {
        let mut rows = Vec::new();
        for i in 0..12 {
            rows.push(spell(
                &format!("P{i:02}"),
                "Arsenal",
                "2021-01-10",
                "7.0",
                "7.0",
                &format!("{i}"),
                "0",
            ));
        }
        rows.push(spell("NullGd", "Arsenal", "2021-01-10", "7.0", "7.0", "N.A.", "N.A."));
        let ds = enrich(rows);
        let ranked = top_drops(&ds, &all(&ds));
        let rows = ranked.ready().expect("projection should be ready");
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].player, "P11");
        assert_eq!(rows[0].performance_drop_index, 11.0);
        assert!(rows.iter().all(|r| r.player != "NullGd"));
        let drops: Vec<f64> = rows.iter().map(|r| r.performance_drop_index).collect();
        let mut sorted = drops.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(drops, sorted);
    }

    #[test]
    fn top_drops_unavailable_without_gd_columns() {
        let ds = enrich(vec![row(vec![("Name", s("Saka"))])]);
        assert!(!top_drops(&ds, &all(&ds)).is_ready());
    }

    #[test]
    fn timeline_emits_before_then_after_points() {
        let ds = enrich(vec![
            spell("Saka", "Arsenal", "2021-01-10", "7.0", "6.0", "1", "0"),
            spell("Saka", "Arsenal", "2021-03-01", "8.0", "N.A.", "1", "0"),
            spell("Mount", "Chelsea", "2021-01-10", "6.5", "6.5", "1", "0"),
        ]);
        let view = timeline(&ds, &all(&ds), Some("Saka"));
        let view = view.ready().expect("timeline should be ready");
        assert_eq!(view.player, "Saka");
        // Two before points (both spells), one after point (second is null).
        let phases: Vec<Phase> = view.points.iter().map(|p| p.phase).collect();
        assert_eq!(
            phases,
            [Phase::BeforeInjury, Phase::BeforeInjury, Phase::AfterInjury]
        );
        assert_eq!(view.points[0].avg_rating, 7.0);
        assert_eq!(view.points[1].avg_rating, 8.0);
        assert_eq!(view.points[2].avg_rating, 6.0);
    }

    #[test]
    fn timeline_defaults_to_first_player_alphabetically() {
        let ds = enrich(vec![
            spell("Saka", "Arsenal", "2021-01-10", "7.0", "6.0", "1", "0"),
            spell("Mount", "Chelsea", "2021-01-10", "6.5", "6.5", "1", "0"),
        ]);
        let view = timeline(&ds, &all(&ds), None);
        assert_eq!(view.ready().map(|v| v.player.as_str()), Some("Mount"));
    }

    #[test]
    fn frequency_grid_fills_missing_combinations_with_zero() {
        let ds = enrich(vec![
            spell("A", "TeamA", "2021-03-05", "7", "7", "1", "0"),
            spell("B", "TeamA", "2021-03-20", "7", "7", "1", "0"),
            spell("C", "TeamB", "2021-01-02", "7", "7", "1", "0"),
        ]);
        let grid = frequency_grid(&ds, &all(&ds));
        let grid = grid.ready().expect("grid should be ready");
        assert_eq!(grid.months[0], "January");
        assert_eq!(grid.months[11], "December");
        assert_eq!(grid.count("TeamA", "March"), 2);
        assert_eq!(grid.count("TeamB", "January"), 1);
        assert_eq!(grid.count("TeamA", "January"), 0);
        assert_eq!(grid.count("TeamB", "March"), 0);
        let total: u32 = grid.counts.iter().flatten().sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn frequency_grid_skips_null_months_but_keeps_the_record_elsewhere() {
        let mut no_date = spell("B", "TeamB", "", "7", "7", "1", "0");
        no_date.insert("Date of Injury".to_string(), CellValue::Null);
        let ds = enrich(vec![
            spell("A", "TeamA", "2021-03-05", "7", "7", "1", "0"),
            no_date,
        ]);
        let grid = frequency_grid(&ds, &all(&ds));
        let grid = grid.ready().expect("grid should be ready");
        // The dateless record counts nowhere in the grid...
        assert!(grid.teams.iter().all(|t| t != "TeamB"));
        // ...but still shows up in the summary.
        assert_eq!(summary_total(&ds), 2);
    }

    fn summary_total(ds: &InjuryDataset) -> usize {
        crate::views::summary(ds, &all(ds)).total_injuries
    }

    #[test]
    fn age_scatter_requires_both_numerics() {
        let mut no_age = spell("B", "TeamB", "2021-01-02", "7", "7", "1", "0");
        no_age.insert("Age".to_string(), CellValue::Null);
        let ds = enrich(vec![
            spell("A", "TeamA", "2021-03-05", "7", "7", "2", "-1"),
            no_age,
        ]);
        let points = age_impact(&ds, &all(&ds));
        let points = points.ready().expect("scatter should be ready");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].age, 27.0);
        assert_eq!(points[0].performance_drop_index, 3.0);
    }

    #[test]
    fn age_scatter_unavailable_without_age_column() {
        let ds = enrich(vec![row(vec![("Name", s("Saka"))])]);
        assert!(!age_impact(&ds, &all(&ds)).is_ready());
    }

    #[test]
    fn leaderboard_groups_and_averages_rating_change() {
        let ds = enrich(vec![
            // rating_change = 1.0
            spell("X", "Y", "2021-01-01", "6.0", "7.0", "1", "0"),
            // rating_change = 3.0
            spell("X", "Y", "2021-02-01", "5.0", "8.0", "1", "0"),
            // separate group
            spell("Z", "Y", "2021-02-01", "7.0", "7.5", "1", "0"),
        ]);
        let board = leaderboard(&ds, &all(&ds));
        let rows = board.ready().expect("leaderboard should be ready");
        assert_eq!(rows.len(), 2);
        let x = rows.iter().find(|r| r.player == "X").unwrap();
        assert_eq!(x.injuries_count, 2);
        assert_eq!(x.avg_rating_change, Some(2.0));
        assert_eq!(x.avg_rating_before, Some(5.5));
        assert_eq!(x.avg_rating_after, Some(7.5));
        // Sorted by mean change descending: X (2.0) before Z (0.5).
        assert_eq!(rows[0].player, "X");
    }

    #[test]
    fn leaderboard_sorts_groups_without_a_change_last() {
        let ds = enrich(vec![
            spell("X", "Y", "2021-01-01", "6.0", "7.0", "1", "0"),
            spell("NoRatings", "Y", "2021-02-01", "N.A.", "N.A.", "1", "0"),
        ]);
        let board = leaderboard(&ds, &all(&ds));
        let rows = board.ready().expect("leaderboard should be ready");
        assert_eq!(rows.last().unwrap().player, "NoRatings");
        assert_eq!(rows.last().unwrap().avg_rating_change, None);
    }
}
