use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::model::{CellValue, ColumnGroups, DerivedMetrics, InjuryDataset, InjuryRecord, Metric};

// ---------------------------------------------------------------------------
// Naming conventions
// ---------------------------------------------------------------------------

/// Substring marking a player-rating column (e.g. `Match1_before_injury_Player_rating`).
pub const RATING_MARKER: &str = "Player_rating";
/// Suffix marking a team goal-difference column (e.g. `Match1_before_injury_GD`).
pub const GD_SUFFIX: &str = "_GD";

pub const INJURY_DATE_COLUMN: &str = "Date of Injury";
pub const RETURN_DATE_COLUMN: &str = "Date of return";

/// Source-specific labels renamed to canonical names when present.
const RENAMES: &[(&str, &str)] = &[
    ("Name", "Player_Name"),
    ("Team Name", "Team"),
    ("FIFA rating", "FIFA_Rating"),
];

/// Strings treated as null in numeric columns.  Exact, whitespace-trimmed,
/// case-insensitive matches only: `"-"` is null, `"-5"` is a number.
const NULL_SENTINELS: &[&str] = &["", "N.A.", "N.A", "NA", "-", "None"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ---------------------------------------------------------------------------
// Enrichment entry-point
// ---------------------------------------------------------------------------

/// Enrich raw rows into an [`InjuryDataset`].
///
/// Total over malformed input: unparseable dates and numbers become nulls,
/// absent source columns leave the corresponding metrics unavailable.
/// Idempotent when re-applied to the field maps of its own output.
pub fn enrich(mut rows: Vec<BTreeMap<String, CellValue>>) -> InjuryDataset {
    for row in &mut rows {
        rename_columns(row);
    }

    let columns: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
    let groups = discover_groups(columns.iter().map(String::as_str));

    for row in &mut rows {
        for (col, cell) in row.iter_mut() {
            if col == INJURY_DATE_COLUMN || col == RETURN_DATE_COLUMN {
                *cell = parse_date_cell(cell);
            } else if col.contains(RATING_MARKER) || col.ends_with(GD_SUFFIX) {
                *cell = clean_numeric(cell);
            }
        }
    }

    let records: Vec<InjuryRecord> = rows
        .into_iter()
        .map(|fields| {
            let derived = derive_metrics(&fields, &groups);
            InjuryRecord { fields, derived }
        })
        .collect();

    if groups.rating_before.is_empty() && groups.rating_after.is_empty() {
        log::warn!("no {RATING_MARKER} columns found; rating metrics unavailable");
    }
    if groups.gd_before.is_empty() && groups.gd_missed.is_empty() {
        log::warn!("no {GD_SUFFIX} columns found; goal-difference metrics unavailable");
    }

    InjuryDataset::from_records(records, groups)
}

fn rename_columns(row: &mut BTreeMap<String, CellValue>) {
    for (from, to) in RENAMES {
        if let Some(value) = row.remove(*from) {
            // Keep an already-canonical column if both spellings exist.
            row.entry((*to).to_string()).or_insert(value);
        }
    }
}

// ---------------------------------------------------------------------------
// Column discovery
// ---------------------------------------------------------------------------

/// Discover rating / goal-difference columns by naming convention.
/// Any number of matches, including zero, is tolerated.
pub fn discover_groups<'a>(columns: impl Iterator<Item = &'a str>) -> ColumnGroups {
    let mut groups = ColumnGroups::default();
    for col in columns {
        let lower = col.to_ascii_lowercase();
        if col.contains(RATING_MARKER) {
            if lower.contains("before") {
                groups.rating_before.push(col.to_string());
            } else if lower.contains("after") {
                groups.rating_after.push(col.to_string());
            }
        } else if col.ends_with(GD_SUFFIX) {
            if lower.contains("before") {
                groups.gd_before.push(col.to_string());
            } else if lower.contains("missed") {
                groups.gd_missed.push(col.to_string());
            }
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Cell-level cleaning
// ---------------------------------------------------------------------------

/// Normalize a raw cell to `Float` or `Null`.
///
/// Strips parenthetical annotations and thousands separators, maps sentinel
/// strings to null, then parses.  Already-numeric cells pass through, so
/// `clean_numeric(clean_numeric(x)) == clean_numeric(x)`.
pub fn clean_numeric(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Float(_) => cell.clone(),
        CellValue::Integer(i) => CellValue::Float(*i as f64),
        CellValue::String(raw) => {
            let trimmed = raw.trim();
            if is_null_sentinel(trimmed) {
                return CellValue::Null;
            }
            let stripped = strip_parenthetical(trimmed).replace(',', "");
            let stripped = stripped.trim();
            if is_null_sentinel(stripped) {
                return CellValue::Null;
            }
            match stripped.parse::<f64>() {
                Ok(v) => CellValue::Float(v),
                Err(_) => CellValue::Null,
            }
        }
        _ => CellValue::Null,
    }
}

fn is_null_sentinel(s: &str) -> bool {
    NULL_SENTINELS.iter().any(|n| s.eq_ignore_ascii_case(n))
}

/// Remove `(...)` annotation spans, e.g. `"85 (S)"` → `"85 "`.
/// An unclosed parenthesis is left in place (and later fails the parse).
fn strip_parenthetical(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Parse a date cell; anything unparseable becomes null.  Already-parsed
/// dates pass through.
pub fn parse_date_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Date(_) => cell.clone(),
        CellValue::String(raw) => match parse_date(raw) {
            Some(d) => CellValue::Date(d),
            None => CellValue::Null,
        },
        _ => CellValue::Null,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Row-wise derivation
// ---------------------------------------------------------------------------

fn derive_metrics(fields: &BTreeMap<String, CellValue>, groups: &ColumnGroups) -> DerivedMetrics {
    let injury_date = match fields.get(INJURY_DATE_COLUMN) {
        Some(CellValue::Date(d)) => Some(*d),
        _ => None,
    };

    let mean_over = |cols: &[String]| {
        Metric::mean_of(
            cols.iter()
                .map(|c| fields.get(c).and_then(CellValue::as_f64)),
            !cols.is_empty(),
        )
    };

    let avg_rating_before = mean_over(&groups.rating_before);
    let avg_rating_after = mean_over(&groups.rating_after);
    let team_gd_before = mean_over(&groups.gd_before);
    let team_gd_missed = mean_over(&groups.gd_missed);

    DerivedMetrics {
        injury_month: injury_date.map(|d| d.month()),
        injury_year: injury_date.map(|d| d.year()),
        avg_rating_before,
        avg_rating_after,
        rating_change: avg_rating_after.minus(avg_rating_before),
        team_gd_before,
        team_gd_missed,
        performance_drop_index: team_gd_before.minus(team_gd_missed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn clean_numeric_handles_annotations_and_separators() {
        assert_eq!(clean_numeric(&s("85 (S)")), CellValue::Float(85.0));
        assert_eq!(clean_numeric(&s("1,234")), CellValue::Float(1234.0));
        assert_eq!(clean_numeric(&s("  7.5 ")), CellValue::Float(7.5));
        assert_eq!(clean_numeric(&s("(S)")), CellValue::Null);
    }

    #[test]
    fn clean_numeric_sentinels_are_exact_matches() {
        for sentinel in ["", "N.A.", "n.a.", "NA", "na", "-", "None", "none", " N.A "] {
            assert_eq!(clean_numeric(&s(sentinel)), CellValue::Null, "{sentinel:?}");
        }
        // Partial matches are not sentinels.
        assert_eq!(clean_numeric(&s("-5")), CellValue::Float(-5.0));
        assert_eq!(clean_numeric(&s("NAB")), CellValue::Null); // parse failure, not sentinel
    }

    #[test]
    fn clean_numeric_is_idempotent() {
        for raw in ["85 (S)", "1,234", "N.A.", "garbage", "-3.25"] {
            let once = clean_numeric(&s(raw));
            assert_eq!(clean_numeric(&once), once, "{raw:?}");
        }
        assert_eq!(
            clean_numeric(&CellValue::Integer(42)),
            CellValue::Float(42.0)
        );
    }

    #[test]
    fn unclosed_parenthesis_fails_the_parse() {
        assert_eq!(clean_numeric(&s("85 (S")), CellValue::Null);
    }

    #[test]
    fn date_parsing_accepts_common_formats_and_coerces_failures() {
        let expected = CellValue::Date(NaiveDate::from_ymd_opt(2020, 10, 31).unwrap());
        assert_eq!(parse_date_cell(&s("2020-10-31")), expected);
        assert_eq!(parse_date_cell(&s("31/10/2020")), expected);
        assert_eq!(parse_date_cell(&s("Oct 31, 2020")), expected);
        assert_eq!(parse_date_cell(&s("not a date")), CellValue::Null);
        assert_eq!(parse_date_cell(&expected), expected);
    }

    #[test]
    fn discovery_matches_markers_case_insensitively_for_subgroups() {
        let cols = [
            "Match1_before_injury_Player_rating",
            "Match1_AFTER_injury_Player_rating",
            "Match2_before_injury_GD",
            "Match2_Missed_match_GD",
            "Season",
            "GD_total", // suffix only counts at the end
        ];
        let groups = discover_groups(cols.into_iter());
        assert_eq!(groups.rating_before, ["Match1_before_injury_Player_rating"]);
        assert_eq!(groups.rating_after, ["Match1_AFTER_injury_Player_rating"]);
        assert_eq!(groups.gd_before, ["Match2_before_injury_GD"]);
        assert_eq!(groups.gd_missed, ["Match2_Missed_match_GD"]);
    }

    fn row(pairs: &[(&str, CellValue)]) -> BTreeMap<String, CellValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn enrich_renames_and_derives() {
        let rows = vec![row(&[
            ("Name", s("Jude")),
            ("Team Name", s("Madrid")),
            ("Date of Injury", s("2021-03-14")),
            ("Match1_before_injury_Player_rating", s("6.0")),
            ("Match2_before_injury_Player_rating", s("8.0 (S)")),
            ("Match1_after_injury_Player_rating", s("7.5")),
            ("Match1_before_injury_GD", s("2")),
            ("Match1_missed_match_GD", s("-1")),
        ])];
        let ds = enrich(rows);
        assert_eq!(ds.len(), 1);
        let rec = &ds.records[0];
        assert_eq!(rec.text("Player_Name"), Some("Jude"));
        assert_eq!(rec.text("Team"), Some("Madrid"));
        assert!(!rec.fields.contains_key("Name"));
        assert_eq!(rec.derived.injury_month, Some(3));
        assert_eq!(rec.derived.injury_year, Some(2021));
        assert_eq!(rec.derived.avg_rating_before, Metric::Value(7.0));
        assert_eq!(rec.derived.avg_rating_after, Metric::Value(7.5));
        assert_eq!(rec.derived.rating_change, Metric::Value(0.5));
        assert_eq!(rec.derived.team_gd_before, Metric::Value(2.0));
        assert_eq!(rec.derived.team_gd_missed, Metric::Value(-1.0));
        assert_eq!(rec.derived.performance_drop_index, Metric::Value(3.0));
    }

    #[test]
    fn enrich_degrades_per_category() {
        // Rating columns missing entirely, GD columns populated.
        let rows = vec![row(&[
            ("Name", s("Ada")),
            ("Match1_before_injury_GD", s("1.0")),
            ("Match1_missed_match_GD", s("N.A.")),
        ])];
        let ds = enrich(rows);
        let d = &ds.records[0].derived;
        assert_eq!(d.avg_rating_before, Metric::Unavailable);
        assert_eq!(d.rating_change, Metric::Unavailable);
        assert_eq!(d.team_gd_before, Metric::Value(1.0));
        assert_eq!(d.team_gd_missed, Metric::Null);
        assert_eq!(d.performance_drop_index, Metric::Null);
    }

    #[test]
    fn enrich_is_idempotent_on_its_own_output() {
        let rows = vec![row(&[
            ("Name", s("Jude")),
            ("Date of Injury", s("2021-03-14")),
            ("Match1_before_injury_Player_rating", s("6.5 (S)")),
            ("Match1_missed_match_GD", s("1,000")),
        ])];
        let once = enrich(rows);
        let twice = enrich(once.records.iter().map(|r| r.fields.clone()).collect());
        for (a, b) in once.records.iter().zip(&twice.records) {
            assert_eq!(a.fields, b.fields);
            assert_eq!(a.derived.injury_month, b.derived.injury_month);
            assert_eq!(a.derived.avg_rating_before, b.derived.avg_rating_before);
            assert_eq!(
                a.derived.performance_drop_index,
                b.derived.performance_drop_index
            );
        }
    }

    #[test]
    fn missing_injury_date_keeps_record_with_null_calendar_fields() {
        let rows = vec![
            row(&[("Name", s("A")), ("Date of Injury", s("2020-01-05"))]),
            row(&[("Name", s("B")), ("Date of Injury", CellValue::Null)]),
            row(&[("Name", s("C"))]),
        ];
        let ds = enrich(rows);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[0].derived.injury_month, Some(1));
        assert_eq!(ds.records[1].derived.injury_month, None);
        assert_eq!(ds.records[2].derived.injury_year, None);
    }
}
