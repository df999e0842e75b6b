use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeStruct, Serializer};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the injury table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) => serializer.serialize_f64(*v),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            CellValue::Null => serializer.serialize_none(),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for numeric aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// String content, if this is a string cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Metric – a derived numeric with explicit availability
// ---------------------------------------------------------------------------

/// A derived numeric metric.
///
/// `Null` means the contributing columns exist but held no usable value for
/// this record; `Unavailable` means the dataset has no matching columns at
/// all, so the metric cannot exist for any record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Null,
    Unavailable,
}

impl Metric {
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Difference of two metrics, propagating null/unavailable.
    pub fn minus(self, other: Metric) -> Metric {
        match (self, other) {
            (Metric::Value(a), Metric::Value(b)) => Metric::Value(a - b),
            (Metric::Unavailable, _) | (_, Metric::Unavailable) => Metric::Unavailable,
            _ => Metric::Null,
        }
    }

    /// Mean of the given cells, ignoring anything non-numeric.
    /// An absent column group yields `Unavailable`; all-null yields `Null`.
    pub fn mean_of(cells: impl Iterator<Item = Option<f64>>, group_present: bool) -> Metric {
        if !group_present {
            return Metric::Unavailable;
        }
        let values: Vec<f64> = cells.flatten().collect();
        if values.is_empty() {
            Metric::Null
        } else {
            Metric::Value(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => serializer.serialize_f64(*v),
            _ => serializer.serialize_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedMetrics – the per-record enrichment block
// ---------------------------------------------------------------------------

/// Metrics computed once at load time from the record's own raw fields,
/// read-only afterwards.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DerivedMetrics {
    /// Calendar month of the injury date, 1–12.
    pub injury_month: Option<u32>,
    pub injury_year: Option<i32>,
    pub avg_rating_before: Metric,
    pub avg_rating_after: Metric,
    pub rating_change: Metric,
    pub team_gd_before: Metric,
    pub team_gd_missed: Metric,
    /// `team_gd_before - team_gd_missed`; higher = team performed worse
    /// while the player was out.
    pub performance_drop_index: Metric,
}

impl DerivedMetrics {
    pub fn empty() -> Self {
        DerivedMetrics {
            injury_month: None,
            injury_year: None,
            avg_rating_before: Metric::Unavailable,
            avg_rating_after: Metric::Unavailable,
            rating_change: Metric::Unavailable,
            team_gd_before: Metric::Unavailable,
            team_gd_missed: Metric::Unavailable,
            performance_drop_index: Metric::Unavailable,
        }
    }
}

// ---------------------------------------------------------------------------
// InjuryRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single injury spell (one row of the source table).
#[derive(Debug, Clone, serde::Serialize)]
pub struct InjuryRecord {
    /// Dynamic raw columns after cleaning: column_name → value.
    pub fields: BTreeMap<String, CellValue>,
    /// Enrichment block.
    pub derived: DerivedMetrics,
}

impl InjuryRecord {
    /// Cell lookup treating a missing column like a null cell.
    pub fn field(&self, column: &str) -> &CellValue {
        self.fields.get(column).unwrap_or(&CellValue::Null)
    }

    /// Non-null string content of a column.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.field(column).as_str()
    }

    /// Numeric content of a column.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.field(column).as_f64()
    }
}

// ---------------------------------------------------------------------------
// ColumnGroups – naming-convention discovery results
// ---------------------------------------------------------------------------

/// Rating / goal-difference columns discovered by naming convention,
/// fixed for the dataset lifetime.
#[derive(Debug, Clone, Default)]
pub struct ColumnGroups {
    pub rating_before: Vec<String>,
    pub rating_after: Vec<String>,
    pub gd_before: Vec<String>,
    pub gd_missed: Vec<String>,
}

// ---------------------------------------------------------------------------
// InjuryDataset – the complete enriched dataset
// ---------------------------------------------------------------------------

/// The full enriched dataset with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct InjuryDataset {
    /// All injury records (rows).
    pub records: Vec<InjuryRecord>,
    /// Ordered list of raw column names.
    pub column_names: Vec<String>,
    /// For each raw column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
    /// Columns contributing to the derived metrics.
    pub groups: ColumnGroups,
}

impl InjuryDataset {
    /// Build column indices from enriched records.
    pub fn from_records(records: Vec<InjuryRecord>, groups: ColumnGroups) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = BTreeMap::new();

        for rec in &records {
            for (col, val) in &rec.fields {
                column_names_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names: Vec<String> = column_names_set.into_iter().collect();
        InjuryDataset {
            records,
            column_names,
            unique_values,
            groups,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record carries this column.
    pub fn has_column(&self, column: &str) -> bool {
        self.unique_values.contains_key(column)
    }

    /// Sorted distinct non-null string values of a column, for filter options.
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        self.unique_values
            .get(column)
            .map(|vals| {
                vals.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// Serialize only what the display layer needs; column indices are internal.
impl Serialize for InjuryDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("InjuryDataset", 2)?;
        st.serialize_field("columns", &self.column_names)?;
        st.serialize_field("records", &self.records)?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_minus_propagates() {
        assert_eq!(
            Metric::Value(2.0).minus(Metric::Value(-1.0)),
            Metric::Value(3.0)
        );
        assert_eq!(Metric::Value(1.0).minus(Metric::Null), Metric::Null);
        assert_eq!(Metric::Null.minus(Metric::Unavailable), Metric::Unavailable);
    }

    #[test]
    fn metric_mean_ignores_nulls() {
        let m = Metric::mean_of([Some(6.0), None, Some(8.0)].into_iter(), true);
        assert_eq!(m, Metric::Value(7.0));
        assert_eq!(Metric::mean_of([None, None].into_iter(), true), Metric::Null);
        assert_eq!(
            Metric::mean_of(std::iter::empty(), false),
            Metric::Unavailable
        );
    }

    #[test]
    fn record_field_lookup_defaults_to_null() {
        let rec = InjuryRecord {
            fields: BTreeMap::new(),
            derived: DerivedMetrics::empty(),
        };
        assert!(rec.field("Team").is_null());
        assert_eq!(rec.number("Age"), None);
    }
}
