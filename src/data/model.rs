use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell of a loaded dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the upstream column dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date kept as text; only ever displayed.
    Date(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "N/A"),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64` where it carries a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret the value as an `i64`. Floats qualify only when whole,
    /// because rank and count columns round-trip through CSV as `3.0`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }

    /// Indicator-flag semantics: `1`, `1.0` and `true` all count as set.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i == 1,
            Value::Float(v) => *v == 1.0,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Row – one record of a dataset
// ---------------------------------------------------------------------------

/// One row of a loaded dataset: column name → value.
///
/// The typed accessors below are the only sanctioned way to read a
/// possibly-missing field; they collapse "column absent" and "cell is
/// null" into `None` so callers never branch on the difference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.cells.insert(column.into(), value);
    }

    /// Raw cell lookup; `Some(Value::Null)` is possible here.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    fn present(&self, column: &str) -> Option<&Value> {
        self.cells.get(column).filter(|v| !v.is_null())
    }

    pub fn str_at(&self, column: &str) -> Option<&str> {
        self.present(column).and_then(Value::as_str)
    }

    pub fn f64_at(&self, column: &str) -> Option<f64> {
        self.present(column).and_then(Value::as_f64)
    }

    pub fn i64_at(&self, column: &str) -> Option<i64> {
        self.present(column).and_then(Value::as_i64)
    }

    pub fn bool_at(&self, column: &str) -> Option<bool> {
        self.present(column).map(Value::is_truthy)
    }

    /// Owned display text for columns of mixed type (employee ranges,
    /// dates); `None` when absent or null.
    pub fn text_at(&self, column: &str) -> Option<String> {
        self.present(column).map(|v| v.to_string())
    }

    /// Display form for detail panes; absent and null both read "N/A".
    pub fn display_at(&self, column: &str) -> String {
        match self.present(column) {
            Some(v) => v.to_string(),
            None => "N/A".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – a complete loaded dataset
// ---------------------------------------------------------------------------

/// A decoded dataset: column order as delivered plus the parsed rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Index rows by a string key column; the first row per key wins.
    /// Rows without the key are left out.
    pub fn index_by<'a>(&'a self, key_column: &str) -> BTreeMap<&'a str, &'a Row> {
        let mut index: BTreeMap<&str, &Row> = BTreeMap::new();
        for row in &self.rows {
            if let Some(key) = row.str_at(key_column) {
                index.entry(key).or_insert(row);
            }
        }
        index
    }

    /// Sorted unique string values of a column (drives select options).
    pub fn unique_strings(&self, column: &str) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter_map(|row| row.str_at(column).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut r = Row::new();
        for (col, val) in pairs {
            r.insert(*col, val.clone());
        }
        r
    }

    #[test]
    fn accessors_collapse_absent_and_null() {
        let r = row(&[
            ("name", Value::Str("ACME".into())),
            ("score", Value::Float(71.5)),
            ("rank", Value::Float(3.0)),
            ("flag", Value::Int(1)),
            ("gone", Value::Null),
        ]);

        assert_eq!(r.str_at("name"), Some("ACME"));
        assert_eq!(r.f64_at("score"), Some(71.5));
        assert_eq!(r.i64_at("rank"), Some(3));
        assert_eq!(r.bool_at("flag"), Some(true));
        assert_eq!(r.str_at("gone"), None);
        assert_eq!(r.f64_at("missing"), None);
        assert_eq!(r.display_at("gone"), "N/A");
    }

    #[test]
    fn fractional_floats_are_not_integers() {
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
    }

    #[test]
    fn truthiness_matches_indicator_flags() {
        assert!(Value::Int(1).is_truthy());
        assert!(Value::Float(1.0).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str("1".into()).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn index_by_keeps_first_row_per_key() {
        let mut table = Table::new(vec!["company_id".into(), "v".into()]);
        table.rows.push(row(&[
            ("company_id", Value::Str("c1".into())),
            ("v", Value::Int(1)),
        ]));
        table.rows.push(row(&[
            ("company_id", Value::Str("c1".into())),
            ("v", Value::Int(2)),
        ]));
        table.rows.push(row(&[("v", Value::Int(3))]));

        let index = table.index_by("company_id");
        assert_eq!(index.len(), 1);
        assert_eq!(index["c1"].i64_at("v"), Some(1));
    }

    #[test]
    fn unique_strings_skips_nulls() {
        let mut table = Table::new(vec!["tier".into()]);
        for v in [
            Value::Str("High".into()),
            Value::Str("Low".into()),
            Value::Str("High".into()),
            Value::Null,
        ] {
            table.rows.push(row(&[("tier", v)]));
        }
        let unique = table.unique_strings("tier");
        assert_eq!(
            unique.into_iter().collect::<Vec<_>>(),
            vec!["High".to_string(), "Low".to_string()]
        );
    }
}
