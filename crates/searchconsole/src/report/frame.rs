//! Minimal column-oriented table for exporting reports.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use std::fmt;

static NULL: Value = Value::Null;

/// Named columns over rows of JSON values. Every row has exactly one value
/// per column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataFrame {
    /// Rows are padded with nulls or cut to the column count.
    pub(crate) fn new(columns: Vec<String>, mut rows: Vec<Vec<Value>>) -> Self {
        for row in &mut rows {
            row.resize(columns.len(), Value::Null);
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r.get(idx).unwrap_or(&NULL)).collect())
    }

    /// One JSON object per row, keys in column order.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }

    fn record(&self, row: &[Value]) -> Map<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }
}

impl Serialize for DataFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&self.record(row))?;
        }
        seq.end()
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Aligned plain-text table: strings left-aligned, numbers right-aligned.
impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (w, c) in widths.iter_mut().zip(row) {
                *w = (*w).max(c.chars().count());
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;

        for (row, values) in cells.iter().zip(&self.rows) {
            let line: Vec<String> = row
                .iter()
                .zip(values)
                .zip(&widths)
                .map(|((c, v), &w)| {
                    if v.is_number() {
                        format!("{c:>w$}")
                    } else {
                        format!("{c:<w$}")
                    }
                })
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataFrame {
        DataFrame::new(
            vec!["query".into(), "clicks".into(), "ctr".into()],
            vec![
                vec![json!("dress"), json!(12), json!(0.25)],
                vec![json!("red dress"), json!(3), json!(0.1)],
            ],
        )
    }

    #[test]
    fn test_shape_and_column_access() {
        let frame = sample();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.column("clicks").unwrap(), vec![&json!(12), &json!(3)]);
        assert!(frame.column("position").is_none());
    }

    #[test]
    fn test_serializes_as_ordered_records() {
        let text = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            text,
            r#"[{"query":"dress","clicks":12,"ctr":0.25},{"query":"red dress","clicks":3,"ctr":0.1}]"#
        );
    }

    #[test]
    fn test_display_aligns_columns() {
        let rendered = sample().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "query      clicks  ctr");
        assert_eq!(lines[1], "dress          12  0.2500");
        assert_eq!(lines[2], "red dress       3  0.1000");
    }

    #[test]
    fn test_ragged_rows_are_normalized() {
        let frame = DataFrame::new(
            vec!["query".into(), "clicks".into()],
            vec![vec![json!("dress")], vec![json!("hat"), json!(2), json!("stray")]],
        );
        assert_eq!(frame.rows()[0], vec![json!("dress"), Value::Null]);
        assert_eq!(frame.rows()[1].len(), 2);
        assert_eq!(frame.column("clicks").unwrap(), vec![&Value::Null, &json!(2)]);
    }

    #[test]
    fn test_empty_frame_renders_header_only() {
        let frame = DataFrame::new(vec!["date".into(), "clicks".into()], Vec::new());
        assert!(frame.is_empty());
        assert_eq!(frame.to_string(), "date  clicks\n");
    }
}
