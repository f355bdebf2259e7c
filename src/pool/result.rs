//! Engine-agnostic query results.
//!
//! Rows keep their column order and serialize as JSON objects. Statements that
//! produce no result set are reported as affected-row metadata instead.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Exact numeric kept as text to avoid precision loss
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(String),
    Time(String),
    DateTime(String),
    Json(serde_json::Value),
}

/// One result row: column name and value pairs in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Value under `name`. With duplicate column names the last one wins,
    /// matching how the row serializes as an object.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .rev()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of one executed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultSet {
    Rows(Vec<Row>),
    Affected {
        #[serde(rename = "affectedRows")]
        affected_rows: u64,
        #[serde(rename = "insertId")]
        last_insert_id: u64,
    },
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        match self {
            ResultSet::Rows(rows) => rows.len(),
            ResultSet::Affected { .. } => 0,
        }
    }
}

/// Leading keywords of statements that yield a result set.
const ROW_RETURNING_KEYWORDS: &[&str] = &[
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH", "VALUES", "TABLE",
];

/// Whether `sql` is a row-returning statement.
///
/// Used only to tell an empty result set apart from a mutation that touched no
/// rows. Leading whitespace, `--`/`#` line comments, `/* */` block comments and
/// opening parentheses are skipped.
pub fn returns_rows(sql: &str) -> bool {
    let keyword: String = skip_leading_noise(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    ROW_RETURNING_KEYWORDS.contains(&keyword.as_str())
}

fn skip_leading_noise(mut sql: &str) -> &str {
    loop {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(rest) = trimmed
            .strip_prefix("--")
            .or_else(|| trimmed.strip_prefix('#'))
        {
            sql = rest.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            sql = rest.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
        } else {
            return trimmed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = Row::new(vec![
            ("z".to_string(), SqlValue::Int(1)),
            ("a".to_string(), SqlValue::Text("x".to_string())),
            ("m".to_string(), SqlValue::Null),
        ]);
        let encoded = serde_json::to_string(&row).unwrap();
        assert_eq!(encoded, r#"{"z":1,"a":"x","m":null}"#);
    }

    #[test]
    fn test_value_encoding() {
        let values = vec![
            SqlValue::UInt(u64::MAX),
            SqlValue::Float(1.5),
            SqlValue::Decimal("10.25".to_string()),
            SqlValue::Bytes(vec![1, 2]),
            SqlValue::DateTime("2024-01-02T03:04:05".to_string()),
            SqlValue::Json(json!({"k": [1, 2]})),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!([u64::MAX, 1.5, "10.25", [1, 2], "2024-01-02T03:04:05", {"k": [1, 2]}])
        );
    }

    #[test]
    fn test_result_set_encoding() {
        let rows = ResultSet::Rows(vec![Row::new(vec![("x".to_string(), SqlValue::Int(1))])]);
        assert_eq!(serde_json::to_value(&rows).unwrap(), json!([{"x": 1}]));
        assert_eq!(rows.row_count(), 1);

        let affected = ResultSet::Affected {
            affected_rows: 3,
            last_insert_id: 42,
        };
        assert_eq!(
            serde_json::to_value(&affected).unwrap(),
            json!({"affectedRows": 3, "insertId": 42})
        );
        assert_eq!(affected.row_count(), 0);
    }

    #[test]
    fn test_row_get_last_duplicate_wins() {
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Int(1)),
            ("id".to_string(), SqlValue::Int(2)),
        ]);
        assert_eq!(row.get("id"), Some(&SqlValue::Int(2)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  select * from t"));
        assert!(returns_rows("(SELECT 1) UNION (SELECT 2)"));
        assert!(returns_rows("-- note\nSHOW TABLES"));
        assert!(returns_rows("/* hint */ with cte as (select 1) select * from cte"));
        assert!(returns_rows("desc users"));

        assert!(!returns_rows("UPDATE t SET a = 1"));
        assert!(!returns_rows("insert into t values (1)"));
        assert!(!returns_rows("CREATE TABLE t (id INT)"));
        assert!(!returns_rows("-- only a comment"));
        assert!(!returns_rows(""));
    }
}
