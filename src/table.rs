use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw column-named table as the stats provider returns it: one header row plus
/// loosely typed cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl StatTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn number_at(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row)?.get(col).and_then(value_as_f64)
    }

    pub fn text_at(&self, row: usize, col: usize) -> Option<String> {
        match self.rows.get(row)?.get(col)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

pub fn value_as_f64(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{StatTable, value_as_f64, value_as_i64};

    #[test]
    fn loose_cells_coerce() {
        assert_eq!(value_as_f64(&json!(1.5)), Some(1.5));
        assert_eq!(value_as_f64(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(value_as_f64(&json!(null)), None);
        assert_eq!(value_as_f64(&json!("n/a")), None);
        assert_eq!(value_as_i64(&json!(2544)), Some(2544));
        assert_eq!(value_as_i64(&json!(2544.0)), Some(2544));
        assert_eq!(value_as_i64(&json!("201939")), Some(201939));
        assert_eq!(value_as_i64(&json!(1.5)), None);
    }

    #[test]
    fn lookups_by_header() {
        let table = StatTable::new(&["PLAYER_ID", "PLAYER_NAME", "PTS"])
            .with_row(vec![json!(1), json!("A"), json!(20.1)]);
        let pts = table.column_index("PTS").unwrap();
        assert_eq!(table.number_at(0, pts), Some(20.1));
        assert_eq!(table.text_at(0, 1).as_deref(), Some("A"));
        assert_eq!(table.number_at(1, pts), None);
        assert!(!table.has_column("AST"));
    }
}
