// src/store/types.rs
use serde_json::{Map, Value};
use thiserror::Error;

/// One row as returned by the store: column name → JSON value.
pub type Row = Map<String, Value>;

/// Column predicate understood by every store backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact equality (`col = value`).
    Eq { column: String, value: Value },
    /// Case-insensitive equality (`col ILIKE value`, no wildcards).
    IEq { column: String, value: String },
    /// Case-insensitive substring (`col ILIKE %needle%`).
    IContains { column: String, needle: String },
    /// Set membership (`col IN (...)`).
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn ieq(column: &str, value: &str) -> Self {
        Filter::IEq {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn icontains(column: &str, needle: &str) -> Self {
        Filter::IContains {
            column: column.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn is_in<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. }
            | Filter::IEq { column, .. }
            | Filter::IContains { column, .. }
            | Filter::In { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
    pub nulls_last: bool,
}

impl OrderBy {
    pub fn desc_nulls_last(column: &str) -> Self {
        Self {
            column: column.to_string(),
            descending: true,
            nulls_last: true,
        }
    }
}

/// A `select` against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, f: Filter) -> Self {
        self.filters.push(f);
        self
    }

    pub fn order(mut self, o: OrderBy) -> Self {
        self.order = Some(o);
        self
    }

    pub fn limit(mut self, n: Option<usize>) -> Self {
        self.limit = n;
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport fault, timeout or 5xx. Transient.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Unique-constraint violation on insert.
    #[error("unique constraint violated on table {table}")]
    Conflict { table: String },

    /// The store understood the request and refused it (4xx other than conflict).
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body was not the expected row array.
    #[error("could not decode store response: {0}")]
    Decode(String),
}

/// Query façade over the remote store.
#[async_trait::async_trait]
pub trait StoreClient: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError>;
    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError>;
    fn name(&self) -> &'static str;
}

// ---- Row accessors ----
// Stores disagree on whether ids and numbers arrive as JSON numbers or strings,
// so the accessors accept both.

/// Non-empty, trimmed string value of `col`.
pub fn row_str(row: &Row, col: &str) -> Option<String> {
    match row.get(col)? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn row_f32(row: &Row, col: &str) -> Option<f32> {
    let v = match row.get(col)? {
        Value::Number(n) => n.as_f64()? as f32,
        Value::String(s) => s.trim().parse::<f32>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

pub fn row_bool(row: &Row, col: &str) -> bool {
    match row.get(col) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "t" | "1"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// String list from a JSON array column; non-string entries are skipped.
pub fn row_str_list(row: &Row, col: &str) -> Vec<String> {
    match row.get(col) {
        Some(Value::Array(items)) => items.iter().filter_map(value_key).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Canonical string form used for id comparison across backends.
pub fn value_key(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
