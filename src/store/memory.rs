// src/store/memory.rs
//! In-memory store with the same filter/order/unique semantics as the REST
//! backend. Used for local runs without a configured store and in tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::types::{value_key, Filter, OrderBy, Row, Select, StoreClient, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unique: HashMap<String, Vec<String>>,
    offline: AtomicBool,
    delay: Option<Duration>,
    selects: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `table` with rows (non-object values are ignored).
    pub fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
        {
            let mut g = self.tables.write().expect("memory store rwlock poisoned");
            let t = g.entry(table.to_string()).or_default();
            t.extend(rows.into_iter().filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            }));
        }
        self
    }

    /// Declare `column` unique on `table`; duplicate inserts fail with `Conflict`.
    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(column.to_string());
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// While offline, every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Number of `select` calls served so far.
    pub fn select_count(&self) -> usize {
        self.selects.load(AtomicOrdering::SeqCst)
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        let g = self.tables.read().expect("memory store rwlock poisoned");
        g.get(table).cloned().unwrap_or_default()
    }

    async fn gate(&self) -> Result<(), StoreError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        self.selects.fetch_add(1, AtomicOrdering::SeqCst);
        self.gate().await?;

        let mut rows: Vec<Row> = {
            let g = self.tables.read().expect("memory store rwlock poisoned");
            g.get(&query.table)
                .map(|t| {
                    t.iter()
                        .filter(|r| query.filters.iter().all(|f| matches(r, f)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(o) = &query.order {
            // stable: ties keep insertion order
            rows.sort_by(|a, b| compare_rows(a, b, o));
        }
        if let Some(n) = query.limit {
            rows.truncate(n);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        self.gate().await?;

        let mut g = self.tables.write().expect("memory store rwlock poisoned");
        let rows = g.entry(table.to_string()).or_default();
        if let Some(cols) = self.unique.get(table) {
            for col in cols {
                let Some(key) = row.get(col).and_then(value_key) else {
                    continue;
                };
                let taken = rows
                    .iter()
                    .any(|r| r.get(col).and_then(value_key).as_deref() == Some(key.as_str()));
                if taken {
                    return Err(StoreError::Conflict {
                        table: table.to_string(),
                    });
                }
            }
        }
        rows.push(row);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

fn text(row: &Row, col: &str) -> Option<String> {
    row.get(col).and_then(value_key)
}

fn matches(row: &Row, f: &Filter) -> bool {
    match f {
        Filter::Eq { column, value } => match (row.get(column), value_key(value)) {
            (Some(v), Some(want)) => value_key(v).as_deref() == Some(want.as_str()),
            (Some(v), None) => v == value,
            (None, _) => value.is_null(),
        },
        Filter::IEq { column, value } => {
            text(row, column).is_some_and(|s| s.to_lowercase() == value.trim().to_lowercase())
        }
        Filter::IContains { column, needle } => text(row, column)
            .is_some_and(|s| s.to_lowercase().contains(&needle.trim().to_lowercase())),
        Filter::In { column, values } => {
            let Some(have) = text(row, column) else {
                return false;
            };
            values
                .iter()
                .filter_map(value_key)
                .any(|want| want == have)
        }
    }
}

fn compare_rows(a: &Row, b: &Row, o: &OrderBy) -> Ordering {
    let va = a.get(&o.column).filter(|v| !v.is_null());
    let vb = b.get(&o.column).filter(|v| !v.is_null());
    match (va, vb) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => {
            if o.nulls_last {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(_), None) => {
            if o.nulls_last {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            if o.descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_key(a).cmp(&value_key(b)),
    }
}
