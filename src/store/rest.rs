// src/store/rest.rs
//! PostgREST-dialect HTTP backend (`/rest/v1/{table}?col=op.value`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::types::{Filter, Row, Select, StoreClient, StoreError};

/// Postgres SQLSTATE for unique_violation.
const PG_UNIQUE_VIOLATION: &str = "23505";

pub struct RestStore {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent("destination-guide/0.1")
            .connect_timeout(Duration::from_secs(4).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            return req;
        }
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl StoreClient for RestStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        let params = query_params(query);
        let resp = self
            .authed(self.http.get(self.table_url(&query.table)))
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(&query.table, status, &body));
        }

        resp.json::<Vec<Row>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        let resp = self
            .authed(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&vec![Value::Object(row)])
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_failure(table, status, &body))
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    tracing::warn!(target: "store", error = %e, timeout = e.is_timeout(), "store transport error");
    StoreError::Unavailable(e.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a non-2xx response onto the store error taxonomy.
fn classify_failure(table: &str, status: StatusCode, body: &str) -> StoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if status == StatusCode::CONFLICT || parsed.code.as_deref() == Some(PG_UNIQUE_VIOLATION) {
        return StoreError::Conflict {
            table: table.to_string(),
        };
    }
    let message = parsed.message.unwrap_or_else(|| body.chars().take(200).collect());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return StoreError::Unavailable(format!("{status}: {message}"));
    }
    StoreError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Render a `Select` as PostgREST query parameters.
fn query_params(q: &Select) -> Vec<(String, String)> {
    let mut out = vec![("select".to_string(), "*".to_string())];
    for f in &q.filters {
        let rendered = match f {
            Filter::Eq { value, .. } => format!("eq.{}", scalar(value)),
            Filter::IEq { value, .. } => format!("ilike.{}", escape_like(value)),
            Filter::IContains { needle, .. } => format!("ilike.*{}*", escape_like(needle)),
            Filter::In { values, .. } => {
                let items = values.iter().map(in_item).collect::<Vec<_>>().join(",");
                format!("in.({items})")
            }
        };
        out.push((f.column().to_string(), rendered));
    }
    if let Some(o) = &q.order {
        let mut s = o.column.clone();
        s.push_str(if o.descending { ".desc" } else { ".asc" });
        if o.nulls_last {
            s.push_str(".nullslast");
        }
        out.push(("order".to_string(), s));
    }
    if let Some(n) = q.limit {
        out.push(("limit".to_string(), n.to_string()));
    }
    out
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn in_item(v: &Value) -> String {
    let s = scalar(v);
    if s.contains([',', '(', ')', '"']) {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s
    }
}

/// User text must not introduce wildcards into an ILIKE pattern.
fn escape_like(s: &str) -> String {
    s.replace('*', "")
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
