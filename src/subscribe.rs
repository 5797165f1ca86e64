// src/subscribe.rs
//! Newsletter subscription writer.
//!
//! One insert per user action, keyed by e-mail. A unique-key conflict means
//! the address is already on the list, which the user sees as a success.

use std::time::Duration;

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{insert_bounded, Row, SharedStore, StoreError};

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub email: String,
    #[serde(default, alias = "sourcePage")]
    pub source_page: String,
}

impl SubscriptionRequest {
    pub fn new(email: &str, source_page: &str) -> Self {
        Self {
            email: email.to_string(),
            source_page: source_page.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
    Ok,
    AlreadySubscribed,
    Failure,
}

impl SubscribeOutcome {
    /// Text shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            SubscribeOutcome::Ok => "Thanks for subscribing!",
            SubscribeOutcome::AlreadySubscribed => "You're already subscribed.",
            SubscribeOutcome::Failure => "Something went wrong. Please try again.",
        }
    }

    /// `AlreadySubscribed` is presented in the success tone.
    pub fn is_success(self) -> bool {
        !matches!(self, SubscribeOutcome::Failure)
    }

    fn as_str(self) -> &'static str {
        match self {
            SubscribeOutcome::Ok => "ok",
            SubscribeOutcome::AlreadySubscribed => "already_subscribed",
            SubscribeOutcome::Failure => "failure",
        }
    }
}

pub struct SubscriptionWriter {
    store: SharedStore,
    table: String,
    timeout: Duration,
}

impl SubscriptionWriter {
    pub fn new(store: SharedStore, table: &str, timeout: Duration) -> Self {
        Self {
            store,
            table: table.to_string(),
            timeout,
        }
    }

    pub async fn subscribe(&self, req: &SubscriptionRequest) -> SubscribeOutcome {
        crate::metrics::ensure_metrics_described();
        let email = normalize_email(&req.email);
        let id = anon_hash(&email);

        let outcome = if !RE_EMAIL.is_match(&email) {
            tracing::info!(target: "subscribe", %id, "rejected malformed e-mail");
            SubscribeOutcome::Failure
        } else {
            let mut row = Row::new();
            row.insert("email".into(), Value::String(email));
            row.insert("source_page".into(), Value::String(req.source_page.trim().to_string()));

            match insert_bounded(self.store.as_ref(), &self.table, row, self.timeout).await {
                Ok(()) => SubscribeOutcome::Ok,
                Err(StoreError::Conflict { .. }) => SubscribeOutcome::AlreadySubscribed,
                Err(e) => {
                    tracing::warn!(target: "subscribe", %id, error = %e, "subscription insert failed");
                    SubscribeOutcome::Failure
                }
            }
        };

        counter!("subscriptions_total", "outcome" => outcome.as_str()).increment(1);
        tracing::info!(target: "subscribe", %id, source = %req.source_page, outcome = outcome.as_str(), "subscription");
        outcome
    }
}

fn normalize_email(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Short SHA-256 prefix so addresses never reach the logs.
fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        for ok in ["a@b.co", "first.last+tag@mail.example.org"] {
            assert!(RE_EMAIL.is_match(ok), "{ok}");
        }
        for bad in ["", "nobody", "a@b", "a b@c.de", "@x.io"] {
            assert!(!RE_EMAIL.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn already_subscribed_is_success_toned() {
        assert!(SubscribeOutcome::AlreadySubscribed.is_success());
        assert!(!SubscribeOutcome::Failure.is_success());
        assert_eq!(
            SubscribeOutcome::AlreadySubscribed.message(),
            "You're already subscribed."
        );
    }

    #[test]
    fn anon_hash_is_stable_and_short() {
        assert_eq!(anon_hash("a@b.co"), anon_hash("a@b.co"));
        assert_eq!(anon_hash("a@b.co").len(), 12);
        assert_ne!(anon_hash("a@b.co"), anon_hash("c@d.co"));
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Mixed@Case.COM "), "mixed@case.com");
    }
}
