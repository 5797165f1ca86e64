// src/render.rs
//! Three-state render contract shared by every page.
//!
//! Each data source on a page owns a [`Slot`] with its own loading flag.
//! Slots of one page share a [`Mount`]; once the page is unmounted, results
//! that arrive late are dropped without touching state.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum RenderState<T> {
    Loading,
    Populated(T),
    Empty,
}

impl<T> RenderState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RenderState::Loading)
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            RenderState::Populated(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> RenderState<Vec<T>> {
    /// An empty collection renders as `Empty`.
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            RenderState::Empty
        } else {
            RenderState::Populated(items)
        }
    }

    /// Errors render as `Empty`; they are logged, never surfaced.
    pub fn from_result<E: Display>(source: &str, res: Result<Vec<T>, E>) -> Self {
        match res {
            Ok(items) => Self::from_items(items),
            Err(e) => {
                tracing::warn!(target: "render", source, error = %e, "degrading to empty state");
                RenderState::Empty
            }
        }
    }
}

/// Liveness shared by all slots of one page instance.
#[derive(Debug, Clone)]
pub struct Mount {
    alive: Arc<AtomicBool>,
}

impl Mount {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Default for Mount {
    fn default() -> Self {
        Self::new()
    }
}

/// One independently loading piece of page state. Starts as `Loading`.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    name: &'static str,
    state: Arc<Mutex<RenderState<T>>>,
    mount: Mount,
}

impl<T: Clone> Slot<T> {
    pub fn new(name: &'static str, mount: &Mount) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(RenderState::Loading)),
            mount: mount.clone(),
        }
    }

    /// Settle the slot. Returns `false` (and changes nothing) once unmounted.
    pub fn deliver(&self, next: RenderState<T>) -> bool {
        if !self.mount.is_mounted() {
            tracing::debug!(target: "render", slot = self.name, "late result after unmount dropped");
            return false;
        }
        let mut g = self.state.lock().expect("slot mutex poisoned");
        *g = next;
        true
    }

    pub fn snapshot(&self) -> RenderState<T> {
        self.state.lock().expect("slot mutex poisoned").clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("slot mutex poisoned").is_loading()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
