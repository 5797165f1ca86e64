// src/config/mod.rs
pub mod store;
