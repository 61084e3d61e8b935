//! services/api/src/lib.rs
//!
//! The HTTP service: upstream and database adapters, configuration, and the
//! Axum web layer. The binaries in `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
