//! Track consolidation library - shared modules for both binaries.

pub mod audit;
pub mod config;
pub mod csv_source;
pub mod error;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod safety;
pub mod store;
