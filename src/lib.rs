// src/lib.rs
// Library interface for ct-sweep
pub mod cli;
pub mod config;
pub mod ct_search;
pub mod domains;
pub mod output;
pub mod progress;
pub mod stats;
pub mod types;
