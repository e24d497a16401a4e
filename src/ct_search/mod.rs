// src/ct_search/mod.rs
pub mod classify;
pub mod client;
pub mod dispatcher;
pub mod enumerator;

use async_trait::async_trait;

pub use classify::{Classification, classify};
pub use client::CrtShClient;
pub use dispatcher::Dispatcher;
pub use enumerator::Enumerator;

/// Something that can answer "which certificates cover `*.pattern`".
///
/// Returns the raw response body. An `Err` means no data could be obtained
/// for this pattern in this run; it is never fatal to the run.
#[async_trait]
pub trait CertSource: Send + Sync {
    async fn fetch(&self, pattern: &str) -> anyhow::Result<Vec<u8>>;
}
