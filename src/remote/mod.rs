//! Remote data access: Supabase REST (PostgREST) and Storage.
//!
//! [`RemoteStore`] is the seam the migration talks to; [`SupabaseClient`] is
//! the HTTP implementation.

mod client;
mod error;
mod query;

use async_trait::async_trait;

pub use client::{encode_object_key, SupabaseClient};
pub use error::{RemoteError, RemoteResult};
pub use query::{Filter, RowQuery};

/// Authenticated access to the relational API and object storage.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read rows matching `query`, one JSON object per row.
    async fn fetch_rows(&self, query: &RowQuery) -> RemoteResult<Vec<serde_json::Value>>;

    /// Set `fields` on every row matching `matching`. Returns the HTTP status.
    async fn update_row(
        &self,
        table: &str,
        fields: &serde_json::Value,
        matching: &[Filter],
    ) -> RemoteResult<u16>;

    /// Download an object's bytes from `bucket`.
    async fn download_object(&self, bucket: &str, key: &str) -> RemoteResult<Vec<u8>>;
}
